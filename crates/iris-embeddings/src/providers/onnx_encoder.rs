//! ONNX Runtime vision encoder.
//!
//! Loads an exported vision tower via the `ort` crate (v2). Inputs are the
//! flattened patch tensor and the per-image patch grid; the single output is
//! `[total_tokens, hidden]`, split back into one embedding per image.

use std::path::{Path, PathBuf};

use iris_core::constants::{GRID_THW_INPUT, PIXEL_VALUES_INPUT, SPATIAL_MERGE_SIZE};
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{CompileMode, DeviceId, DeviceTensor, Embedding, ExecutionPath};
use iris_core::traits::IVisionEncoder;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

/// Vision encoder backed by an ONNX Runtime session.
///
/// The eager session runs with basic graph optimizations only. `optimize`
/// builds a second, fully optimized session; both stay loaded so the
/// compilation manager can fall back without reloading.
pub struct OnnxVisionEncoder {
    model_path: PathBuf,
    eager: Session,
    optimized: Option<Session>,
    model_name: String,
    device: DeviceId,
}

impl OnnxVisionEncoder {
    /// Load a vision encoder from the given path.
    ///
    /// # Errors
    /// `IrisError::InvalidConfiguration` if the model cannot be loaded.
    pub fn load(model_path: impl AsRef<Path>, device: DeviceId) -> IrisResult<Self> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(IrisError::invalid_config(format!(
                "vision encoder not found at {}",
                path.display()
            )));
        }

        let eager = Self::build_session(path, GraphOptimizationLevel::Level1)?;
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-vision")
            .to_string();

        debug!(model = %model_name, device = %device, "ONNX vision encoder loaded");

        Ok(Self {
            model_path: path.to_path_buf(),
            eager,
            optimized: None,
            model_name,
            device,
        })
    }

    fn build_session(path: &Path, level: GraphOptimizationLevel) -> IrisResult<Session> {
        Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(level)
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(2)
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))
    }

    fn input<'a>(inputs: &'a [DeviceTensor], name: &str) -> IrisResult<&'a DeviceTensor> {
        inputs
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| IrisError::encode(format!("missing encoder input `{name}`")))
    }

    fn run(&mut self, inputs: &[DeviceTensor], path: ExecutionPath) -> IrisResult<Vec<Embedding>> {
        let pixels = Self::input(inputs, PIXEL_VALUES_INPUT)?;
        let grid = Self::input(inputs, GRID_THW_INPUT)?;

        let pixel_data = pixels
            .data
            .as_f32()
            .ok_or_else(|| IrisError::encode("pixel_values must be f32"))?
            .to_vec();
        let grid_data = grid
            .data
            .as_i64()
            .ok_or_else(|| IrisError::encode("image_grid_thw must be i64"))?
            .to_vec();

        // Tokens per image after spatial merging, from each (t, h, w) row.
        let merge = i64::from(SPATIAL_MERGE_SIZE * SPATIAL_MERGE_SIZE);
        let tokens_per_image: Vec<usize> = grid_data
            .chunks_exact(3)
            .map(|thw| (thw[0] * thw[1] * thw[2] / merge) as usize)
            .collect();

        let pixel_shape: Vec<i64> = pixels.shape.iter().map(|&d| d as i64).collect();
        let grid_shape: Vec<i64> = grid.shape.iter().map(|&d| d as i64).collect();
        let pixel_tensor = Tensor::from_array((pixel_shape, pixel_data))
            .map_err(|e| IrisError::encode(format!("tensor creation error: {e}")))?;
        let grid_tensor = Tensor::from_array((grid_shape, grid_data))
            .map_err(|e| IrisError::encode(format!("tensor creation error: {e}")))?;

        let session = match path {
            ExecutionPath::Eager => &mut self.eager,
            ExecutionPath::Optimized => self
                .optimized
                .as_mut()
                .ok_or_else(|| IrisError::encode("optimized session requested before optimize"))?,
        };

        let outputs = session
            .run(ort::inputs![pixel_tensor, grid_tensor])
            .map_err(|e| IrisError::encode(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| IrisError::encode("no output tensor"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| IrisError::encode(format!("tensor extraction failed: {e}")))?;

        if shape.len() != 2 {
            return Err(IrisError::encode(format!("unexpected output shape: {shape:?}")));
        }
        let total_tokens = shape[0] as usize;
        let hidden = shape[1] as usize;
        if total_tokens != tokens_per_image.iter().sum::<usize>() {
            return Err(IrisError::encode(format!(
                "encoder produced {total_tokens} tokens for grids expecting {}",
                tokens_per_image.iter().sum::<usize>()
            )));
        }

        let mut offset = 0;
        let embeddings = tokens_per_image
            .into_iter()
            .map(|tokens| {
                let start = offset * hidden;
                offset += tokens;
                Embedding::new(
                    vec![tokens, hidden],
                    data[start..offset * hidden].to_vec(),
                    self.device.clone(),
                )
            })
            .collect();
        Ok(embeddings)
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> IrisError {
    IrisError::invalid_config(format!("failed to load {}: {e}", path.display()))
}

impl IVisionEncoder for OnnxVisionEncoder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn optimize(&mut self, mode: CompileMode) -> IrisResult<()> {
        let level = match mode {
            CompileMode::Default => GraphOptimizationLevel::Level2,
            CompileMode::ReduceOverhead | CompileMode::MaxAutotune => GraphOptimizationLevel::Level3,
        };
        let session = Self::build_session(&self.model_path, level)?;
        self.optimized = Some(session);
        info!(model = %self.model_name, ?mode, "ONNX vision encoder optimized");
        Ok(())
    }

    fn encode(&mut self, inputs: &[DeviceTensor], path: ExecutionPath) -> IrisResult<Vec<Embedding>> {
        self.run(inputs, path)
    }
}
