//! Default values for every configuration field.

use crate::constants;

pub const DEFAULT_ENABLE_IMAGE_CACHE: bool = true;

pub const DEFAULT_COMPILATION_ENABLED: bool = true;
pub const DEFAULT_MIN_RUNTIME_VERSION: &str = constants::DEFAULT_MIN_RUNTIME_VERSION;

pub const DEFAULT_NON_BLOCKING_TRANSFER: bool = true;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
