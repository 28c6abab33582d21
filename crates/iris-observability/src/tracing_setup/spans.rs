//! Span definitions per pipeline stage: request, transfer, compilation, encode.
//!
//! Each span carries its identifying metadata via the `tracing` crate.

/// Create a span covering one embedding request.
#[macro_export]
macro_rules! embed_request_span {
    ($request_id:expr, $tier:expr, $images:expr) => {
        tracing::info_span!("iris.embed", request_id = %$request_id, tier = %$tier, images = $images)
    };
}

/// Create a transfer span.
#[macro_export]
macro_rules! transfer_span {
    ($device:expr, $tensors:expr, $bytes:expr) => {
        tracing::debug_span!("iris.transfer", device = %$device, tensors = $tensors, bytes = $bytes)
    };
}

/// Create a compilation span.
#[macro_export]
macro_rules! compile_span {
    ($encoder:expr, $mode:expr) => {
        tracing::info_span!("iris.compile", encoder = %$encoder, mode = ?$mode)
    };
}

/// Create an encoder invocation span.
#[macro_export]
macro_rules! encode_span {
    ($encoder:expr, $path:expr, $images:expr) => {
        tracing::debug_span!("iris.encode", encoder = %$encoder, path = ?$path, images = $images)
    };
}
