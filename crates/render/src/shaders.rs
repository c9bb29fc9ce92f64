//! WGSL sources for the render pipelines.

/// Screen-space band ribbon.
pub const BAND_WGSL: &str = include_str!("shaders/band.wgsl");
/// Holographic card compositing.
pub const HOLO_WGSL: &str = include_str!("shaders/holo.wgsl");
