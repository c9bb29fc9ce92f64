//! Holocard rendering: wgpu context, scene camera, the screen-space band
//! ribbon and the holographic card material.

pub mod camera;
pub mod context;
pub mod holo;
pub mod mesh;
pub mod pipelines;
pub mod ribbon;
pub mod shaders;
pub mod texture;

pub use camera::{Ray, SceneCamera};
pub use context::{RenderContext, DEPTH_FORMAT};
pub use holo::{glow_color, glow_hex, pointer_from_center, GlowType, HoloClock, HoloUniforms};
pub use pipelines::band::{BandPipeline, BandUniform};
pub use pipelines::holo::HoloPipeline;
pub use ribbon::RibbonGeometry;
pub use texture::{load_optional, ImageData, TextureInputs, TextureSet};
