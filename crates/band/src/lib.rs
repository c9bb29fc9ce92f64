//! Band curve: smooths the physics chain and resamples it into a polyline.
//!
//! Each frame the two interior anchors are eased toward their simulated
//! positions, then a Catmull-Rom curve through
//! `[j3, j2 (smoothed), j1 (smoothed), fixed]` is resampled for the ribbon.

pub mod curve;
pub mod lerp;
pub mod sampler;

pub use curve::{CatmullRomCurve, CurveType, CONTROL_POINTS};
pub use lerp::{adaptive_speed, blend_factor, LerpState};
pub use sampler::{AnchorSource, SmoothedCurveSampler, DEFAULT_SAMPLES};
