//! Per-frame conversion of raw chain positions into the band polyline.

use glam::Vec3;
use nalgebra::Vector3;

use holocard_core::vec3_to_glam;
use holocard_physics::{ChainAnchor, ChainView};

use crate::curve::{CatmullRomCurve, CurveType, CONTROL_POINTS};
use crate::lerp::LerpState;

/// Points in the resampled band polyline.
pub const DEFAULT_SAMPLES: usize = 32;

/// Anchors whose positions are smoothed before they reach the curve.
const SMOOTHED: [ChainAnchor; 2] = [ChainAnchor::J1, ChainAnchor::J2];

/// Where the sampler reads raw anchor positions from.
pub trait AnchorSource {
    /// Current position of `anchor`, or `None` while it is not available yet.
    fn translation(&self, anchor: ChainAnchor) -> Option<Vector3<f64>>;
}

impl AnchorSource for ChainView<'_> {
    fn translation(&self, anchor: ChainAnchor) -> Option<Vector3<f64>> {
        ChainView::translation(self, anchor)
    }
}

/// Smooths j1/j2, feeds the four control points into the curve, and resamples it.
#[derive(Debug, Clone)]
pub struct SmoothedCurveSampler {
    lerped: [Option<LerpState>; SMOOTHED.len()],
    curve: CatmullRomCurve,
    samples: usize,
    polyline: Vec<Vec3>,
}

impl SmoothedCurveSampler {
    pub fn new(curve_type: CurveType, samples: usize) -> Self {
        Self {
            lerped: [None; SMOOTHED.len()],
            curve: CatmullRomCurve::new(curve_type),
            samples,
            polyline: Vec::with_capacity(samples),
        }
    }

    /// Run one frame. Returns the fresh polyline, or `None` (and changes nothing)
    /// if any anchor cannot be read yet.
    pub fn sample<S: AnchorSource>(&mut self, source: &S, delta: f64) -> Option<&[Vec3]> {
        let fixed = source.translation(ChainAnchor::Fixed)?;
        let terminal = source.translation(ChainAnchor::J3)?;
        let mut targets = [Vector3::zeros(); SMOOTHED.len()];
        for (target, anchor) in targets.iter_mut().zip(SMOOTHED) {
            *target = source.translation(anchor)?;
        }

        for (slot, target) in self.lerped.iter_mut().zip(targets.iter()) {
            slot.get_or_insert_with(|| LerpState::new(*target))
                .advance(target, delta);
        }
        let [j1, j2] = self.lerped.map(|s| s.map(|s| s.position).unwrap_or_default());

        // Terminal end first, fixed end last
        self.curve.points = [terminal, j2, j1, fixed];
        self.curve
            .sample_into(&mut self.polyline, self.samples, |p| vec3_to_glam(&p));
        Some(&self.polyline)
    }

    /// Smoothed position of j1 or j2, once the first frame has initialized it.
    pub fn lerped(&self, anchor: ChainAnchor) -> Option<Vector3<f64>> {
        let i = SMOOTHED.iter().position(|a| *a == anchor)?;
        self.lerped[i].map(|s| s.position)
    }

    pub fn control_points(&self) -> &[Vector3<f64>; CONTROL_POINTS] {
        &self.curve.points
    }

    /// Last emitted polyline (empty before the first successful frame).
    pub fn polyline(&self) -> &[Vec3] {
        &self.polyline
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve.curve_type
    }
}

impl Default for SmoothedCurveSampler {
    fn default() -> Self {
        Self::new(CurveType::Centripetal, DEFAULT_SAMPLES)
    }
}
