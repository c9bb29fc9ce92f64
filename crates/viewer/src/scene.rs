//! The lanyard scene: physics world, band chain, card body and band sampling.

use glam::{Mat4, Vec3};
use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use holocard_band::SmoothedCurveSampler;
use holocard_core::isometry_to_glam;
use holocard_physics::{
    BodyHandle, ChainConfig, ChainError, Collider, JointChain, PhysicsWorld, RigidBody,
};
use holocard_render::Ray;

use crate::config::ViewerConfig;
use crate::drag::DragState;

/// Half extents of the card's collider.
pub const CARD_HALF_EXTENTS: [f64; 3] = [0.8, 1.125, 0.01];
/// Where the card starts before the band pulls it in.
pub const CARD_START: [f64; 3] = [2.0, 0.0, 0.0];
const CARD_DAMPING: f64 = 2.0;

/// Angular velocity after pulling the card back toward facing the camera.
/// Only the Y component changes, by `settle · q.y`.
pub fn settled_angvel(angvel: Vector3<f64>, rotation: &UnitQuaternion<f64>, settle: f64) -> Vector3<f64> {
    Vector3::new(angvel.x, angvel.y - rotation.quaternion().j * settle, angvel.z)
}

pub struct Scene {
    pub world: PhysicsWorld,
    pub chain: JointChain,
    card: Option<BodyHandle>,
    sampler: SmoothedCurveSampler,
    drag: DragState,
    spin_settle: f64,
    polyline: Vec<Vec3>,
}

impl Scene {
    /// World and chain only; the card comes later via [`Scene::attach_card`].
    pub fn new(config: &ViewerConfig) -> Self {
        let mut world = PhysicsWorld::new(Vector3::new(0.0, config.gravity_y, 0.0), config.timestep);
        world.substeps = config.substeps;
        world.interpolate = config.interpolate;
        let chain = JointChain::build(&mut world, &ChainConfig::default());

        Self {
            world,
            chain,
            card: None,
            sampler: SmoothedCurveSampler::new(config.curve_type, config.samples),
            drag: DragState::default(),
            spin_settle: config.spin_settle,
            polyline: Vec::with_capacity(config.samples),
        }
    }

    /// Create the card body and hang it from the band. Idempotent.
    pub fn attach_card(&mut self) -> Result<BodyHandle, ChainError> {
        if let Some(card) = self.card {
            return Ok(card);
        }
        let [hx, hy, hz] = CARD_HALF_EXTENTS;
        let card = self.world.insert_body(
            RigidBody::dynamic()
                .with_translation(Vector3::from(CARD_START))
                .with_collider(Collider::cuboid(hx, hy, hz))
                .with_damping(CARD_DAMPING, CARD_DAMPING),
        );
        self.chain.attach(&mut self.world, card)?;
        self.card = Some(card);
        Ok(card)
    }

    pub fn card(&self) -> Option<BodyHandle> {
        self.card
    }

    /// Advance by one render frame. Returns the number of physics steps taken.
    pub fn frame(&mut self, delta: f64) -> u32 {
        if self.drag.is_active() {
            self.chain.wake_up(&mut self.world);
        }
        let steps = self.world.advance(delta);
        self.settle_spin();

        let view = self.chain.view(&self.world);
        if let Some(points) = self.sampler.sample(&view, delta) {
            self.polyline.clear();
            self.polyline.extend_from_slice(points);
        }
        steps
    }

    fn settle_spin(&mut self) {
        if self.spin_settle == 0.0 || self.drag.is_active() {
            return;
        }
        let Some(body) = self.card.and_then(|c| self.world.body_mut(c)) else {
            return;
        };
        if !body.is_dynamic() || body.is_sleeping() {
            return;
        }
        let w = settled_angvel(body.angvel(), &body.rotation(), self.spin_settle);
        body.set_angvel(w);
    }

    /// Band polyline from the latest frame (empty until the first sample).
    pub fn polyline(&self) -> &[Vec3] {
        &self.polyline
    }

    pub fn card_pose(&self) -> Option<Isometry3<f64>> {
        let card = self.card?;
        let t = self.world.visual_translation(card)?;
        let r = self.world.visual_rotation(card)?;
        Some(Isometry3::from_parts(t.into(), r))
    }

    pub fn card_model_matrix(&self) -> Option<Mat4> {
        self.card_pose().map(|pose| isometry_to_glam(&pose))
    }

    /// Grab the card if `ray` hits it.
    pub fn begin_drag(&mut self, ray: &Ray) -> bool {
        let Some(card) = self.card else {
            return false;
        };
        let half = [CARD_HALF_EXTENTS[0], CARD_HALF_EXTENTS[1]];
        let grabbed = self.drag.begin(&mut self.world, card, half, ray);
        if grabbed {
            self.chain.wake_up(&mut self.world);
        }
        grabbed
    }

    pub fn drag_to(&mut self, ray: &Ray) {
        if let Some(card) = self.card {
            self.drag.update(&mut self.world, card, ray);
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(card) = self.card {
            self.drag.end(&mut self.world, card);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocard_band::DEFAULT_SAMPLES;

    fn scene() -> Scene {
        Scene::new(&ViewerConfig::default())
    }

    #[test]
    fn test_two_phase_construction() {
        let mut s = scene();
        assert_eq!(s.world.body_count(), 4);
        assert!(s.card().is_none());
        assert!(s.card_pose().is_none());

        // The chain runs on its own before the card exists
        s.frame(1.0 / 60.0);
        assert_eq!(s.polyline().len(), DEFAULT_SAMPLES);

        let card = s.attach_card().unwrap();
        assert_eq!(s.attach_card().unwrap(), card);
        assert_eq!(s.world.body_count(), 5);
        assert_eq!(s.world.joint_count(), 4);
        assert!(s.chain.is_attached());
    }

    #[test]
    fn test_frames_produce_band() {
        let mut s = scene();
        s.attach_card().unwrap();
        let mut steps = 0;
        for _ in 0..120 {
            steps += s.frame(1.0 / 60.0);
            assert_eq!(s.polyline().len(), DEFAULT_SAMPLES);
            assert!(s.polyline().iter().all(|p| p.is_finite()));
        }
        assert_eq!(steps, 120);

        // Band runs from the card end (j3) to the fixed anchor
        let fixed = s.polyline()[DEFAULT_SAMPLES - 1];
        assert!((fixed - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-4);
        let pose = s.card_pose().unwrap();
        assert!(pose.translation.vector.y < 4.0);
    }

    #[test]
    fn test_zero_delta_takes_no_steps() {
        let mut s = scene();
        assert_eq!(s.frame(0.0), 0);
    }

    #[test]
    fn test_settled_angvel() {
        let turned = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.6);
        let w = settled_angvel(Vector3::new(0.1, 0.0, -0.2), &turned, 0.25);
        assert_eq!(w.x, 0.1);
        assert_eq!(w.z, -0.2);
        assert!((w.y + 0.25 * (0.3f64).sin()).abs() < 1e-12);

        let facing = UnitQuaternion::identity();
        let w = settled_angvel(Vector3::new(0.0, 1.0, 0.0), &facing, 0.25);
        assert_eq!(w.y, 1.0);
    }

    #[test]
    fn test_drag_holds_card_and_releases() {
        let mut s = scene();
        s.attach_card().unwrap();
        let at = |x: f32, y: f32| Ray {
            origin: Vec3::new(x, y, 13.0),
            direction: Vec3::NEG_Z,
        };

        assert!(s.begin_drag(&at(2.0, 0.0)));
        assert!(s.is_dragging());
        for _ in 0..30 {
            s.drag_to(&at(1.0, 1.0));
            s.frame(1.0 / 60.0);
        }
        let pose = s.card_pose().unwrap();
        assert!((pose.translation.vector - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-3);

        s.end_drag();
        assert!(!s.is_dragging());
        assert!(s.world.body(s.card().unwrap()).unwrap().is_dynamic());
    }

    #[test]
    fn test_drag_without_card_is_noop() {
        let mut s = scene();
        let ray = Ray {
            origin: Vec3::new(2.0, 0.0, 13.0),
            direction: Vec3::NEG_Z,
        };
        assert!(!s.begin_drag(&ray));
        s.drag_to(&ray);
        s.end_drag();
        assert!(!s.is_dragging());
    }
}
