//! Rigid bodies and their collider-derived mass properties.

use nalgebra::{Isometry3, Matrix3, UnitQuaternion, Vector3};

/// Linear and angular speed below which a body counts as resting.
pub const SLEEP_SPEED: f64 = 0.01;
/// Simulated time a body must rest before it falls asleep (s).
pub const SLEEP_TIME: f64 = 2.0;

/// Collider density used for mass properties.
const DENSITY: f64 = 1.0;

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves; infinite mass.
    Fixed,
    /// Integrated under gravity and joint forces.
    Dynamic,
    /// Moved by the user toward a target pose; pushes dynamic bodies, is not pushed back.
    KinematicPositionBased,
}

/// Collision shape. Contributes mass and inertia only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Ball { radius: f64 },
    Cuboid { half_extents: Vector3<f64> },
}

impl Collider {
    pub fn ball(radius: f64) -> Self {
        Collider::Ball { radius }
    }

    pub fn cuboid(hx: f64, hy: f64, hz: f64) -> Self {
        Collider::Cuboid {
            half_extents: Vector3::new(hx, hy, hz),
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            Collider::Ball { radius } => 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3),
            Collider::Cuboid { half_extents } => {
                8.0 * half_extents.x * half_extents.y * half_extents.z
            }
        }
    }

    /// Mass and principal moments of inertia (body frame) at the given density.
    pub fn mass_properties(&self, density: f64) -> (f64, Vector3<f64>) {
        let mass = self.volume() * density;
        let inertia = match self {
            // Solid sphere: I = 2/5 m r²
            Collider::Ball { radius } => Vector3::repeat(0.4 * mass * radius * radius),
            // Solid box with half extents (a, b, c): I_x = m/3 (b² + c²)
            Collider::Cuboid { half_extents: h } => Vector3::new(
                mass / 3.0 * (h.y * h.y + h.z * h.z),
                mass / 3.0 * (h.x * h.x + h.z * h.z),
                mass / 3.0 * (h.x * h.x + h.y * h.y),
            ),
        };
        (mass, inertia)
    }
}

/// A rigid body in the physics world.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) body_type: BodyType,
    /// Current pose.
    pub(crate) pose: Isometry3<f64>,
    /// Pose at the start of the last full step, used for visual interpolation.
    pub(crate) previous_pose: Isometry3<f64>,
    pub(crate) linvel: Vector3<f64>,
    pub(crate) angvel: Vector3<f64>,
    pub(crate) collider: Option<Collider>,
    pub(crate) mass: f64,
    /// Principal moments of inertia in the body frame.
    pub(crate) inertia: Vector3<f64>,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub can_sleep: bool,
    pub(crate) sleeping: bool,
    pub(crate) rest_time: f64,
    pub(crate) kinematic_target: Option<Vector3<f64>>,
}

impl RigidBody {
    fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            pose: Isometry3::identity(),
            previous_pose: Isometry3::identity(),
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
            collider: None,
            // Bodies without a collider still need finite mass to be integrable
            mass: 1.0,
            inertia: Vector3::repeat(1.0),
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: true,
            sleeping: false,
            rest_time: 0.0,
            kinematic_target: None,
        }
    }

    pub fn fixed() -> Self {
        Self::new(BodyType::Fixed)
    }

    pub fn dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    pub fn kinematic_position_based() -> Self {
        Self::new(BodyType::KinematicPositionBased)
    }

    /// Set the initial translation (builder pattern).
    pub fn with_translation(mut self, t: Vector3<f64>) -> Self {
        self.pose.translation.vector = t;
        self.previous_pose = self.pose;
        self
    }

    /// Attach a collider and derive mass properties from it (builder pattern).
    pub fn with_collider(mut self, collider: Collider) -> Self {
        let (mass, inertia) = collider.mass_properties(DENSITY);
        self.collider = Some(collider);
        self.mass = mass;
        self.inertia = inertia;
        self
    }

    /// Set linear and angular damping (builder pattern).
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Allow or forbid sleeping (builder pattern).
    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn pose(&self) -> &Isometry3<f64> {
        &self.pose
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.pose.translation.vector
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation
    }

    pub fn linvel(&self) -> Vector3<f64> {
        self.linvel
    }

    pub fn angvel(&self) -> Vector3<f64> {
        self.angvel
    }

    pub fn set_angvel(&mut self, w: Vector3<f64>) {
        self.angvel = w;
        self.wake_up();
    }

    /// Target translation a kinematic body reaches at the end of the next step.
    /// Ignored for other body types.
    pub fn set_next_kinematic_translation(&mut self, t: Vector3<f64>) {
        if self.body_type == BodyType::KinematicPositionBased {
            self.kinematic_target = Some(t);
        }
    }

    /// Switch between fixed, dynamic and kinematic. Velocities are kept so a
    /// released kinematic body carries its drag momentum.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        if self.body_type == body_type {
            return;
        }
        self.body_type = body_type;
        self.kinematic_target = None;
        if body_type == BodyType::Fixed {
            self.linvel = Vector3::zeros();
            self.angvel = Vector3::zeros();
        }
        self.wake_up();
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn wake_up(&mut self) {
        self.sleeping = false;
        self.rest_time = 0.0;
    }

    pub(crate) fn sleep(&mut self) {
        self.sleeping = true;
        self.linvel = Vector3::zeros();
        self.angvel = Vector3::zeros();
    }

    /// Whether the solver may move this body this substep.
    pub(crate) fn is_simulated(&self) -> bool {
        self.body_type == BodyType::Dynamic && !self.sleeping
    }

    /// Inverse mass seen by the constraint solver (zero for fixed/kinematic).
    pub(crate) fn inv_mass(&self) -> f64 {
        if self.body_type == BodyType::Dynamic {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// World-space inverse inertia tensor (zero for fixed/kinematic).
    pub(crate) fn inv_inertia_world(&self) -> Matrix3<f64> {
        if self.body_type != BodyType::Dynamic {
            return Matrix3::zeros();
        }
        let local = Matrix3::from_diagonal(&self.inertia.map(|i| if i > 0.0 { 1.0 / i } else { 0.0 }));
        let r = self.pose.rotation.to_rotation_matrix();
        r.matrix() * local * r.matrix().transpose()
    }

    /// Local point → world point.
    pub fn world_point(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.pose.translation.vector + self.pose.rotation * local
    }

    /// Pose blended between the previous and current step.
    pub fn interpolated_pose(&self, alpha: f64) -> Isometry3<f64> {
        let alpha = alpha.clamp(0.0, 1.0);
        let t = self
            .previous_pose
            .translation
            .vector
            .lerp(&self.pose.translation.vector, alpha);
        let r = self
            .previous_pose
            .rotation
            .try_slerp(&self.pose.rotation, alpha, 1e-9)
            .unwrap_or(self.pose.rotation);
        Isometry3::from_parts(t.into(), r)
    }

    /// Advance the resting timer; returns true if the body just fell asleep.
    pub(crate) fn update_sleep(&mut self, dt: f64) -> bool {
        if !self.can_sleep || !self.is_simulated() {
            return false;
        }
        if self.linvel.norm() < SLEEP_SPEED && self.angvel.norm() < SLEEP_SPEED {
            self.rest_time += dt;
            if self.rest_time >= SLEEP_TIME {
                self.sleep();
                return true;
            }
        } else {
            self.rest_time = 0.0;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_mass_properties() {
        let (m, i) = Collider::ball(0.1).mass_properties(1.0);
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 0.001;
        assert!((m - expected).abs() < 1e-12);
        assert!((i.x - 0.4 * m * 0.01).abs() < 1e-12);
        assert_eq!(i.x, i.y);
        assert_eq!(i.y, i.z);
    }

    #[test]
    fn test_cuboid_inertia_axes() {
        let (m, i) = Collider::cuboid(0.8, 1.125, 0.01).mass_properties(1.0);
        assert!((m - 8.0 * 0.8 * 1.125 * 0.01).abs() < 1e-12);
        // Thin card: spinning about its normal (z) is the hardest
        assert!(i.z > i.x && i.z > i.y);
    }

    #[test]
    fn test_static_bodies_have_no_inverse_mass() {
        let fixed = RigidBody::fixed().with_collider(Collider::ball(0.1));
        assert_eq!(fixed.inv_mass(), 0.0);
        assert_eq!(fixed.inv_inertia_world(), Matrix3::zeros());
        let kin = RigidBody::kinematic_position_based();
        assert_eq!(kin.inv_mass(), 0.0);
    }

    #[test]
    fn test_kinematic_target_ignored_for_dynamic() {
        let mut b = RigidBody::dynamic();
        b.set_next_kinematic_translation(Vector3::new(1.0, 0.0, 0.0));
        assert!(b.kinematic_target.is_none());
        b.set_body_type(BodyType::KinematicPositionBased);
        b.set_next_kinematic_translation(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(b.kinematic_target, Some(Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_falls_asleep_after_rest() {
        let mut b = RigidBody::dynamic().with_can_sleep(true);
        let mut slept = false;
        for _ in 0..(SLEEP_TIME / 0.1) as usize + 1 {
            slept |= b.update_sleep(0.1);
        }
        assert!(slept);
        assert!(b.is_sleeping());
        b.set_angvel(Vector3::new(0.0, 1.0, 0.0));
        assert!(!b.is_sleeping());
    }

    #[test]
    fn test_interpolated_pose_midpoint() {
        let mut b = RigidBody::dynamic();
        b.previous_pose = Isometry3::translation(0.0, 0.0, 0.0);
        b.pose = Isometry3::translation(2.0, 0.0, 0.0);
        let mid = b.interpolated_pose(0.5);
        assert!((mid.translation.vector.x - 1.0).abs() < 1e-12);
    }
}
