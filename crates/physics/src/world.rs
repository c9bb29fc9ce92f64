//! Fixed-timestep physics world with substepped XPBD and visual interpolation.

use nalgebra::{UnitQuaternion, Vector3};

use crate::body::{BodyType, RigidBody, SLEEP_SPEED};
use crate::joint::{apply_rotation, Joint};

/// Substeps per fixed step. Small substeps keep long joint chains stiff.
pub const DEFAULT_SUBSTEPS: u32 = 12;
/// Constraint projections per substep.
pub const DEFAULT_ITERATIONS: u32 = 4;
/// A sleeping body moved further than this by a joint wakes up.
const WAKE_DISPLACEMENT: f64 = 1e-4;

/// Index of a body in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) usize);

/// Index of a joint in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) usize);

/// Rigid bodies plus joints, stepped at a fixed rate.
pub struct PhysicsWorld {
    pub gravity: Vector3<f64>,
    /// Fixed step length (s).
    pub timestep: f64,
    pub substeps: u32,
    pub iterations: u32,
    /// Blend visual poses between the last two steps.
    pub interpolate: bool,
    bodies: Vec<RigidBody>,
    joints: Vec<Joint>,
    accumulator: f64,
    alpha: f64,
    steps: u64,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector3<f64>, timestep: f64) -> Self {
        Self {
            gravity,
            timestep,
            substeps: DEFAULT_SUBSTEPS,
            iterations: DEFAULT_ITERATIONS,
            interpolate: true,
            bodies: Vec::new(),
            joints: Vec::new(),
            accumulator: 0.0,
            alpha: 1.0,
            steps: 0,
        }
    }

    pub fn insert_body(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle(self.bodies.len() - 1)
    }

    /// Add a joint. Returns `None` if either body is not in this world or
    /// both ends are the same body.
    pub fn insert_joint(&mut self, joint: Joint) -> Option<JointHandle> {
        if !self.contains(joint.body1) || !self.contains(joint.body2) || joint.body1 == joint.body2 {
            return None;
        }
        Some(self.push_joint(joint))
    }

    /// Add a joint whose bodies are known to be in this world and distinct.
    pub(crate) fn push_joint(&mut self, joint: Joint) -> JointHandle {
        // A new constraint may have to pull on resting bodies
        for handle in [joint.body1, joint.body2] {
            if let Some(body) = self.body_mut(handle) {
                body.wake_up();
            }
        }
        self.joints.push(joint);
        JointHandle(self.joints.len() - 1)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        handle.0 < self.bodies.len()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Number of fixed steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Interpolation factor between the previous and current step, in [0, 1].
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Constraint violation of a joint (0 when satisfied).
    pub fn joint_violation(&self, handle: JointHandle) -> Option<f64> {
        let joint = self.joints.get(handle.0)?;
        Some(joint.violation(&self.bodies[joint.body1.0], &self.bodies[joint.body2.0]))
    }

    /// Translation for display: interpolated between steps when enabled.
    pub fn visual_translation(&self, handle: BodyHandle) -> Option<Vector3<f64>> {
        let body = self.body(handle)?;
        if self.interpolate {
            Some(body.interpolated_pose(self.alpha).translation.vector)
        } else {
            Some(body.translation())
        }
    }

    /// Rotation for display: interpolated between steps when enabled.
    pub fn visual_rotation(&self, handle: BodyHandle) -> Option<UnitQuaternion<f64>> {
        let body = self.body(handle)?;
        if self.interpolate {
            Some(body.interpolated_pose(self.alpha).rotation)
        } else {
            Some(body.rotation())
        }
    }

    /// Accumulate wall-clock frame time and run as many fixed steps as fit.
    /// Returns the number of steps taken.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        if !(frame_dt > 0.0) || self.timestep <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(holocard_core::MAX_FRAME_TIME);
        let mut taken = 0;
        while self.accumulator >= self.timestep {
            self.step();
            self.accumulator -= self.timestep;
            taken += 1;
        }
        self.alpha = self.accumulator / self.timestep;
        taken
    }

    /// Run exactly one fixed step.
    pub fn step(&mut self) {
        let dt = self.timestep;
        let substeps = self.substeps.max(1);
        let h = dt / substeps as f64;

        self.propagate_wake();

        for body in &mut self.bodies {
            body.previous_pose = body.pose;
        }

        let kinematic_starts: Vec<Vector3<f64>> =
            self.bodies.iter().map(|b| b.translation()).collect();

        for sub in 0..substeps {
            let frac = (sub + 1) as f64 / substeps as f64;

            // Predict
            let mut starts = Vec::with_capacity(self.bodies.len());
            for (i, body) in self.bodies.iter_mut().enumerate() {
                starts.push(body.pose);
                match body.body_type {
                    BodyType::Dynamic if !body.sleeping => {
                        body.linvel += self.gravity * h;
                        body.pose.translation.vector += body.linvel * h;
                        apply_rotation(&mut body.pose.rotation, body.angvel * h);
                    }
                    BodyType::KinematicPositionBased => {
                        if let Some(target) = body.kinematic_target {
                            let start = kinematic_starts[i];
                            body.pose.translation.vector = start.lerp(&target, frac);
                        }
                    }
                    _ => {}
                }
            }

            // Project joints
            for _ in 0..self.iterations.max(1) {
                for joint in &self.joints {
                    let (b1, b2) = pair_mut(&mut self.bodies, joint.body1.0, joint.body2.0);
                    joint.solve_position(b1, b2);
                }
            }

            // Derive velocities from the corrected poses
            for (body, start) in self.bodies.iter_mut().zip(starts.iter()) {
                match body.body_type {
                    BodyType::Dynamic => {
                        if body.sleeping {
                            let moved = (body.translation() - start.translation.vector).norm();
                            if moved <= WAKE_DISPLACEMENT {
                                // Still resting: undo solver jitter
                                body.pose = *start;
                                continue;
                            }
                            body.wake_up();
                        }
                        body.linvel = (body.translation() - start.translation.vector) / h;
                        let dq = body.pose.rotation * start.rotation.inverse();
                        let mut w = dq.imag() * (2.0 / h);
                        if dq.w < 0.0 {
                            w = -w;
                        }
                        body.angvel = w;
                        body.linvel *= 1.0 / (1.0 + h * body.linear_damping);
                        body.angvel *= 1.0 / (1.0 + h * body.angular_damping);
                    }
                    BodyType::KinematicPositionBased => {
                        body.linvel = (body.translation() - start.translation.vector) / h;
                    }
                    BodyType::Fixed => {}
                }
            }
        }

        for body in &mut self.bodies {
            if body.body_type == BodyType::KinematicPositionBased {
                body.kinematic_target = None;
            }
            if body.update_sleep(dt) {
                log::trace!("body fell asleep at step {}", self.steps);
            }
        }

        self.steps += 1;
    }

    /// Wake sleeping bodies jointed to something that is moving.
    fn propagate_wake(&mut self) {
        // Each pass wakes one more link down a chain
        for _ in 0..self.joints.len().max(1) {
            let mut changed = false;
            for joint in &self.joints {
                let (a, b) = (joint.body1.0, joint.body2.0);
                for (from, to) in [(a, b), (b, a)] {
                    if self.bodies[to].sleeping && is_moving(&self.bodies[from]) {
                        self.bodies[to].wake_up();
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

fn is_moving(body: &RigidBody) -> bool {
    match body.body_type {
        BodyType::Fixed => false,
        BodyType::KinematicPositionBased => {
            body.kinematic_target.is_some() || body.linvel.norm() > SLEEP_SPEED
        }
        BodyType::Dynamic => {
            !body.sleeping
                && (body.linvel.norm() > SLEEP_SPEED || body.angvel.norm() > SLEEP_SPEED)
        }
    }
}

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
