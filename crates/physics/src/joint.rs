//! Rope and spherical joints, solved as XPBD positional constraints.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::body::RigidBody;
use crate::world::BodyHandle;

/// Constraint kind between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Anchors may approach freely but never separate beyond `max_distance`.
    Rope { max_distance: f64 },
    /// Anchors coincide; relative rotation is free (ball-and-socket).
    Spherical,
}

/// A joint linking two bodies through body-frame anchor offsets.
#[derive(Debug, Clone)]
pub struct Joint {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    /// Anchor on body1, in body1's frame.
    pub anchor1: Vector3<f64>,
    /// Anchor on body2, in body2's frame.
    pub anchor2: Vector3<f64>,
    pub kind: JointKind,
}

impl Joint {
    pub fn rope(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Vector3<f64>,
        anchor2: Vector3<f64>,
        max_distance: f64,
    ) -> Self {
        Self {
            body1,
            body2,
            anchor1,
            anchor2,
            kind: JointKind::Rope { max_distance },
        }
    }

    pub fn spherical(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Vector3<f64>,
        anchor2: Vector3<f64>,
    ) -> Self {
        Self {
            body1,
            body2,
            anchor1,
            anchor2,
            kind: JointKind::Spherical,
        }
    }

    /// Constraint violation for the given body pair (0 when satisfied).
    pub fn violation(&self, b1: &RigidBody, b2: &RigidBody) -> f64 {
        let d = (b2.world_point(&self.anchor2) - b1.world_point(&self.anchor1)).norm();
        match self.kind {
            JointKind::Rope { max_distance } => (d - max_distance).max(0.0),
            JointKind::Spherical => d,
        }
    }

    /// Project the constraint once. Returns how far the anchors were moved in total.
    pub(crate) fn solve_position(&self, b1: &mut RigidBody, b2: &mut RigidBody) -> f64 {
        let r1 = b1.pose.rotation * self.anchor1;
        let r2 = b2.pose.rotation * self.anchor2;
        let delta = (b2.pose.translation.vector + r2) - (b1.pose.translation.vector + r1);
        let length = delta.norm();

        let c = match self.kind {
            JointKind::Rope { max_distance } => length - max_distance,
            JointKind::Spherical => length,
        };
        if c <= 1e-12 || length < 1e-12 {
            return 0.0;
        }
        let n = delta / length;

        let inv_i1 = b1.inv_inertia_world();
        let inv_i2 = b2.inv_inertia_world();
        let rn1 = r1.cross(&n);
        let rn2 = r2.cross(&n);
        let w1 = b1.inv_mass() + rn1.dot(&(inv_i1 * rn1));
        let w2 = b2.inv_mass() + rn2.dot(&(inv_i2 * rn2));
        let w = w1 + w2;
        if w <= 0.0 {
            return 0.0;
        }

        // Zero compliance: remove the whole violation in one projection
        let impulse = n * (c / w);

        // Anchor 1 moves toward anchor 2, anchor 2 toward anchor 1
        b1.pose.translation.vector += impulse * b1.inv_mass();
        b2.pose.translation.vector -= impulse * b2.inv_mass();
        apply_rotation(&mut b1.pose.rotation, inv_i1 * r1.cross(&impulse));
        apply_rotation(&mut b2.pose.rotation, -(inv_i2 * r2.cross(&impulse)));

        c
    }
}

/// First-order quaternion update: q += ½ [ω, 0] q, renormalized.
pub(crate) fn apply_rotation(q: &mut UnitQuaternion<f64>, omega: Vector3<f64>) {
    if omega.norm_squared() == 0.0 {
        return;
    }
    let current = *q.quaternion();
    let dq = Quaternion::from_parts(0.0, omega) * current;
    *q = UnitQuaternion::new_normalize(current + dq * 0.5);
}
