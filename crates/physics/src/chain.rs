//! The band's joint chain: one fixed anchor, three rope-linked dynamic anchors,
//! and an optional spherical attachment to the card body.

use std::fmt;

use nalgebra::Vector3;

use crate::body::{Collider, RigidBody};
use crate::joint::Joint;
use crate::world::{BodyHandle, JointHandle, PhysicsWorld};

/// Geometry and tuning of the chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// World position of the fixed anchor; dynamic anchors are placed relative to it.
    pub origin: Vector3<f64>,
    /// Offsets of j1, j2, j3 from the origin.
    pub offsets: [Vector3<f64>; 3],
    /// Rest length of each rope segment.
    pub rope_length: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub ball_radius: f64,
    /// Attachment point on the card, in the card's frame.
    pub card_anchor: Vector3<f64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            origin: Vector3::new(0.0, 4.0, 0.0),
            offsets: [
                Vector3::new(0.5, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.5, 0.0, 0.0),
            ],
            rope_length: 1.0,
            linear_damping: 2.0,
            angular_damping: 2.0,
            ball_radius: 0.1,
            // The card hangs 1.45 below its clip
            card_anchor: Vector3::new(0.0, 1.45, 0.0),
        }
    }
}

/// Identifies one of the chain's raw anchor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainAnchor {
    Fixed,
    J1,
    J2,
    J3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The card handle does not refer to a body in this world.
    UnknownBody,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::UnknownBody => write!(f, "card body is not part of the physics world"),
        }
    }
}

impl std::error::Error for ChainError {}

/// Handles to the chain's bodies and joints.
///
/// The chain is valid on its own (fixed + three ropes); the card attachment is
/// an optional edge added once the card body exists.
#[derive(Debug, Clone)]
pub struct JointChain {
    pub fixed: BodyHandle,
    pub j1: BodyHandle,
    pub j2: BodyHandle,
    pub j3: BodyHandle,
    pub ropes: [JointHandle; 3],
    card: Option<(BodyHandle, JointHandle)>,
    card_anchor: Vector3<f64>,
}

impl JointChain {
    /// Create the anchors and rope joints in `world`.
    pub fn build(world: &mut PhysicsWorld, config: &ChainConfig) -> Self {
        let fixed = world.insert_body(RigidBody::fixed().with_translation(config.origin));

        let segment = |offset: Vector3<f64>| {
            RigidBody::dynamic()
                .with_translation(config.origin + offset)
                .with_collider(Collider::ball(config.ball_radius))
                .with_damping(config.linear_damping, config.angular_damping)
                .with_can_sleep(true)
        };
        let j1 = world.insert_body(segment(config.offsets[0]));
        let j2 = world.insert_body(segment(config.offsets[1]));
        let j3 = world.insert_body(segment(config.offsets[2]));

        // Both ends were inserted above, so the joints go in unchecked
        let rope = |world: &mut PhysicsWorld, a: BodyHandle, b: BodyHandle| {
            world.push_joint(Joint::rope(a, b, Vector3::zeros(), Vector3::zeros(), config.rope_length))
        };
        let ropes = [
            rope(world, fixed, j1),
            rope(world, j1, j2),
            rope(world, j2, j3),
        ];

        log::debug!("joint chain built at {:?}", config.origin);

        Self {
            fixed,
            j1,
            j2,
            j3,
            ropes,
            card: None,
            card_anchor: config.card_anchor,
        }
    }

    /// Attach j3 to the card with a spherical joint. Idempotent: a second call
    /// returns the existing joint. Unknown handles leave the chain unattached.
    pub fn attach(
        &mut self,
        world: &mut PhysicsWorld,
        card: BodyHandle,
    ) -> Result<JointHandle, ChainError> {
        if let Some((_, joint)) = self.card {
            return Ok(joint);
        }
        let joint = world
            .insert_joint(Joint::spherical(self.j3, card, Vector3::zeros(), self.card_anchor))
            .ok_or(ChainError::UnknownBody)?;
        self.card = Some((card, joint));
        log::info!("card attached to band");
        Ok(joint)
    }

    pub fn is_attached(&self) -> bool {
        self.card.is_some()
    }

    pub fn card(&self) -> Option<BodyHandle> {
        self.card.map(|(body, _)| body)
    }

    pub fn handle(&self, anchor: ChainAnchor) -> BodyHandle {
        match anchor {
            ChainAnchor::Fixed => self.fixed,
            ChainAnchor::J1 => self.j1,
            ChainAnchor::J2 => self.j2,
            ChainAnchor::J3 => self.j3,
        }
    }

    /// Dynamic anchors in chain order.
    pub fn dynamic_bodies(&self) -> [BodyHandle; 3] {
        [self.j1, self.j2, self.j3]
    }

    /// Wake every dynamic body in the chain, and the card if attached.
    pub fn wake_up(&self, world: &mut PhysicsWorld) {
        let card = self.card();
        for handle in self.dynamic_bodies().into_iter().chain(card) {
            if let Some(body) = world.body_mut(handle) {
                body.wake_up();
            }
        }
    }

    pub fn view<'a>(&'a self, world: &'a PhysicsWorld) -> ChainView<'a> {
        ChainView { chain: self, world }
    }
}

/// Read-only access to the chain's current (visual) anchor positions.
#[derive(Clone, Copy)]
pub struct ChainView<'a> {
    chain: &'a JointChain,
    world: &'a PhysicsWorld,
}

impl ChainView<'_> {
    /// Interpolated world position of an anchor, `None` if its body is gone.
    pub fn translation(&self, anchor: ChainAnchor) -> Option<Vector3<f64>> {
        self.world.visual_translation(self.chain.handle(anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocard_core::{GRAVITY, PHYSICS_DT};

    fn card_body() -> RigidBody {
        RigidBody::dynamic()
            .with_translation(Vector3::new(2.0, 0.0, 0.0))
            .with_collider(Collider::cuboid(0.8, 1.125, 0.01))
            .with_damping(2.0, 2.0)
    }

    #[test]
    fn test_build_creates_four_bodies_three_ropes() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let chain = JointChain::build(&mut world, &ChainConfig::default());
        assert_eq!(world.body_count(), 4);
        assert_eq!(world.joint_count(), 3);
        assert!(!chain.is_attached());
        assert!(!world.body(chain.fixed).unwrap().is_dynamic());
        for h in chain.dynamic_bodies() {
            let b = world.body(h).unwrap();
            assert!(b.is_dynamic());
            assert!(b.can_sleep);
            assert_eq!(b.linear_damping, 2.0);
            assert_eq!(b.angular_damping, 2.0);
            assert_eq!(b.collider(), Some(&Collider::ball(0.1)));
        }
        let j3 = world.body(chain.j3).unwrap().translation();
        assert_eq!(j3, Vector3::new(1.5, 4.0, 0.0));

        let links = [(chain.fixed, chain.j1), (chain.j1, chain.j2), (chain.j2, chain.j3)];
        for (rope, (a, b)) in chain.ropes.into_iter().zip(links) {
            let joint = world.joint(rope).unwrap();
            assert_eq!((joint.body1, joint.body2), (a, b));
        }
    }

    #[test]
    fn test_build_into_populated_world() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let card = world.insert_body(card_body());
        let chain = JointChain::build(&mut world, &ChainConfig::default());
        assert_eq!(world.body_count(), 5);
        assert_eq!(world.joint_count(), 3);
        for rope in chain.ropes {
            let joint = world.joint(rope).unwrap();
            assert_ne!(joint.body1, card);
            assert_ne!(joint.body2, card);
        }
    }

    #[test]
    fn test_unattached_chain_steps_cleanly() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let chain = JointChain::build(&mut world, &ChainConfig::default());
        for _ in 0..120 {
            world.step();
        }
        for rope in chain.ropes {
            assert!(world.joint_violation(rope).unwrap() < 0.02);
        }
    }

    #[test]
    fn test_attach_is_two_phase_and_idempotent() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let mut chain = JointChain::build(&mut world, &ChainConfig::default());
        world.step();

        let card = world.insert_body(card_body());
        let first = chain.attach(&mut world, card).unwrap();
        let second = chain.attach(&mut world, card).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.joint_count(), 4);
        assert_eq!(chain.card(), Some(card));
        let joint = world.joint(first).unwrap();
        assert_eq!((joint.body1, joint.body2), (chain.j3, card));
        assert_eq!(joint.anchor2, Vector3::new(0.0, 1.45, 0.0));
    }

    #[test]
    fn test_attach_unknown_card_leaves_chain_intact() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let mut chain = JointChain::build(&mut world, &ChainConfig::default());
        let mut other = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        for _ in 0..10 {
            other.insert_body(RigidBody::dynamic());
        }
        let foreign = other.insert_body(card_body());
        assert_eq!(chain.attach(&mut world, foreign), Err(ChainError::UnknownBody));
        assert!(!chain.is_attached());
        assert_eq!(world.joint_count(), 3);
    }

    #[test]
    fn test_rope_length_holds_with_card() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let mut chain = JointChain::build(&mut world, &ChainConfig::default());
        let card = world.insert_body(card_body());
        let spherical = chain.attach(&mut world, card).unwrap();

        for _ in 0..600 {
            world.step();
            let a = world.body(chain.j1).unwrap().translation();
            let b = world.body(chain.j2).unwrap().translation();
            assert!((a - b).norm() <= 1.0 + 0.05, "stretched to {}", (a - b).norm());
        }
        assert!(world.joint_violation(spherical).unwrap() < 0.05);

        // Settled: the card hangs below the fixed anchor
        let card_pos = world.body(card).unwrap().translation();
        assert!(card_pos.y < 4.0 - 2.0);
    }

    #[test]
    fn test_view_reads_anchor_positions() {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let chain = JointChain::build(&mut world, &ChainConfig::default());
        let view = chain.view(&world);
        assert_eq!(view.translation(ChainAnchor::Fixed), Some(Vector3::new(0.0, 4.0, 0.0)));
        assert_eq!(view.translation(ChainAnchor::J2), Some(Vector3::new(1.0, 4.0, 0.0)));
    }
}
