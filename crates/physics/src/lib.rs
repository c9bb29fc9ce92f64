//! Holocard physics: rigid bodies, rope/spherical joints, and the band's joint chain.
//!
//! The world is stepped at a fixed rate with substepped XPBD; readers take
//! interpolated poses so render and physics rates can differ.

pub mod body;
pub mod chain;
pub mod joint;
pub mod world;

pub use body::{BodyType, Collider, RigidBody};
pub use chain::{ChainAnchor, ChainConfig, ChainError, ChainView, JointChain};
pub use joint::{Joint, JointKind};
pub use world::{BodyHandle, JointHandle, PhysicsWorld};
