//! Pointer dragging of the card.
//!
//! While held, the card is kinematic and follows the pointer ray in the plane
//! of its own depth; on release it goes back to dynamic.

use nalgebra::Vector3;

use holocard_core::glam_to_vec3;
use holocard_physics::{BodyHandle, BodyType, PhysicsWorld};
use holocard_render::Ray;

#[derive(Debug, Default, Clone)]
pub struct DragState {
    /// Grab point relative to the card center, while dragging.
    offset: Option<Vector3<f64>>,
}

impl DragState {
    pub fn is_active(&self) -> bool {
        self.offset.is_some()
    }

    /// Start dragging if `ray` hits the card face (half extents `half`).
    pub fn begin(
        &mut self,
        world: &mut PhysicsWorld,
        card: BodyHandle,
        half: [f64; 2],
        ray: &Ray,
    ) -> bool {
        let Some(offset) = grab_offset(world, card, half, ray) else {
            return false;
        };
        let Some(body) = world.body_mut(card) else {
            return false;
        };
        body.set_body_type(BodyType::KinematicPositionBased);
        self.offset = Some(offset);
        log::debug!("card grabbed at offset {:?}", offset);
        true
    }

    /// Move the held card toward the point under `ray`.
    pub fn update(&self, world: &mut PhysicsWorld, card: BodyHandle, ray: &Ray) {
        let Some(offset) = self.offset else {
            return;
        };
        let Some(body) = world.body_mut(card) else {
            return;
        };
        let depth = body.translation().z;
        if let Some(hit) = ray.intersect_z_plane(depth as f32) {
            body.set_next_kinematic_translation(glam_to_vec3(hit) - offset);
        }
    }

    pub fn end(&mut self, world: &mut PhysicsWorld, card: BodyHandle) {
        if self.offset.take().is_none() {
            return;
        }
        if let Some(body) = world.body_mut(card) {
            body.set_body_type(BodyType::Dynamic);
        }
        log::debug!("card released");
    }
}

fn grab_offset(
    world: &PhysicsWorld,
    card: BodyHandle,
    half: [f64; 2],
    ray: &Ray,
) -> Option<Vector3<f64>> {
    let body = world.body(card)?;
    let center = body.translation();
    let hit = glam_to_vec3(ray.intersect_z_plane(center.z as f32)?);
    let offset = hit - center;
    // Test in the card's frame so a tilted card is hit where it is drawn
    let local = body.rotation().inverse() * offset;
    (local.x.abs() <= half[0] && local.y.abs() <= half[1]).then_some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use holocard_core::{GRAVITY, PHYSICS_DT};
    use holocard_physics::{Collider, RigidBody};

    const HALF: [f64; 2] = [0.8, 1.125];

    fn setup() -> (PhysicsWorld, BodyHandle) {
        let mut world = PhysicsWorld::new(GRAVITY, PHYSICS_DT);
        let card = world.insert_body(
            RigidBody::dynamic()
                .with_translation(Vector3::new(2.0, 0.0, 0.0))
                .with_collider(Collider::cuboid(0.8, 1.125, 0.01)),
        );
        (world, card)
    }

    fn ray_at(x: f32, y: f32) -> Ray {
        Ray {
            origin: Vec3::new(x, y, 13.0),
            direction: Vec3::NEG_Z,
        }
    }

    #[test]
    fn test_miss_does_not_grab() {
        let (mut world, card) = setup();
        let mut drag = DragState::default();
        assert!(!drag.begin(&mut world, card, HALF, &ray_at(-2.0, 0.0)));
        assert!(!drag.is_active());
        assert!(world.body(card).unwrap().is_dynamic());
    }

    #[test]
    fn test_drag_moves_card_with_offset() {
        let (mut world, card) = setup();
        let mut drag = DragState::default();
        assert!(drag.begin(&mut world, card, HALF, &ray_at(2.0, 0.5)));
        assert_eq!(
            world.body(card).unwrap().body_type(),
            BodyType::KinematicPositionBased
        );

        drag.update(&mut world, card, &ray_at(3.0, 0.5));
        world.step();
        let p = world.body(card).unwrap().translation();
        assert!((p - Vector3::new(3.0, 0.0, 0.0)).norm() < 1e-5, "{:?}", p);

        drag.end(&mut world, card);
        assert!(!drag.is_active());
        assert!(world.body(card).unwrap().is_dynamic());
    }

    #[test]
    fn test_update_without_grab_is_noop() {
        let (mut world, card) = setup();
        let drag = DragState::default();
        drag.update(&mut world, card, &ray_at(5.0, 5.0));
        assert!(world.body(card).unwrap().is_dynamic());
        let mut drag = drag;
        drag.end(&mut world, card);
        assert!(world.body(card).unwrap().is_dynamic());
    }
}
