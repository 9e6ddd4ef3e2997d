//! Physics engine port
//!
//! The game core does not simulate physics itself. It registers bodies
//! with a category tag and a contact mask, reads and writes velocities,
//! applies impulses, and consumes the contact events the engine reports.
//!
//! `HeadlessPhysics` is a small deterministic implementation (one moving
//! circle against static/kinematic boxes and an edge loop) used by the
//! tests and the demo driver.

use std::collections::BTreeSet;

use glam::Vec2;

use crate::sim::state::{CategoryMask, CategoryTag};

/// Opaque handle to a registered body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
    /// Hollow rectangle; bodies are kept inside it
    EdgeLoop { half_extents: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    /// Integrated by the engine
    Dynamic { mass: f32 },
    /// Moved only by `set_position`
    Kinematic,
    Static,
    /// Reports contacts but never pushes back
    Sensor,
}

/// Body registration request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub tag: CategoryTag,
    pub shape: Shape,
    pub kind: BodyKind,
    pub position: Vec2,
    /// Categories whose contact with this body produces an event
    pub contact_mask: CategoryMask,
}

impl BodyDesc {
    pub fn new(tag: CategoryTag, shape: Shape, kind: BodyKind, position: Vec2) -> Self {
        Self {
            tag,
            shape,
            kind,
            position,
            contact_mask: CategoryMask::empty(),
        }
    }

    pub fn with_contacts(mut self, mask: CategoryMask) -> Self {
        self.contact_mask = mask;
        self
    }
}

/// One side of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactBody {
    pub body: BodyHandle,
    pub tag: CategoryTag,
}

/// Two bodies began touching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: ContactBody,
    pub b: ContactBody,
}

/// What the game core needs from a physics engine
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Disabled bodies neither collide nor report contacts
    fn set_enabled(&mut self, body: BodyHandle, enabled: bool);
    fn is_enabled(&self, body: BodyHandle) -> bool;
    fn position(&self, body: BodyHandle) -> Vec2;
    fn set_position(&mut self, body: BodyHandle, position: Vec2);
    fn velocity(&self, body: BodyHandle) -> Vec2;
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);
    /// One-shot impulse; takes effect on the velocity immediately
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2);
    /// Advance the simulation and return the contacts that began, in order
    fn step(&mut self, dt: f32) -> Vec<Contact>;
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Surface normal pointing toward the circle centre
    pub normal: Vec2,
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Reflect velocity off a surface with the given normal
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Circle against a solid axis-aligned box
pub fn circle_rect_collision(
    center: Vec2,
    radius: f32,
    rect_center: Vec2,
    half_extents: Vec2,
) -> CollisionResult {
    let local = center - rect_center;
    let closest = local.clamp(-half_extents, half_extents);
    let offset = local - closest;
    let dist = offset.length();

    if dist >= radius {
        return CollisionResult::miss();
    }

    if dist > f32::EPSILON {
        return CollisionResult {
            hit: true,
            normal: offset / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the box: leave through the nearest face
    let to_x = half_extents.x - local.x.abs();
    let to_y = half_extents.y - local.y.abs();
    if to_x < to_y {
        CollisionResult {
            hit: true,
            normal: Vec2::new(local.x.signum(), 0.0),
            penetration: to_x + radius,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, local.y.signum()),
            penetration: to_y + radius,
        }
    }
}

/// Circle kept inside a hollow box
pub fn circle_bounds_collision(
    center: Vec2,
    radius: f32,
    bounds_center: Vec2,
    half_extents: Vec2,
) -> CollisionResult {
    let local = center - bounds_center;
    let mut normal = Vec2::ZERO;
    let mut penetration: f32 = 0.0;

    let over_left = -half_extents.x - (local.x - radius);
    let over_right = (local.x + radius) - half_extents.x;
    let over_bottom = -half_extents.y - (local.y - radius);
    let over_top = (local.y + radius) - half_extents.y;

    if over_left > 0.0 {
        normal.x = 1.0;
        penetration = penetration.max(over_left);
    } else if over_right > 0.0 {
        normal.x = -1.0;
        penetration = penetration.max(over_right);
    }
    if over_bottom > 0.0 {
        normal.y = 1.0;
        penetration = penetration.max(over_bottom);
    } else if over_top > 0.0 {
        normal.y = -1.0;
        penetration = penetration.max(over_top);
    }

    if normal == Vec2::ZERO {
        CollisionResult::miss()
    } else {
        CollisionResult {
            hit: true,
            normal: normal.normalize(),
            penetration,
        }
    }
}

#[derive(Debug, Clone)]
struct BodyState {
    desc: BodyDesc,
    position: Vec2,
    velocity: Vec2,
    enabled: bool,
}

/// Minimal deterministic physics: gravity-free, frictionless, perfectly
/// elastic, one collision pass per step.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPhysics {
    bodies: Vec<BodyState>,
    /// Pairs touching at the end of the last step (lower handle first)
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
}

impl HeadlessPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn tag(&self, body: BodyHandle) -> Option<CategoryTag> {
        self.body(body).map(|b| b.desc.tag)
    }

    fn body(&self, body: BodyHandle) -> Option<&BodyState> {
        self.bodies.get(body.0 as usize)
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut BodyState> {
        self.bodies.get_mut(body.0 as usize)
    }

    fn wants_contact(a: &BodyDesc, b: &BodyDesc) -> bool {
        a.contact_mask.has(b.tag) || b.contact_mask.has(a.tag)
    }
}

impl PhysicsWorld for HeadlessPhysics {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(BodyState {
            desc,
            position: desc.position,
            velocity: Vec2::ZERO,
            enabled: true,
        });
        handle
    }

    fn set_enabled(&mut self, body: BodyHandle, enabled: bool) {
        if let Some(state) = self.body_mut(body) {
            state.enabled = enabled;
        }
        if !enabled {
            self.touching.retain(|&(a, b)| a != body && b != body);
        }
    }

    fn is_enabled(&self, body: BodyHandle) -> bool {
        self.body(body).is_some_and(|b| b.enabled)
    }

    fn position(&self, body: BodyHandle) -> Vec2 {
        self.body(body).map(|b| b.position).unwrap_or(Vec2::ZERO)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(state) = self.body_mut(body) {
            state.position = position;
        }
    }

    fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.body(body).map(|b| b.velocity).unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(state) = self.body_mut(body) {
            state.velocity = velocity;
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(state) = self.body_mut(body) {
            if let BodyKind::Dynamic { mass } = state.desc.kind {
                state.velocity += impulse / mass;
            }
        }
    }

    fn step(&mut self, dt: f32) -> Vec<Contact> {
        for body in &mut self.bodies {
            if body.enabled && matches!(body.desc.kind, BodyKind::Dynamic { .. }) {
                body.position += body.velocity * dt;
            }
        }

        let mut contacts = Vec::new();
        let mut touching = BTreeSet::new();

        for i in 0..self.bodies.len() {
            let mover = &self.bodies[i];
            if !mover.enabled || !matches!(mover.desc.kind, BodyKind::Dynamic { .. }) {
                continue;
            }
            let Shape::Circle { radius } = mover.desc.shape else {
                continue;
            };

            for j in 0..self.bodies.len() {
                if i == j || !self.bodies[j].enabled {
                    continue;
                }
                let center = self.bodies[i].position;
                let other = &self.bodies[j];
                let result = match other.desc.shape {
                    Shape::Rect { half_extents } => {
                        circle_rect_collision(center, radius, other.position, half_extents)
                    }
                    Shape::EdgeLoop { half_extents } => {
                        circle_bounds_collision(center, radius, other.position, half_extents)
                    }
                    Shape::Circle { .. } => CollisionResult::miss(),
                };
                if !result.hit {
                    continue;
                }

                let solid = other.desc.kind != BodyKind::Sensor;
                let reports = Self::wants_contact(&self.bodies[i].desc, &other.desc);
                let other_tag = other.desc.tag;

                if solid {
                    let mover = &mut self.bodies[i];
                    mover.position += result.normal * result.penetration;
                    if mover.velocity.dot(result.normal) < 0.0 {
                        mover.velocity = reflect_velocity(mover.velocity, result.normal);
                    }
                }

                if reports {
                    let (a, b) = (BodyHandle(i as u32), BodyHandle(j as u32));
                    let key = if a < b { (a, b) } else { (b, a) };
                    // Solid bodies are separated again, so every hit is a new contact
                    if solid || !self.touching.contains(&key) {
                        contacts.push(Contact {
                            a: ContactBody {
                                body: a,
                                tag: self.bodies[i].desc.tag,
                            },
                            b: ContactBody {
                                body: b,
                                tag: other_tag,
                            },
                        });
                    }
                    if !solid {
                        touching.insert(key);
                    }
                }
            }
        }

        self.touching = touching;
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_desc(position: Vec2) -> BodyDesc {
        BodyDesc::new(
            CategoryTag::Ball,
            Shape::Circle { radius: 10.0 },
            BodyKind::Dynamic { mass: 0.1 },
            position,
        )
        .with_contacts(CategoryMask::BLOCK | CategoryMask::FLOOR_SENSOR)
    }

    #[test]
    fn test_reflect_velocity() {
        let v = reflect_velocity(Vec2::new(3.0, -4.0), Vec2::Y);
        assert_eq!(v, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_circle_rect_collision_from_below() {
        let result = circle_rect_collision(
            Vec2::new(0.0, -15.0),
            10.0,
            Vec2::ZERO,
            Vec2::new(20.0, 10.0),
        );
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::new(0.0, -1.0));
        assert!((result.penetration - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_rect_miss() {
        let result =
            circle_rect_collision(Vec2::new(0.0, -30.0), 10.0, Vec2::ZERO, Vec2::new(20.0, 10.0));
        assert!(!result.hit);
    }

    #[test]
    fn test_circle_bounds_corner() {
        let result = circle_bounds_collision(
            Vec2::new(95.0, 95.0),
            10.0,
            Vec2::ZERO,
            Vec2::new(100.0, 100.0),
        );
        assert!(result.hit);
        assert!(result.normal.x < 0.0 && result.normal.y < 0.0);
    }

    #[test]
    fn test_impulse_divides_by_mass() {
        let mut world = HeadlessPhysics::new();
        let ball = world.add_body(ball_desc(Vec2::ZERO));
        world.apply_impulse(ball, Vec2::new(30.0, 30.0));
        assert!(world.velocity(ball).abs_diff_eq(Vec2::new(300.0, 300.0), 1e-3));
    }

    #[test]
    fn test_impulse_ignored_by_static_bodies() {
        let mut world = HeadlessPhysics::new();
        let wall = world.add_body(BodyDesc::new(
            CategoryTag::Border,
            Shape::Rect {
                half_extents: Vec2::ONE,
            },
            BodyKind::Static,
            Vec2::ZERO,
        ));
        world.apply_impulse(wall, Vec2::X);
        assert_eq!(world.velocity(wall), Vec2::ZERO);
    }

    #[test]
    fn test_block_contact_bounces_and_reports() {
        let mut world = HeadlessPhysics::new();
        let ball = world.add_body(ball_desc(Vec2::new(0.0, -14.0)));
        let block = world.add_body(BodyDesc::new(
            CategoryTag::Block,
            Shape::Rect {
                half_extents: Vec2::new(45.0, 12.5),
            },
            BodyKind::Static,
            Vec2::new(0.0, 10.0),
        ));
        world.set_velocity(ball, Vec2::new(0.0, 120.0));

        let contacts = world.step(0.1);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].a.body, ball);
        assert_eq!(contacts[0].b.body, block);
        assert_eq!(contacts[0].b.tag, CategoryTag::Block);
        assert!(world.velocity(ball).y < 0.0, "ball should bounce back down");
    }

    #[test]
    fn test_disabled_body_is_ignored() {
        let mut world = HeadlessPhysics::new();
        let ball = world.add_body(ball_desc(Vec2::new(0.0, -14.0)));
        let block = world.add_body(BodyDesc::new(
            CategoryTag::Block,
            Shape::Rect {
                half_extents: Vec2::new(45.0, 12.5),
            },
            BodyKind::Static,
            Vec2::new(0.0, 10.0),
        ));
        world.set_enabled(block, false);
        world.set_velocity(ball, Vec2::new(0.0, 120.0));

        assert!(world.step(0.1).is_empty());
        assert!(world.velocity(ball).y > 0.0);
    }

    #[test]
    fn test_sensor_reports_once_per_entry() {
        let mut world = HeadlessPhysics::new();
        let ball = world.add_body(ball_desc(Vec2::new(0.0, 20.0)));
        world.add_body(BodyDesc::new(
            CategoryTag::FloorSensor,
            Shape::Rect {
                half_extents: Vec2::new(100.0, 5.0),
            },
            BodyKind::Sensor,
            Vec2::ZERO,
        ));
        world.set_velocity(ball, Vec2::new(0.0, -50.0));

        let mut reported = 0;
        for _ in 0..6 {
            reported += world.step(0.1).len();
        }
        assert_eq!(reported, 1, "sensor contact should begin exactly once");
        assert!(world.velocity(ball).y < 0.0, "sensors do not bounce");
    }
}
