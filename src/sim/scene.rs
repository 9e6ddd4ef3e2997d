//! Scene construction
//!
//! Registers the fixed bodies once and keeps typed handles to them, so
//! nothing is looked up by name at runtime.

use glam::Vec2;

use super::state::{CategoryMask, CategoryTag};
use crate::physics::{BodyDesc, BodyHandle, BodyKind, PhysicsWorld, Shape};
use crate::tuning::Tuning;

/// Handles to the non-block bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub ball: BodyHandle,
    pub paddle: BodyHandle,
    pub floor: BodyHandle,
    pub border: BodyHandle,
}

impl Scene {
    pub fn build<P: PhysicsWorld + ?Sized>(tuning: &Tuning, physics: &mut P) -> Self {
        let half_width = tuning.half_playfield_width();
        let half_height = tuning.playfield_height / 2.0;
        let radius = tuning.ball_radius;

        let border = physics.add_body(BodyDesc::new(
            CategoryTag::Border,
            Shape::EdgeLoop {
                half_extents: Vec2::new(half_width, half_height),
            },
            BodyKind::Static,
            Vec2::ZERO,
        ));

        // Ball-radius strip along the bottom edge
        let floor = physics.add_body(BodyDesc::new(
            CategoryTag::FloorSensor,
            Shape::Rect {
                half_extents: Vec2::new(half_width, radius / 2.0),
            },
            BodyKind::Sensor,
            Vec2::new(0.0, -half_height + radius / 2.0),
        ));

        let paddle = physics.add_body(BodyDesc::new(
            CategoryTag::Paddle,
            Shape::Rect {
                half_extents: Vec2::new(tuning.half_paddle_width(), tuning.paddle_height / 2.0),
            },
            BodyKind::Kinematic,
            Vec2::new(0.0, tuning.paddle_y),
        ));

        let ball = physics.add_body(
            BodyDesc::new(
                CategoryTag::Ball,
                Shape::Circle { radius },
                BodyKind::Dynamic {
                    mass: tuning.ball_mass,
                },
                tuning.ball_reset_pos,
            )
            .with_contacts(CategoryMask::FLOOR_SENSOR | CategoryMask::BLOCK),
        );

        log::debug!(
            "Scene built: ball {:?}, paddle {:?}, floor {:?}, border {:?}",
            ball,
            paddle,
            floor,
            border
        );

        Self {
            ball,
            paddle,
            floor,
            border,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::HeadlessPhysics;

    #[test]
    fn test_scene_bodies_are_tagged() {
        let mut physics = HeadlessPhysics::new();
        let scene = Scene::build(&Tuning::default(), &mut physics);

        assert_eq!(physics.tag(scene.ball), Some(CategoryTag::Ball));
        assert_eq!(physics.tag(scene.paddle), Some(CategoryTag::Paddle));
        assert_eq!(physics.tag(scene.floor), Some(CategoryTag::FloorSensor));
        assert_eq!(physics.tag(scene.border), Some(CategoryTag::Border));
    }

    #[test]
    fn test_initial_positions() {
        let mut physics = HeadlessPhysics::new();
        let scene = Scene::build(&Tuning::default(), &mut physics);

        assert_eq!(physics.position(scene.ball), Vec2::new(0.0, -150.0));
        assert_eq!(physics.position(scene.paddle), Vec2::new(0.0, -320.0));
        assert_eq!(physics.position(scene.floor), Vec2::new(0.0, -378.0));
        assert_eq!(physics.velocity(scene.ball), Vec2::ZERO);
    }

    #[test]
    fn test_ball_falls_onto_floor_sensor() {
        let mut physics = HeadlessPhysics::new();
        let scene = Scene::build(&Tuning::default(), &mut physics);
        // Clear of the paddle
        physics.set_position(scene.ball, Vec2::new(480.0, -340.0));
        physics.set_velocity(scene.ball, Vec2::new(0.0, -600.0));

        let mut reported = Vec::new();
        for _ in 0..10 {
            reported.extend(physics.step(1.0 / 60.0));
        }
        let floor_hits = reported
            .iter()
            .filter(|c| c.b.body == scene.floor || c.a.body == scene.floor)
            .count();
        assert_eq!(floor_hits, 1, "sensor reports once on entry");
    }
}
