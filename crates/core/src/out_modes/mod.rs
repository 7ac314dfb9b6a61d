//! Boundary policies and the stage that applies them.
//!
//! Every frame the [`OutOfBoundsResolver`] asks the manager registered for
//! the particle's configured mode on each side to react. Sides are evaluated
//! independently in the order bottom, left, right, top, so one particle can
//! bounce horizontally while wrapping vertically.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    capability::{FrameEnv, OutModeManager},
    math::{
        angle_of, calculate_bounds, from_polar, get_distances, is_point_inside, random_in_range,
        with_angle, OutModeDirection,
    },
    particle::{OutType, Particle},
    registry::OutModeRegistry,
    timeline::FrameDelta,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutMode {
    Bounce,
    Destroy,
    Out,
    None,
    Split,
}

/// Wraps particles to the opposite side, or relocates them around the move
/// center for the circular out types.
#[derive(Debug, Clone)]
pub struct OutOutMode {
    modes: [OutMode; 1],
}

impl OutOutMode {
    pub fn new() -> Self {
        Self {
            modes: [OutMode::Out],
        }
    }

    fn update_inside(particle: &mut Particle, env: &mut FrameEnv<'_>) {
        let velocity = particle.velocity;
        let center = particle.move_center;
        let rim = center.position + from_polar(center.radius, angle_of(velocity) + PI);
        let distances = get_distances(particle.position, rim);
        let (dx, dy) = (distances.dx, distances.dy);

        if (velocity.x <= 0.0 && dx >= 0.0)
            || (velocity.y <= 0.0 && dy >= 0.0)
            || (velocity.x >= 0.0 && dx <= 0.0)
            || (velocity.y >= 0.0 && dy <= 0.0)
        {
            return;
        }

        particle.position.x = random_in_range(env.rng, 0.0, env.canvas.width).floor();
        particle.position.y = random_in_range(env.rng, 0.0, env.canvas.height).floor();

        let towards = get_distances(particle.position, center.position);
        particle.direction = (-towards.dy).atan2(-towards.dx);
        particle.velocity = with_angle(particle.velocity, particle.direction);
    }

    fn update_outside(particle: &mut Particle, env: &mut FrameEnv<'_>) {
        let center = particle.move_center;
        let spread = center.radius.abs();

        particle.position.x =
            random_in_range(env.rng, -spread, spread).floor() + center.position.x;
        particle.position.y =
            random_in_range(env.rng, -spread, spread).floor() + center.position.y;

        if center.radius == 0.0 {
            return;
        }

        let away = get_distances(particle.position, center.position);
        let mut direction = away.dy.atan2(away.dx);
        if center.radius < 0.0 {
            direction += PI;
        }
        particle.direction = direction;
        particle.velocity = with_angle(particle.velocity, direction);
    }

    fn update_normal(particle: &mut Particle, direction: OutModeDirection, env: &mut FrameEnv<'_>) {
        let warp = env.options.movement.warp;
        let canvas = env.canvas;
        let radius = particle.get_radius();
        let offset = particle.offset;
        let bounds = calculate_bounds(particle.position, radius);

        let wrapped_x = match direction {
            OutModeDirection::Right if bounds.left > canvas.width + offset.x => {
                Some(-radius - offset.x)
            }
            OutModeDirection::Left if bounds.right < -offset.x => {
                Some(canvas.width + radius + offset.x)
            }
            _ => None,
        };
        if let Some(x) = wrapped_x {
            particle.position.x = x;
            particle.initial_position.x = x;
            if !warp {
                particle.position.y = random_in_range(env.rng, 0.0, canvas.height);
                particle.initial_position.y = particle.position.y;
            }
        }

        let wrapped_y = match direction {
            OutModeDirection::Bottom if bounds.top > canvas.height + offset.y => {
                Some(-radius - offset.y)
            }
            OutModeDirection::Top if bounds.bottom < -offset.y => {
                Some(canvas.height + radius + offset.y)
            }
            _ => None,
        };
        if let Some(y) = wrapped_y {
            if !warp {
                particle.position.x = random_in_range(env.rng, 0.0, canvas.width);
                particle.initial_position.x = particle.position.x;
            }
            particle.position.y = y;
            particle.initial_position.y = y;
        }
    }
}

impl Default for OutOutMode {
    fn default() -> Self {
        Self::new()
    }
}

impl OutModeManager for OutOutMode {
    fn modes(&self) -> &[OutMode] {
        &self.modes
    }

    fn update(
        &self,
        particle: &mut Particle,
        direction: OutModeDirection,
        _delta: &FrameDelta,
        mode: OutMode,
        env: &mut FrameEnv<'_>,
    ) {
        if !self.handles(mode) {
            return;
        }

        if particle.out_type == OutType::Inside {
            Self::update_inside(particle, env);
            return;
        }

        if is_point_inside(
            particle.position,
            env.canvas,
            Vec2::ZERO,
            particle.get_radius(),
            Some(direction),
        ) {
            return;
        }

        match particle.out_type {
            OutType::Outside => Self::update_outside(particle, env),
            _ => Self::update_normal(particle, direction, env),
        }
    }
}

/// Reflects the velocity component normal to the crossed side and clamps the
/// particle back onto the canvas. Also serves `split`.
#[derive(Debug, Clone)]
pub struct BounceOutMode {
    modes: [OutMode; 2],
}

impl BounceOutMode {
    pub fn new() -> Self {
        Self {
            modes: [OutMode::Bounce, OutMode::Split],
        }
    }
}

impl Default for BounceOutMode {
    fn default() -> Self {
        Self::new()
    }
}

impl OutModeManager for BounceOutMode {
    fn modes(&self) -> &[OutMode] {
        &self.modes
    }

    fn update(
        &self,
        particle: &mut Particle,
        direction: OutModeDirection,
        _delta: &FrameDelta,
        mode: OutMode,
        env: &mut FrameEnv<'_>,
    ) {
        if !self.handles(mode) {
            return;
        }

        let radius = particle.get_radius();
        let offset = particle.offset;
        let canvas = env.canvas;
        let position = &mut particle.position;
        let velocity = &mut particle.velocity;

        let bounced = match direction {
            OutModeDirection::Right => {
                let edge = canvas.width + offset.x;
                let crossed = position.x + radius > edge && velocity.x > 0.0;
                if crossed {
                    velocity.x = -velocity.x;
                    position.x = edge - radius;
                }
                crossed
            }
            OutModeDirection::Left => {
                let edge = -offset.x;
                let crossed = position.x - radius < edge && velocity.x < 0.0;
                if crossed {
                    velocity.x = -velocity.x;
                    position.x = edge + radius;
                }
                crossed
            }
            OutModeDirection::Bottom => {
                let edge = canvas.height + offset.y;
                let crossed = position.y + radius > edge && velocity.y > 0.0;
                if crossed {
                    velocity.y = -velocity.y;
                    position.y = edge - radius;
                }
                crossed
            }
            OutModeDirection::Top => {
                let edge = -offset.y;
                let crossed = position.y - radius < edge && velocity.y < 0.0;
                if crossed {
                    velocity.y = -velocity.y;
                    position.y = edge + radius;
                }
                crossed
            }
        };

        if bounced {
            particle.direction = angle_of(particle.velocity);
        }
    }
}

/// Destroys particles that have fully left their allowed region.
#[derive(Debug, Clone)]
pub struct DestroyOutMode {
    modes: [OutMode; 1],
}

impl DestroyOutMode {
    pub fn new() -> Self {
        Self {
            modes: [OutMode::Destroy],
        }
    }
}

impl Default for DestroyOutMode {
    fn default() -> Self {
        Self::new()
    }
}

impl OutModeManager for DestroyOutMode {
    fn modes(&self) -> &[OutMode] {
        &self.modes
    }

    fn update(
        &self,
        particle: &mut Particle,
        direction: OutModeDirection,
        _delta: &FrameDelta,
        mode: OutMode,
        env: &mut FrameEnv<'_>,
    ) {
        if !self.handles(mode) {
            return;
        }

        match particle.out_type {
            OutType::Inside => {
                let center = particle.move_center;
                let distances = get_distances(particle.position, center.position);
                let velocity = particle.velocity;
                if (velocity.x < 0.0 && distances.dx > center.radius)
                    || (velocity.y < 0.0 && distances.dy > center.radius)
                    || (velocity.x >= 0.0 && distances.dx < -center.radius)
                    || (velocity.y >= 0.0 && distances.dy < -center.radius)
                {
                    return;
                }
            }
            OutType::Normal | OutType::Outside => {
                if is_point_inside(
                    particle.position,
                    env.canvas,
                    particle.offset,
                    particle.get_radius(),
                    Some(direction),
                ) {
                    return;
                }
            }
        }

        tracing::trace!(id = particle.id.0, ?direction, "particle left the canvas");
        particle.destroy();
    }
}

/// Leaves particles wherever they go.
#[derive(Debug, Clone)]
pub struct NoneOutMode {
    modes: [OutMode; 1],
}

impl NoneOutMode {
    pub fn new() -> Self {
        Self {
            modes: [OutMode::None],
        }
    }
}

impl Default for NoneOutMode {
    fn default() -> Self {
        Self::new()
    }
}

impl OutModeManager for NoneOutMode {
    fn modes(&self) -> &[OutMode] {
        &self.modes
    }

    fn update(
        &self,
        _particle: &mut Particle,
        _direction: OutModeDirection,
        _delta: &FrameDelta,
        _mode: OutMode,
        _env: &mut FrameEnv<'_>,
    ) {
    }
}

/// Applies the configured out mode for every side of a particle.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutOfBoundsResolver;

impl OutOfBoundsResolver {
    /// Particles kept inside the move-center circle get a single test with the
    /// default mode; every other particle is tested once per side.
    pub fn resolve(
        &self,
        particle: &mut Particle,
        delta: &FrameDelta,
        managers: &OutModeRegistry,
        env: &mut FrameEnv<'_>,
    ) {
        if !particle.is_active() {
            return;
        }

        let out_modes = env.options.movement.out_modes.clone();
        if particle.out_type == OutType::Inside {
            let mode = out_modes.default;
            if let Some(manager) = managers.get(&mode) {
                manager.update(particle, OutModeDirection::Bottom, delta, mode, env);
            }
            return;
        }

        for direction in OutModeDirection::ALL {
            if particle.destroyed {
                break;
            }
            let mode = out_modes.for_direction(direction);
            if let Some(manager) = managers.get(&mode) {
                manager.update(particle, direction, delta, mode, env);
            }
        }
    }
}
