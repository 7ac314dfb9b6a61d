use std::f32::consts::SQRT_2;

use crate::{
    capability::ShapeDrawer,
    render::{DrawData, DrawingSurface},
};

/// Square inscribed in the particle's circle.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquareDrawer;

impl ShapeDrawer for SquareDrawer {
    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>) {
        let half = data.radius / SQRT_2;
        surface.move_to(-half, -half);
        surface.line_to(half, -half);
        surface.line_to(half, half);
        surface.line_to(-half, half);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::{
        particle::{Particle, ParticleId},
        record::{DrawCommand, RecordingSurface},
        render::TransformData,
        timeline::FrameDelta,
    };

    #[test]
    fn traces_four_corners_around_origin() {
        let particle = Particle::new(ParticleId(0), Vec2::new(50.0, 50.0));
        let data = DrawData {
            particle: &particle,
            radius: SQRT_2,
            opacity: 1.0,
            delta: FrameDelta::default(),
            pixel_ratio: 1.0,
            transform: TransformData::IDENTITY,
            stroke_width: 0.0,
        };
        let mut surface = RecordingSurface::new();

        SquareDrawer.draw(&mut surface, &data);

        let commands = surface.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], DrawCommand::MoveTo([-1.0, -1.0]));
        assert_eq!(commands[2], DrawCommand::LineTo([1.0, 1.0]));
    }
}
