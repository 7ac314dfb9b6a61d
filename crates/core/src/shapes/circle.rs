use std::f32::consts::TAU;

use crate::{
    capability::ShapeDrawer,
    render::{DrawData, DrawingSurface},
};

#[derive(Debug, Default, Clone, Copy)]
pub struct CircleDrawer;

impl ShapeDrawer for CircleDrawer {
    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>) {
        if data.radius > 0.0 {
            surface.arc(0.0, 0.0, data.radius, 0.0, TAU);
        }
    }
}
