//! Overlay drawers layered after the particle shape.

use std::f32::consts::TAU;

use crate::{
    capability::EffectDrawer,
    render::{DrawData, DrawingSurface},
};

/// Alpha of the highlight at full particle opacity.
const HIGHLIGHT_ALPHA: f32 = 0.35;

/// Soft specular highlight in the upper-left quarter of the particle.
#[derive(Debug, Default, Clone, Copy)]
pub struct BubbleEffect;

impl EffectDrawer for BubbleEffect {
    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>) {
        let radius = data.radius;
        if radius <= 0.0 {
            return;
        }

        let highlight = radius / 3.0;
        surface.begin_path();
        surface.arc(-highlight, -highlight, highlight, 0.0, TAU);
        surface.set_fill_style(&format!(
            "rgba(255, 255, 255, {})",
            HIGHLIGHT_ALPHA * data.opacity
        ));
        surface.fill();
    }
}
