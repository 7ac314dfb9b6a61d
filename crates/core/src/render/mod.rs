//! Drawing-surface contract and the per-particle draw pipeline.

use glam::Vec2;

use crate::{
    assets::Bitmap,
    color::{style_from_hsl, style_from_rgb},
    config::{ShadowOptions, TransformOptions},
    math::{angle_of, CanvasSize},
    particle::Particle,
    registry::{EffectRegistry, ShapeRegistry},
    timeline::FrameDelta,
};

const DEFAULT_COMPOSITE: &str = "source-over";

/// 2D drawing context the engine renders into. The core only writes; it
/// never reads pixels back.
pub trait DrawingSurface {
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn draw_image(&mut self, image: &Bitmap, x: f32, y: f32, width: f32, height: f32);
    /// Sets the affine transform `[a c e; b d f]`.
    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32);
    fn reset_transform(&mut self);
    fn set_shadow(&mut self, blur: f32, color: &str, offset: Vec2);
    fn set_global_alpha(&mut self, alpha: f32);
    fn set_composite_operation(&mut self, operation: &str);
}

/// Linear part of the particle transform: rotation composed with the
/// configured scale/skew factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl TransformData {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
    };

    pub fn rotated(angle: f32, factors: &TransformOptions) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos * factors.a.unwrap_or(1.0),
            b: sin * factors.b.unwrap_or(1.0),
            c: -sin * factors.c.unwrap_or(1.0),
            d: cos * factors.d.unwrap_or(1.0),
        }
    }
}

/// Everything a shape or effect drawer receives for one particle.
#[derive(Debug, Clone, Copy)]
pub struct DrawData<'a> {
    pub particle: &'a Particle,
    pub radius: f32,
    pub opacity: f32,
    pub delta: FrameDelta,
    pub pixel_ratio: f32,
    pub transform: TransformData,
    pub stroke_width: f32,
}

/// Orchestrates transform, styles, shape, after-draw and effect for each
/// particle.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    pub pixel_ratio: f32,
    pub transform: TransformOptions,
    pub shadow: ShadowOptions,
    /// Composite operation applied while drawing when masking is enabled.
    pub mask_composite: Option<String>,
}

impl FrameRenderer {
    pub fn new(pixel_ratio: f32) -> Self {
        Self {
            pixel_ratio,
            transform: TransformOptions::default(),
            shadow: ShadowOptions::default(),
            mask_composite: None,
        }
    }

    /// Draws a single particle. Destroyed and spawning particles are skipped.
    pub fn draw_particle(
        &self,
        surface: &mut dyn DrawingSurface,
        particle: &Particle,
        delta: &FrameDelta,
        shapes: &ShapeRegistry,
        effects: &EffectRegistry,
    ) {
        if particle.destroyed || particle.spawning {
            return;
        }

        let position = particle.position;
        let path_angle = if particle.path_rotation {
            angle_of(particle.velocity)
        } else {
            0.0
        };
        let transform = TransformData::rotated(particle.rotation + path_angle, &self.transform);

        surface.set_transform(
            transform.a,
            transform.b,
            transform.c,
            transform.d,
            position.x,
            position.y,
        );

        if let Some(composite) = &self.mask_composite {
            surface.set_composite_operation(composite);
        }

        if self.shadow.enable {
            if let Some(color) = particle.shadow_color {
                surface.set_shadow(
                    self.shadow.blur,
                    &style_from_rgb(color, None),
                    self.shadow.offset,
                );
            }
        }

        if let Some(fill) = particle.fill_color() {
            surface.set_fill_style(&style_from_hsl(fill, Some(particle.opacity)));
        }

        let stroke_width = particle.stroke.as_ref().map_or(0.0, |stroke| stroke.width);
        surface.set_line_width(stroke_width);

        if let Some(stroke) = &particle.stroke {
            if let Some(color) = particle.stroke_color() {
                surface.set_stroke_style(&style_from_hsl(color, Some(stroke.opacity)));
            }
        }

        let data = DrawData {
            particle,
            radius: particle.get_radius(),
            opacity: particle.opacity,
            delta: *delta,
            pixel_ratio: self.pixel_ratio,
            transform,
            stroke_width,
        };

        draw_shape(surface, &data, shapes);
        draw_shape_after_draw(surface, &data, shapes);
        draw_effect(surface, &data, effects);

        surface.set_composite_operation(DEFAULT_COMPOSITE);
        surface.reset_transform();
    }
}

/// Runs the particle's shape drawer and finishes the path.
pub fn draw_shape(surface: &mut dyn DrawingSurface, data: &DrawData<'_>, shapes: &ShapeRegistry) {
    let particle = data.particle;
    let Some(drawer) = particle.shape.as_deref().and_then(|shape| shapes.get(shape)) else {
        return;
    };

    surface.begin_path();
    drawer.draw(surface, data);

    if particle.shape_close {
        surface.close_path();
    }
    if data.stroke_width > 0.0 {
        surface.stroke();
    }
    if particle.shape_fill {
        surface.fill();
    }
}

pub fn draw_shape_after_draw(
    surface: &mut dyn DrawingSurface,
    data: &DrawData<'_>,
    shapes: &ShapeRegistry,
) {
    if let Some(drawer) = data.particle.shape.as_deref().and_then(|shape| shapes.get(shape)) {
        drawer.after_draw(surface, data);
    }
}

pub fn draw_effect(surface: &mut dyn DrawingSurface, data: &DrawData<'_>, effects: &EffectRegistry) {
    if let Some(drawer) = data
        .particle
        .effect
        .as_deref()
        .and_then(|effect| effects.get(effect))
    {
        drawer.draw(surface, data);
    }
}

pub fn draw_line(surface: &mut dyn DrawingSurface, begin: Vec2, end: Vec2) {
    surface.begin_path();
    surface.move_to(begin.x, begin.y);
    surface.line_to(end.x, end.y);
    surface.close_path();
}

pub fn clear(surface: &mut dyn DrawingSurface, size: CanvasSize) {
    surface.clear_rect(0.0, 0.0, size.width, size.height);
}

/// Fills the whole canvas with `base_color`, transparent when absent.
pub fn paint_base(surface: &mut dyn DrawingSurface, size: CanvasSize, base_color: Option<&str>) {
    surface.set_fill_style(base_color.unwrap_or("rgba(0,0,0,0)"));
    surface.fill_rect(0.0, 0.0, size.width, size.height);
}

pub fn paint_image(
    surface: &mut dyn DrawingSurface,
    size: CanvasSize,
    image: Option<&Bitmap>,
    opacity: f32,
) {
    let Some(image) = image else {
        return;
    };
    surface.set_global_alpha(opacity);
    surface.draw_image(image, 0.0, 0.0, size.width, size.height);
    surface.set_global_alpha(1.0);
}
