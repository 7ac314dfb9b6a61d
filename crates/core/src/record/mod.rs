use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{assets::Bitmap, render::DrawingSurface};

/// A single call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    BeginPath,
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    Arc([f32; 5]),
    ClosePath,
    Fill,
    Stroke,
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f32),
    FillRect([f32; 4]),
    ClearRect([f32; 4]),
    DrawImage { key: String, rect: [f32; 4] },
    SetTransform([f32; 6]),
    ResetTransform,
    Shadow { blur: f32, color: String, offset: [f32; 2] },
    GlobalAlpha(f32),
    CompositeOperation(String),
}

/// Drawing surface that records every call instead of rasterizing. Used for
/// headless runs and for asserting on the draw pipeline.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Drops the recorded commands and returns how many there were.
    pub fn finish_frame(&mut self) -> usize {
        self.frames += 1;
        let count = self.commands.len();
        self.commands.clear();
        count
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl DrawingSurface for RecordingSurface {
    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo([x, y]));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo([x, y]));
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32) {
        self.push(DrawCommand::Arc([x, y, radius, start_angle, end_angle]));
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle(style.to_string()));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle(style.to_string()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::FillRect([x, y, width, height]));
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::ClearRect([x, y, width, height]));
    }

    fn draw_image(&mut self, image: &Bitmap, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::DrawImage {
            key: image.key().to_string(),
            rect: [x, y, width, height],
        });
    }

    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.push(DrawCommand::SetTransform([a, b, c, d, e, f]));
    }

    fn reset_transform(&mut self) {
        self.push(DrawCommand::ResetTransform);
    }

    fn set_shadow(&mut self, blur: f32, color: &str, offset: Vec2) {
        self.push(DrawCommand::Shadow {
            blur,
            color: color.to_string(),
            offset: offset.to_array(),
        });
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn set_composite_operation(&mut self, operation: &str) {
        self.push(DrawCommand::CompositeOperation(operation.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_resets_per_frame() {
        let mut surface = RecordingSurface::new();
        surface.begin_path();
        surface.line_to(1.0, 2.0);

        assert_eq!(surface.commands()[1], DrawCommand::LineTo([1.0, 2.0]));
        assert_eq!(surface.finish_frame(), 2);
        assert!(surface.commands().is_empty());
        assert_eq!(surface.frames(), 1);
    }
}
