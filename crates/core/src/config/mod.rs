use std::{collections::HashMap, path::Path};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    color::{ColorOptions, ColorSpec, OneOrMany},
    lifecycle::LifeOptions,
    math::{CanvasSize, Easing, OutModeDirection, RangeValue},
    out_modes::OutMode,
    particle::OutType,
    timeline::ClockSettings,
    Result,
};

/// Top-level configuration for a particle container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas: CanvasSize,
    pub pixel_ratio: f32,
    /// Divides life timings and scales color velocities; lowered on slow
    /// devices.
    pub reduce_factor: f32,
    pub seed: u64,
    pub clock: ClockSettings,
    pub number: NumberOptions,
    pub particles: ParticleOptions,
    pub interactivity: InteractivityOptions,
    pub background: BackgroundOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            pixel_ratio: 1.0,
            reduce_factor: 1.0,
            seed: 0,
            clock: ClockSettings::default(),
            number: NumberOptions::default(),
            particles: ParticleOptions::default(),
            interactivity: InteractivityOptions::default(),
            background: BackgroundOptions::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberOptions {
    /// Particles created at start.
    pub value: usize,
    /// Pool capacity; `0` is unlimited. The oldest particle is pruned when a
    /// spawn would exceed it.
    pub limit: usize,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            value: 100,
            limit: 0,
        }
    }
}

/// Options applied to every particle at spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleOptions {
    pub color: ColorOptions,
    pub stroke: OneOrMany<StrokeOptions>,
    pub opacity: RangeValue,
    /// Radius in surface pixels before the pixel ratio is applied.
    pub size: RangeValue,
    /// Initial rotation in radians.
    pub rotation: RangeValue,
    pub life: Option<LifeOptions>,
    #[serde(rename = "move")]
    pub movement: MoveOptions,
    pub shape: ShapeOptions,
    pub effect: Option<OneOrMany<String>>,
    pub shadow: ShadowOptions,
    pub transform: TransformOptions,
    /// Pick list items by particle id instead of at random.
    pub reduce_duplicates: bool,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            color: ColorOptions::default(),
            stroke: OneOrMany::One(StrokeOptions::default()),
            opacity: RangeValue::Fixed(1.0),
            size: RangeValue::Fixed(3.0),
            rotation: RangeValue::Fixed(0.0),
            life: None,
            movement: MoveOptions::default(),
            shape: ShapeOptions::default(),
            effect: None,
            shadow: ShadowOptions::default(),
            transform: TransformOptions::default(),
            reduce_duplicates: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeOptions {
    pub width: RangeValue,
    pub opacity: Option<RangeValue>,
    pub color: Option<ColorOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveOptions {
    pub enable: bool,
    /// Surface pixels per 60 fps frame.
    pub speed: RangeValue,
    /// Heading in radians; random when absent.
    pub direction: Option<f32>,
    /// Keep the perpendicular coordinate when wrapping out of bounds.
    pub warp: bool,
    pub out_modes: OutModes,
    pub center: Option<MoveCenterOptions>,
    pub path: PathOptions,
    /// Draw rotated along the direction of travel.
    pub path_rotation: bool,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            enable: true,
            speed: RangeValue::Fixed(2.0),
            direction: None,
            warp: false,
            out_modes: OutModes::default(),
            center: None,
            path: PathOptions::default(),
            path_rotation: false,
        }
    }
}

/// Out mode per side, each falling back to `default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutModes {
    pub default: OutMode,
    pub bottom: Option<OutMode>,
    pub left: Option<OutMode>,
    pub right: Option<OutMode>,
    pub top: Option<OutMode>,
}

impl Default for OutModes {
    fn default() -> Self {
        Self {
            default: OutMode::Out,
            bottom: None,
            left: None,
            right: None,
            top: None,
        }
    }
}

impl OutModes {
    pub fn for_direction(&self, direction: OutModeDirection) -> OutMode {
        let side = match direction {
            OutModeDirection::Bottom => self.bottom,
            OutModeDirection::Left => self.left,
            OutModeDirection::Right => self.right,
            OutModeDirection::Top => self.top,
        };
        side.unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveCenterOptions {
    /// Percent of the canvas width.
    pub x: f32,
    /// Percent of the canvas height.
    pub y: f32,
    pub radius: f32,
    pub mode: OutType,
}

impl Default for MoveCenterOptions {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            radius: 0.0,
            mode: OutType::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    pub enable: bool,
    /// Key of the registered path generator.
    pub generator: Option<String>,
    /// Generator specific settings.
    pub options: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    #[serde(rename = "type")]
    pub kind: OneOrMany<String>,
    pub close: bool,
    pub fill: bool,
    /// Per-shape settings keyed by shape name.
    pub options: HashMap<String, Value>,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            kind: OneOrMany::One("circle".to_string()),
            close: true,
            fill: true,
            options: HashMap::new(),
        }
    }
}

impl ShapeOptions {
    pub fn uses(&self, shape: &str) -> bool {
        self.kind.as_slice().iter().any(|kind| kind == shape)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowOptions {
    pub enable: bool,
    pub blur: f32,
    pub color: Option<ColorSpec>,
    pub offset: Vec2,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            enable: false,
            blur: 0.0,
            color: None,
            offset: Vec2::ZERO,
        }
    }
}

/// Factors multiplied into the rotation matrix; absent entries are `1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub a: Option<f32>,
    pub b: Option<f32>,
    pub c: Option<f32>,
    pub d: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractivityOptions {
    pub on_click_attract: bool,
    pub on_hover_attract: bool,
    pub attract: AttractOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractOptions {
    /// Radius around the pointer, before the pixel ratio is applied.
    pub distance: f32,
    pub easing: Easing,
    pub factor: f32,
    pub max_speed: f32,
    pub speed: f32,
}

impl Default for AttractOptions {
    fn default() -> Self {
        Self {
            distance: 200.0,
            easing: Easing::EaseOutQuad,
            factor: 1.0,
            max_speed: 50.0,
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Base color painted before particles; transparent when absent.
    pub color: Option<String>,
    /// Draw particles with `composite` to punch through the background.
    pub mask: bool,
    pub composite: String,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            color: None,
            mask: false,
            composite: "destination-out".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.number.value, 100);
        assert_eq!(config.particles.movement.out_modes.default, OutMode::Out);
        assert!(config.particles.shape.uses("circle"));
    }

    #[test]
    fn out_modes_fall_back_to_default() {
        let config = EngineConfig::from_json_str(
            r#"{ "particles": { "move": { "out_modes": { "default": "bounce", "top": "out" } } } }"#,
        )
        .unwrap();
        let modes = &config.particles.movement.out_modes;

        assert_eq!(modes.for_direction(OutModeDirection::Top), OutMode::Out);
        assert_eq!(modes.for_direction(OutModeDirection::Left), OutMode::Bounce);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(format!("{err}").contains("invalid configuration"));
    }

    #[test]
    fn round_trips_through_pretty_json() {
        let json = EngineConfig::default().to_json_pretty().unwrap();
        let parsed = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.canvas, CanvasSize::default());
    }
}
