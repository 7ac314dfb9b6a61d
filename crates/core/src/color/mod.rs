//! Color types, parsing and HSL animation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    animation::{AnimatedChannel, ChannelAnimation},
    timeline::FrameDelta,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Rgb {
    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if (max - min).abs() <= f32::EPSILON {
            return Hsl {
                h: 0.0,
                s: 0.0,
                l: l * 100.0,
            };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsl {
            h: h * 60.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let grey = (l * 255.0).round() as u8;
            return Rgb {
                r: grey,
                g: grey,
                b: grey,
            };
        }

        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;
        let channel = |t: f32| (hue_to_rgb(p, q, t) * 255.0).round() as u8;

        Rgb {
            r: channel(h + 1.0 / 3.0),
            g: channel(h),
            b: channel(h - 1.0 / 3.0),
        }
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Parses `#rgb` and `#rrggbb` notations.
pub fn parse_hex(input: &str) -> Option<Rgb> {
    let hex = input.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let value = u32::from_str_radix(&expanded, 16).ok()?;
    Some(Rgb {
        r: (value >> 16) as u8,
        g: (value >> 8) as u8,
        b: value as u8,
    })
}

pub fn style_from_rgb(color: Rgb, opacity: Option<f32>) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        color.r,
        color.g,
        color.b,
        opacity.unwrap_or(1.0)
    )
}

pub fn style_from_hsl(color: Hsl, opacity: Option<f32>) -> String {
    format!(
        "hsla({}, {}%, {}%, {})",
        color.h,
        color.s,
        color.l,
        opacity.unwrap_or(1.0)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlterType {
    Darken,
    Enlighten,
}

/// Shifts the lightness of `color` by `value` percentage points.
pub fn alter_hsl(color: Hsl, alter: AlterType, value: f32) -> Hsl {
    let sign = match alter {
        AlterType::Darken => -1.0,
        AlterType::Enlighten => 1.0,
    };
    Hsl {
        l: color.l + sign * value,
        ..color
    }
}

/// A configured value that may be a single item or a list to pick from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }
}

impl<T: Default> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

/// Picks an item from a single-or-list value. With `reduce_duplicates` the
/// choice is `id % len`, which spreads consecutive particles across the list
/// deterministically; otherwise the choice is random.
pub fn item_from_single_or_multiple<'a, T, R: Rng + ?Sized>(
    value: &'a OneOrMany<T>,
    id: usize,
    reduce_duplicates: bool,
    rng: &mut R,
) -> Option<&'a T> {
    let items = value.as_slice();
    if items.is_empty() {
        return None;
    }
    let index = if reduce_duplicates {
        id % items.len()
    } else {
        rng.gen_range(0..items.len())
    };
    items.get(index)
}

/// A single configured color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// `#rrggbb`, `#rgb` or the literal `random`.
    Named(String),
    Hsl(Hsl),
    Rgb(Rgb),
}

impl ColorSpec {
    pub fn to_hsl<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Hsl> {
        match self {
            Self::Named(name) if name.eq_ignore_ascii_case("random") => Some(Hsl {
                h: rng.gen_range(0.0..360.0),
                s: 100.0,
                l: 50.0,
            }),
            Self::Named(name) => parse_hex(name).map(Rgb::to_hsl),
            Self::Hsl(hsl) => Some(*hsl),
            Self::Rgb(rgb) => Some(rgb.to_hsl()),
        }
    }
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::Named("#ffffff".to_string())
    }
}

/// Animation settings for the three HSL channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HslAnimationOptions {
    pub h: ChannelAnimation,
    pub s: ChannelAnimation,
    pub l: ChannelAnimation,
}

impl HslAnimationOptions {
    pub fn any_enabled(&self) -> bool {
        self.h.enable || self.s.enable || self.l.enable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorOptions {
    pub value: OneOrMany<ColorSpec>,
    pub animation: HslAnimationOptions,
}

/// Resolves a configured color to HSL, honouring `reduce_duplicates`.
pub fn range_color_to_hsl<R: Rng + ?Sized>(
    value: &OneOrMany<ColorSpec>,
    id: usize,
    reduce_duplicates: bool,
    rng: &mut R,
) -> Option<Hsl> {
    item_from_single_or_multiple(value, id, reduce_duplicates, rng)?.to_hsl(rng)
}

/// Animated HSL color: hue wraps, saturation and lightness reflect.
#[derive(Debug, Clone, PartialEq)]
pub struct HslAnimation {
    pub h: AnimatedChannel,
    pub s: AnimatedChannel,
    pub l: AnimatedChannel,
}

impl HslAnimation {
    pub fn from_hsl<R: Rng + ?Sized>(
        hsl: Hsl,
        animation: Option<&HslAnimationOptions>,
        reduce_factor: f32,
        rng: &mut R,
    ) -> Self {
        let mut color = Self {
            h: AnimatedChannel::hue(hsl.h),
            s: AnimatedChannel::percent(hsl.s),
            l: AnimatedChannel::percent(hsl.l),
        };
        if let Some(animation) = animation {
            color.h = color.h.animate(&animation.h, reduce_factor, rng);
            color.s = color.s.animate(&animation.s, reduce_factor, rng);
            color.l = color.l.animate(&animation.l, reduce_factor, rng);
        }
        color
    }

    pub fn any_enabled(&self) -> bool {
        self.h.enable || self.s.enable || self.l.enable
    }

    pub fn hsl(&self) -> Hsl {
        Hsl {
            h: self.h.value,
            s: self.s.value,
            l: self.l.value,
        }
    }

    pub fn update<R: Rng + ?Sized>(&mut self, delta: &FrameDelta, rng: &mut R) {
        self.h.update(delta, rng);
        self.s.update(delta, rng);
        self.l.update(delta, rng);
    }
}
