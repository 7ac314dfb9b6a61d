use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    assets::Bitmap,
    capability::{SetupContext, ShapeDrawer},
    color::{item_from_single_or_multiple, OneOrMany},
    particle::Particle,
    render::{DrawData, DrawingSurface},
    Result,
};

pub const DEFAULT_EMOJI_FONT: &str =
    r#""Twemoji Mozilla", Apple Color Emoji, "Segoe UI Emoji", "Noto Color Emoji", "EmojiOne Color""#;

const SHAPE_KEY: &str = "emoji";

/// Configuration found under `shape.options.emoji`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiShapeOptions {
    pub value: OneOrMany<String>,
    #[serde(default)]
    pub font: Option<String>,
}

/// Bitmap assigned to a particle, shared with every particle using the same
/// glyph and font.
#[derive(Debug, Clone)]
pub struct EmojiData {
    pub bitmap: Arc<Bitmap>,
}

/// Draws glyphs rasterized once per `(glyph, font)` pair.
#[derive(Debug, Default)]
pub struct EmojiDrawer {
    cache: HashMap<String, Arc<Bitmap>>,
}

impl EmojiDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_bitmaps(&self) -> usize {
        self.cache.len()
    }

    fn shape_options(ctx: &SetupContext<'_>) -> Option<EmojiShapeOptions> {
        let raw = ctx.options.shape.options.get(SHAPE_KEY)?;
        match serde_json::from_value(raw.clone()) {
            Ok(options) => Some(options),
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed emoji options");
                None
            }
        }
    }
}

impl ShapeDrawer for EmojiDrawer {
    fn init(&mut self, ctx: &mut SetupContext<'_>) -> Result<()> {
        if !ctx.options.shape.uses(SHAPE_KEY) {
            return Ok(());
        }

        ctx.assets.load_font(DEFAULT_EMOJI_FONT)?;
        if let Some(font) = Self::shape_options(ctx).and_then(|options| options.font) {
            ctx.assets.load_font(&font)?;
        }
        Ok(())
    }

    fn particle_init(&mut self, ctx: &mut SetupContext<'_>, particle: &mut Particle) -> Result<()> {
        let Some(options) = Self::shape_options(ctx) else {
            return Ok(());
        };
        let reduce_duplicates = ctx.options.reduce_duplicates;
        let Some(glyph) =
            item_from_single_or_multiple(&options.value, particle.id.0, reduce_duplicates, ctx.rng)
        else {
            return Ok(());
        };
        let font = options.font.as_deref().unwrap_or(DEFAULT_EMOJI_FONT);
        let key = format!("{glyph}_{font}");

        if let Some(bitmap) = self.cache.get(&key) {
            particle.attachments.insert(EmojiData {
                bitmap: Arc::clone(bitmap),
            });
            return Ok(());
        }

        let size = (ctx.options.size.max() * ctx.pixel_ratio * 2.0).ceil().max(1.0) as u32;
        let bitmap = Arc::new(ctx.assets.rasterize_glyph(glyph, font, size)?);
        tracing::debug!(%key, size, "emoji bitmap cached");
        self.cache.insert(key, Arc::clone(&bitmap));
        particle.attachments.insert(EmojiData { bitmap });
        Ok(())
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, data: &DrawData<'_>) {
        let Some(emoji) = data.particle.attachments.get::<EmojiData>() else {
            return;
        };
        let diameter = data.radius * 2.0;

        surface.set_global_alpha(data.opacity);
        surface.draw_image(&emoji.bitmap, -data.radius, -data.radius, diameter, diameter);
        surface.set_global_alpha(1.0);
    }

    fn particle_destroy(&mut self, particle: &mut Particle) {
        particle.attachments.remove::<EmojiData>();
    }

    fn destroy(&mut self) {
        for (_, bitmap) in self.cache.drain() {
            bitmap.close();
        }
    }
}
