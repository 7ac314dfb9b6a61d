use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{ParticleError, Result};

/// Off-screen image produced at setup time and blitted by drawers.
///
/// The core never reads pixels back, so a bitmap only carries what the
/// drawing surface needs to identify it.
pub struct Bitmap {
    key: String,
    width: u32,
    height: u32,
    closed: AtomicBool,
    releases: Arc<AtomicUsize>,
}

impl Bitmap {
    pub fn new(key: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            key: key.into(),
            width,
            height,
            closed: AtomicBool::new(false),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Releases the bitmap. Returns `false` if it had already been released.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        if first {
            self.releases.fetch_add(1, Ordering::AcqRel);
        } else {
            tracing::warn!(key = %self.key, "bitmap released more than once");
        }
        first
    }

    fn with_release_counter(mut self, releases: Arc<AtomicUsize>) -> Self {
        self.releases = releases;
        self
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Renders a text glyph into an off-screen bitmap.
pub trait GlyphRasterizer {
    fn rasterize(&mut self, glyph: &str, font: &str, size: u32) -> Result<Bitmap>;
}

/// Rasterizer that produces empty bitmaps of the requested size, for headless
/// runs where nothing is ever presented.
#[derive(Debug, Default)]
pub struct BlankRasterizer;

impl GlyphRasterizer for BlankRasterizer {
    fn rasterize(&mut self, glyph: &str, font: &str, size: u32) -> Result<Bitmap> {
        Ok(Bitmap::new(format!("{glyph}_{font}"), size, size))
    }
}

/// Fonts and off-screen rendering available to drawers during setup.
#[derive(Default)]
pub struct AssetStore {
    fonts: HashSet<String>,
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
    releases: Arc<AtomicUsize>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a rasterizer and no registered fonts.
    pub fn with_rasterizer(rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        Self {
            rasterizer: Some(rasterizer),
            ..Self::default()
        }
    }

    /// Makes a font family available to [`AssetStore::load_font`].
    pub fn register_font(&mut self, family: impl Into<String>) {
        self.fonts.insert(normalise_family(&family.into()));
    }

    /// Resolves a CSS-style font stack. Succeeds when at least one family in
    /// the stack is registered.
    pub fn load_font(&self, stack: &str) -> Result<()> {
        let available = stack
            .split(',')
            .map(normalise_family)
            .any(|family| self.fonts.contains(&family));

        if available {
            tracing::debug!(font = stack, "font loaded");
            Ok(())
        } else {
            Err(ParticleError::resource(
                format!("font `{stack}`"),
                "no family in the stack is registered",
            ))
        }
    }

    pub fn rasterize_glyph(&mut self, glyph: &str, font: &str, size: u32) -> Result<Bitmap> {
        let releases = self.releases.clone();
        let rasterizer = self.rasterizer.as_mut().ok_or_else(|| {
            ParticleError::resource(format!("glyph `{glyph}`"), "no off-screen rasterizer")
        })?;
        Ok(rasterizer
            .rasterize(glyph, font, size)?
            .with_release_counter(releases))
    }

    /// Number of bitmaps created through this store that have been released.
    pub fn released_bitmaps(&self) -> usize {
        self.releases.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStore")
            .field("fonts", &self.fonts)
            .field("rasterizer", &self.rasterizer.is_some())
            .finish()
    }
}

fn normalise_family(family: &str) -> String {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_registered_font_stacks() {
        let mut store = AssetStore::new();
        store.register_font("Noto Color Emoji");

        assert!(store
            .load_font(r#""Twemoji Mozilla", "Noto Color Emoji""#)
            .is_ok());
    }

    #[test]
    fn errors_on_missing_fonts() {
        let store = AssetStore::new();
        let err = store.load_font("Missing Sans").unwrap_err();
        assert!(format!("{err}").contains("Missing Sans"));
    }

    #[test]
    fn rasterizing_without_backend_fails() {
        let mut store = AssetStore::new();
        assert!(matches!(
            store.rasterize_glyph("*", "serif", 8),
            Err(ParticleError::ResourceLoad { .. })
        ));
    }

    #[test]
    fn counts_each_release_once() {
        let mut store = AssetStore::with_rasterizer(Box::new(BlankRasterizer));
        let bitmap = store.rasterize_glyph("*", "serif", 8).unwrap();

        assert!(bitmap.close());
        assert!(!bitmap.close());
        assert!(bitmap.is_closed());
        assert_eq!(store.released_bitmaps(), 1);
    }
}
