//! Bundled shape drawers.

mod circle;
mod emoji;
mod square;

pub use circle::CircleDrawer;
pub use emoji::{EmojiData, EmojiDrawer, EmojiShapeOptions, DEFAULT_EMOJI_FONT};
pub use square::SquareDrawer;
