//! SFF sprite archive decoding
//!
//! Handles both directory layouts (v1 linked PCX records, v2 flat records with
//! a palette directory), every pixel codec, the palette table with its remap
//! layer, an archive cache and a queue for creating renderer textures.
mod archive;
mod cache;
mod codec;
pub mod error;
mod palette;
mod parser;
mod texture;
mod types;
mod walker;

pub use archive::{PreloadRequest, Sff};
pub use cache::{CachedSff, SffCache, EXPIRY_LIMIT};
pub use error::SffError;
pub use palette::PaletteList;
pub use parser::{pack_color, parse_header};
pub use texture::{Renderer, TextureHandle, TextureQueue, TextureSender};
pub use types::*;
pub use walker::SpriteWalker;

/// Lazily walks the sprite directory of an archive whose header was already parsed.
///
/// v1 inline palettes are registered into `palettes` as the walk goes.
pub fn walk_sprites<'a>(
    bytes: &'a [u8],
    header: &'a Header,
    palettes: &'a mut PaletteList,
    character: bool,
) -> SpriteWalker<'a> {
    SpriteWalker::new(bytes, header, palettes, character)
}
