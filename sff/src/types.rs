use std::sync::{Arc, OnceLock};

use crate::texture::TextureHandle;

/// Number of selectable character palettes, addressed as group 1, number 1..=MAX_PAL_NO.
pub const MAX_PAL_NO: usize = 12;

/// 256 colors packed as `a << 24 | b << 16 | g << 8 | r`.
pub type PaletteColors = [u32; 256];

/// (group, number)
pub type SpriteKey = (i16, i16);

pub const SFF_MAGIC: &[u8; 12] = b"ElecbyteSpr\0";
pub const V1_SPRITE_RECORD_LENGTH: usize = 32;
pub const V2_SPRITE_RECORD_LENGTH: usize = 28;
pub const V2_PALETTE_RECORD_LENGTH: usize = 16;
pub const PCX_HEADER_LENGTH: usize = 128;
pub const PCX_PALETTE_LENGTH: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
    pub build: u8,
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    pub version: Version,
    pub first_sprite_offset: u32,
    pub sprite_count: u32,
    /// Always 0 for v1, palettes live inside the PCX data.
    pub first_palette_offset: u32,
    pub palette_count: u32,
    /// v2 base for data with flag bit 0 cleared, and for all palettes.
    pub literal_offset: u32,
    /// v2 base for data with flag bit 0 set.
    pub translated_offset: u32,
}

impl Header {
    pub fn is_v1(&self) -> bool {
        self.version.major == 1
    }
}

/// Pixel encoding declared by a directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// v1 PCX. `bytes_per_line == 0` means uncompressed.
    Pcx { bytes_per_line: u16 },
    Raw,
    Rle8,
    Rle5,
    Lz5,
    PngIndexed,
    PngTruecolor(u8),
    Unknown(u8),
}

impl Codec {
    pub fn from_v2_tag(tag: u8) -> Self {
        match tag {
            0 => Self::Raw,
            2 => Self::Rle8,
            3 => Self::Rle5,
            4 => Self::Lz5,
            10 => Self::PngIndexed,
            11 | 12 => Self::PngTruecolor(tag),
            tag => Self::Unknown(tag),
        }
    }
}

/// A truecolor image that skips the palette pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruecolorImage {
    pub width: u32,
    pub height: u32,
    /// Bits per pixel, 24 or 32.
    pub depth: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum SpritePixels {
    /// One palette index per pixel, `width * height` bytes.
    Indexed(Arc<[u8]>),
    Truecolor(Arc<TruecolorImage>),
}

impl SpritePixels {
    pub fn indexed(&self) -> Option<&[u8]> {
        match self {
            Self::Indexed(px) => Some(px),
            Self::Truecolor(_) => None,
        }
    }

    pub fn truecolor(&self) -> Option<&TruecolorImage> {
        match self {
            Self::Indexed(_) => None,
            Self::Truecolor(img) => Some(img),
        }
    }
}

/// Written once by the rendering context, shared between share-linked sprites.
pub type TextureSlot = Arc<OnceLock<TextureHandle>>;

#[derive(Debug, Clone)]
pub struct Sprite {
    pub group: i16,
    pub number: i16,
    /// [width, height]
    pub size: [u16; 2],
    /// Draw offset (axis)
    pub offset: [i16; 2],
    pub codec: Codec,
    pub color_depth: u8,
    /// Logical palette index, read through [`crate::PaletteList::get`]. -1 when unset.
    pub pal_index: i32,
    /// Own palette copy, takes precedence over `pal_index`.
    pub pal: Option<Arc<PaletteColors>>,
    pub pixels: Option<SpritePixels>,
    /// Directory index of the sprite whose pixels this one borrows.
    pub shared_from: Option<usize>,
    pub(crate) texture: TextureSlot,
}

impl Sprite {
    pub fn new() -> Self {
        Self {
            group: 0,
            number: 0,
            size: [0, 0],
            offset: [0, 0],
            codec: Codec::Raw,
            color_depth: 8,
            pal_index: -1,
            pal: None,
            pixels: None,
            shared_from: None,
            texture: TextureSlot::default(),
        }
    }

    pub fn key(&self) -> SpriteKey {
        (self.group, self.number)
    }

    pub fn width(&self) -> u32 {
        self.size[0] as u32
    }

    pub fn height(&self) -> u32 {
        self.size[1] as u32
    }

    /// Renderer texture, once the finalize task has run.
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture.get().copied()
    }

    /// Borrow another sprite's decoded data. The palette index is only taken
    /// over when this sprite does not declare its own.
    pub(crate) fn share_copy(&mut self, src: &Sprite, src_index: usize) {
        self.pal = src.pal.clone();
        self.pixels = src.pixels.clone();
        self.texture = src.texture.clone();
        self.size = src.size;
        if self.pal_index < 0 {
            self.pal_index = src.pal_index;
        }
        self.color_depth = src.color_depth;
        self.shared_from = Some(src_index);
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new()
    }
}
