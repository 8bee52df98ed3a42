//! Sprite directory walk.
//!
//! Entries are kept in an arena addressed by directory index. Each step reads
//! one record, then resolves it: a share link borrows the data of an arena
//! entry, anything else is decoded.
use crate::{
    codec::{decode_pcx_rle, decode_v2_pixels},
    error::SffError,
    palette::PaletteList,
    parser::{
        clamped_slice, read_pcx_header, read_rgb_palette, read_sprite_record, SpriteRecord,
    },
    types::{
        Codec, Header, Sprite, SpritePixels, PCX_HEADER_LENGTH, PCX_PALETTE_LENGTH,
        V1_SPRITE_RECORD_LENGTH, V2_SPRITE_RECORD_LENGTH,
    },
};

use std::sync::Arc;

pub(crate) fn sprite_from_record(header: &Header, record: &SpriteRecord) -> Sprite {
    let mut sprite = Sprite::new();

    sprite.group = record.group;
    sprite.number = record.number;
    sprite.offset = record.offset;

    if !header.is_v1() {
        sprite.size = record.size;
        sprite.codec = Codec::from_v2_tag(record.codec_tag);
        sprite.color_depth = record.color_depth;
        sprite.pal_index = record.pal_index;
    }

    sprite
}

/// Offset of the record after the one at `record_offset`.
pub(crate) fn next_record_offset(header: &Header, record_offset: usize, record: &SpriteRecord) -> usize {
    if header.is_v1() {
        record.data_offset as usize
    } else {
        record_offset + V2_SPRITE_RECORD_LENGTH
    }
}

/// Context a v1 sprite needs from the walk so far.
pub(crate) struct V1Context<'a> {
    /// Palette index of the last sprite that carried data.
    pub prev_pal_index: Option<i32>,
    pub character: bool,
    pub palettes: &'a mut PaletteList,
}

/// Decodes a v1 PCX sprite, registering its inline palette if it has one.
///
/// In character mode the first sprite and sprite 0,0 keep their palette at
/// the very end of the data. Otherwise the palette follows the pixels unless
/// the record says it reuses the previous one.
pub(crate) fn decode_v1_sprite(
    bytes: &[u8],
    record_offset: usize,
    record: &SpriteRecord,
    sprite: &mut Sprite,
    ctx: V1Context<'_>,
) -> Result<(), SffError> {
    let data_start = record_offset + V1_SPRITE_RECORD_LENGTH;

    // only the last record's declared size is trusted
    let mut data_size = record.data_size as usize;
    if record.data_offset as usize > data_start {
        data_size = record.data_offset as usize - data_start;
    }

    let pcx = read_pcx_header(bytes, data_start)?;

    if pcx.bits_per_pixel != 8 {
        return Err(SffError::PcxColorDepth {
            depth: pcx.bits_per_pixel,
        });
    }

    sprite.size = pcx.size();

    let bytes_per_line = if pcx.encoding == 1 {
        pcx.bytes_per_line
    } else {
        0
    };
    sprite.codec = Codec::Pcx { bytes_per_line };

    let palette_same = record.palette_same && ctx.prev_pal_index.is_some();
    let own_palette_at_end = ctx.character
        && (ctx.prev_pal_index.is_none() || (record.group == 0 && record.number == 0));

    let palette_size = if own_palette_at_end || palette_same {
        0
    } else {
        PCX_PALETTE_LENGTH
    };

    let data_size = data_size.max(PCX_HEADER_LENGTH + palette_size);
    let px = clamped_slice(
        bytes,
        data_start + PCX_HEADER_LENGTH,
        data_size - PCX_HEADER_LENGTH - palette_size,
    );

    if palette_same {
        sprite.pal_index = ctx.prev_pal_index.unwrap_or(-1);

        if sprite.pal_index < 0 {
            let (idx, _) = ctx.palettes.new_pal();
            sprite.pal_index = idx as i32;
        }
    } else {
        let palette_offset = (data_start + data_size).saturating_sub(PCX_PALETTE_LENGTH);
        let colors = read_rgb_palette(bytes, palette_offset)?;

        let (idx, pal) = ctx.palettes.new_pal();
        *pal = colors;
        sprite.pal_index = idx as i32;
    }

    let pixels = decode_pcx_rle(
        px,
        sprite.size[0] as usize,
        sprite.size[1] as usize,
        bytes_per_line as usize,
    );
    sprite.pixels = Some(SpritePixels::Indexed(Arc::from(pixels)));

    Ok(())
}

/// Decodes a v2 sprite. Codec failures are logged and leave the sprite without pixels.
pub(crate) fn decode_v2_sprite(
    bytes: &[u8],
    record: &SpriteRecord,
    sprite: &mut Sprite,
) -> Result<(), SffError> {
    match decode_v2_pixels(bytes, record) {
        Ok(pixels) => {
            sprite.pixels = Some(pixels);
            Ok(())
        }
        Err(err) if err.is_sprite_local() => {
            log::warn!("{err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Lazy, single pass walk over the sprite directory.
///
/// The walk keeps directory state (the arena, the previous palette, the next
/// record offset) so it cannot be restarted; parse the archive again instead.
/// After a fatal error the error is yielded once and the walk ends.
pub struct SpriteWalker<'a> {
    bytes: &'a [u8],
    header: &'a Header,
    palettes: &'a mut PaletteList,
    character: bool,
    arena: Vec<Sprite>,
    record_offset: usize,
    prev: Option<usize>,
    failed: bool,
}

impl<'a> SpriteWalker<'a> {
    pub fn new(
        bytes: &'a [u8],
        header: &'a Header,
        palettes: &'a mut PaletteList,
        character: bool,
    ) -> Self {
        Self {
            bytes,
            header,
            palettes,
            character,
            arena: Vec::with_capacity(header.sprite_count as usize),
            record_offset: header.first_sprite_offset as usize,
            prev: None,
            failed: false,
        }
    }

    /// Directory index of the next sprite.
    pub fn index(&self) -> usize {
        self.arena.len()
    }

    fn step(&mut self) -> Result<Sprite, SffError> {
        let index = self.arena.len();
        let record_offset = self.record_offset;

        let record = read_sprite_record(self.bytes, self.header, record_offset)?;
        let mut sprite = sprite_from_record(self.header, &record);

        if record.is_link() {
            let link = record.link as usize;

            // the arena only holds entries before this one
            let Some(src) = self.arena.get(link) else {
                return Err(SffError::InvalidSpriteLink { index, link });
            };

            sprite.share_copy(src, link);
        } else {
            if self.header.is_v1() {
                let prev_pal_index = self.prev.map(|prev| self.arena[prev].pal_index);
                let ctx = V1Context {
                    prev_pal_index,
                    character: self.character,
                    palettes: &mut *self.palettes,
                };

                decode_v1_sprite(self.bytes, record_offset, &record, &mut sprite, ctx)?;
            } else {
                decode_v2_sprite(self.bytes, &record, &mut sprite)?;
            }

            self.prev = Some(index);
        }

        self.record_offset = next_record_offset(self.header, record_offset, &record);
        self.arena.push(sprite.clone());

        Ok(sprite)
    }
}

impl Iterator for SpriteWalker<'_> {
    type Item = Result<Sprite, SffError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.arena.len() >= self.header.sprite_count as usize {
            return None;
        }

        let res = self.step();
        self.failed = res.is_err();

        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            (self.header.sprite_count as usize).saturating_sub(self.arena.len())
        };

        (0, Some(remaining))
    }
}
