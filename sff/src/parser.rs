use nom::{
    bytes::complete::take,
    combinator::map,
    multi::count,
    number::complete::{le_i16, le_u16, le_u32, le_u8},
    IResult as _IResult, Parser,
};

use crate::{
    error::SffError,
    types::{Header, PaletteColors, Version, SFF_MAGIC, V2_SPRITE_RECORD_LENGTH},
};

pub type IResult<'a, T> = _IResult<&'a [u8], T>;

/// Runs a parser on the data starting at `offset`, turning any failure into a
/// [`SffError::ParseError`] that remembers where it happened.
pub fn parse_at<'a, T>(
    bytes: &'a [u8],
    offset: usize,
    what: &'static str,
    parser: impl Fn(&'a [u8]) -> IResult<'a, T>,
) -> Result<T, SffError> {
    let input = bytes.get(offset..).unwrap_or_default();

    parser(input)
        .map(|(_, res)| res)
        .map_err(|_| SffError::ParseError { what, offset })
}

/// Slice of the archive clamped to its end.
pub fn clamped_slice(bytes: &[u8], offset: usize, length: usize) -> &[u8] {
    let start = offset.min(bytes.len());
    let end = offset.saturating_add(length).min(bytes.len());

    &bytes[start..end]
}

pub fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32
}

fn parse_version(i: &'_ [u8]) -> IResult<'_, Version> {
    // stored back to front, followed by 4 reserved bytes
    map(
        (le_u8, le_u8, le_u8, le_u8, le_u32),
        |(build, revision, minor, major, _)| Version {
            major,
            minor,
            revision,
            build,
        },
    )
    .parse(i)
}

fn parse_preamble(i: &'_ [u8]) -> IResult<'_, (&'_ [u8], Version)> {
    (take(12usize), parse_version).parse(i)
}

fn parse_v1_directory(i: &'_ [u8]) -> IResult<'_, (u32, u32)> {
    map(
        (le_u32, le_u32, le_u32),
        |(sprite_count, first_sprite_offset, _)| (sprite_count, first_sprite_offset),
    )
    .parse(i)
}

fn parse_v2_directory(i: &'_ [u8]) -> IResult<'_, [u32; 6]> {
    map(
        (
            take(16usize),
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
            le_u32,
        ),
        |(
            _,
            first_sprite_offset,
            sprite_count,
            first_palette_offset,
            palette_count,
            literal_offset,
            _,
            translated_offset,
        )| {
            [
                first_sprite_offset,
                sprite_count,
                first_palette_offset,
                palette_count,
                literal_offset,
                translated_offset,
            ]
        },
    )
    .parse(i)
}

pub fn parse_header(bytes: &[u8]) -> Result<Header, SffError> {
    let (magic, version) = parse_at(bytes, 0, "header", parse_preamble)?;

    if magic != SFF_MAGIC {
        return Err(SffError::UnknownMagic {
            magic: magic.to_vec(),
        });
    }

    // magic + version + reserved
    let directory_offset = 20;

    match version.major {
        1 => {
            let (sprite_count, first_sprite_offset) =
                parse_at(bytes, directory_offset, "v1 header", parse_v1_directory)?;

            Ok(Header {
                version,
                first_sprite_offset,
                sprite_count,
                first_palette_offset: 0,
                palette_count: 0,
                literal_offset: 0,
                translated_offset: 0,
            })
        }
        2 => {
            let [first_sprite_offset, sprite_count, first_palette_offset, palette_count, literal_offset, translated_offset] =
                parse_at(bytes, directory_offset, "v2 header", parse_v2_directory)?;

            Ok(Header {
                version,
                first_sprite_offset,
                sprite_count,
                first_palette_offset,
                palette_count,
                literal_offset,
                translated_offset,
            })
        }
        _ => Err(SffError::UnknownVersion {
            major: version.major,
            minor: version.minor,
            revision: version.revision,
            build: version.build,
        }),
    }
}

/// One sprite directory record before its data is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRecord {
    pub group: i16,
    pub number: i16,
    /// v2 only, v1 sizes come from the PCX header.
    pub size: [u16; 2],
    pub offset: [i16; 2],
    pub link: u16,
    /// v1: the offset of the next record. v2: absolute data offset.
    pub data_offset: u32,
    pub data_size: u32,
    pub codec_tag: u8,
    pub color_depth: u8,
    /// -1 for v1, which discovers its palette while decoding.
    pub pal_index: i32,
    /// v1 "same palette as previous" byte.
    pub palette_same: bool,
}

impl SpriteRecord {
    pub fn is_link(&self) -> bool {
        self.data_size == 0
    }
}

pub fn parse_v1_sprite_record(i: &'_ [u8]) -> IResult<'_, SpriteRecord> {
    map(
        (
            le_u32, le_u32, le_i16, le_i16, le_i16, le_i16, le_u16, le_u8,
        ),
        |(next, data_size, x, y, group, number, link, palette_same)| SpriteRecord {
            group,
            number,
            size: [0, 0],
            offset: [x, y],
            link,
            data_offset: next,
            data_size,
            codec_tag: 0,
            color_depth: 8,
            pal_index: -1,
            palette_same: palette_same != 0,
        },
    )
    .parse(i)
}

pub fn parse_v2_sprite_record<'a>(
    i: &'a [u8],
    literal_offset: u32,
    translated_offset: u32,
) -> IResult<'a, SpriteRecord> {
    map(
        (
            le_i16, le_i16, le_u16, le_u16, le_i16, le_i16, le_u16, le_u8, le_u8, le_u32, le_u32,
            le_u16, le_u16,
        ),
        |(
            group,
            number,
            width,
            height,
            x,
            y,
            link,
            codec_tag,
            color_depth,
            data_offset,
            data_size,
            pal_index,
            flags,
        )| {
            let base = if flags & 1 == 0 {
                literal_offset
            } else {
                translated_offset
            };

            SpriteRecord {
                group,
                number,
                size: [width, height],
                offset: [x, y],
                link,
                data_offset: data_offset.wrapping_add(base),
                data_size,
                codec_tag,
                color_depth,
                pal_index: pal_index as i32,
                palette_same: false,
            }
        },
    )
    .parse(i)
}

/// Reads the sprite record at `offset` for either layout.
pub fn read_sprite_record(
    bytes: &[u8],
    header: &Header,
    offset: usize,
) -> Result<SpriteRecord, SffError> {
    if header.is_v1() {
        parse_at(bytes, offset, "sprite record", parse_v1_sprite_record)
    } else {
        parse_at(bytes, offset, "sprite record", |i| {
            parse_v2_sprite_record(i, header.literal_offset, header.translated_offset)
        })
    }
}

/// Offset of the v2 sprite record `index`.
pub fn v2_sprite_record_offset(header: &Header, index: usize) -> usize {
    header.first_sprite_offset as usize + index * V2_SPRITE_RECORD_LENGTH
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteRecord {
    pub group: i16,
    pub number: i16,
    pub color_count: i16,
    pub link: u16,
    /// Relative to [`Header::literal_offset`].
    pub data_offset: u32,
    pub data_size: u32,
}

pub fn parse_palette_record(i: &'_ [u8]) -> IResult<'_, PaletteRecord> {
    map(
        (le_i16, le_i16, le_i16, le_u16, le_u32, le_u32),
        |(group, number, color_count, link, data_offset, data_size)| PaletteRecord {
            group,
            number,
            color_count,
            link,
            data_offset,
            data_size,
        },
    )
    .parse(i)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcxHeader {
    pub encoding: u8,
    pub bits_per_pixel: u8,
    /// xmin, ymin, xmax, ymax
    pub window: [u16; 4],
    pub bytes_per_line: u16,
}

impl PcxHeader {
    pub fn size(&self) -> [u16; 2] {
        [
            self.window[2]
                .wrapping_sub(self.window[0])
                .wrapping_add(1),
            self.window[3]
                .wrapping_sub(self.window[1])
                .wrapping_add(1),
        ]
    }
}

fn parse_pcx_window(i: &'_ [u8]) -> IResult<'_, (u8, u8, [u16; 4])> {
    map(
        (take(2usize), le_u8, le_u8, le_u16, le_u16, le_u16, le_u16),
        |(_, encoding, bits_per_pixel, x0, y0, x1, y1)| (encoding, bits_per_pixel, [x0, y0, x1, y1]),
    )
    .parse(i)
}

fn parse_u16(i: &'_ [u8]) -> IResult<'_, u16> {
    le_u16(i)
}

pub fn read_pcx_header(bytes: &[u8], offset: usize) -> Result<PcxHeader, SffError> {
    let (encoding, bits_per_pixel, window) =
        parse_at(bytes, offset, "pcx header", parse_pcx_window)?;
    let bytes_per_line = parse_at(bytes, offset + 66, "pcx bytes per line", parse_u16)?;

    Ok(PcxHeader {
        encoding,
        bits_per_pixel,
        window,
        bytes_per_line,
    })
}

/// v1 palettes: 256 RGB triplets, index 0 is transparent.
pub fn read_rgb_palette(bytes: &[u8], offset: usize) -> Result<PaletteColors, SffError> {
    let colors = parse_at(bytes, offset, "pcx palette", |i| {
        count(map(take(3usize), |c: &[u8]| [c[0], c[1], c[2]]), 256).parse(i)
    })?;

    let mut pal = [0u32; 256];
    colors.iter().enumerate().for_each(|(idx, [r, g, b])| {
        let alpha = if idx == 0 { 0 } else { 255 };
        pal[idx] = pack_color(*r, *g, *b, alpha);
    });

    Ok(pal)
}

/// v2 palettes: up to 256 RGBA quads. Version x.0 archives carry no usable
/// alpha, so it is rebuilt with index 0 transparent.
pub fn read_rgba_palette(
    bytes: &[u8],
    offset: usize,
    data_size: u32,
    rebuild_alpha: bool,
) -> Result<PaletteColors, SffError> {
    let color_count = (data_size as usize / 4).min(256);

    let colors = parse_at(bytes, offset, "palette data", |i| {
        count(
            map(take(4usize), |c: &[u8]| [c[0], c[1], c[2], c[3]]),
            color_count,
        )
        .parse(i)
    })?;

    let mut pal = [0u32; 256];
    colors.iter().enumerate().for_each(|(idx, [r, g, b, a])| {
        let alpha = match (rebuild_alpha, idx) {
            (false, _) => *a,
            (true, 0) => 0,
            (true, _) => 255,
        };
        pal[idx] = pack_color(*r, *g, *b, alpha);
    });

    Ok(pal)
}
