//! Pixel decoders.
//!
//! Every decoder produces exactly `width * height` indices. Reads never go past
//! the end of the source: once the last byte is reached it keeps being returned,
//! so damaged data still decodes to something instead of failing the load.
use std::sync::Arc;

use crate::{
    error::SffError,
    parser::{clamped_slice, SpriteRecord},
    types::{Codec, SpritePixels, TruecolorImage},
};

/// Byte reader whose cursor sticks to the last byte.
struct ClampedReader<'a> {
    src: &'a [u8],
    i: usize,
    overrun: bool,
}

impl<'a> ClampedReader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            i: 0,
            overrun: false,
        }
    }

    fn peek(&self) -> u8 {
        self.src[self.i]
    }

    fn advance(&mut self) {
        if self.i + 1 < self.src.len() {
            self.i += 1;
        } else {
            self.overrun = true;
        }
    }

    fn next(&mut self) -> u8 {
        let res = self.peek();
        self.advance();
        res
    }

    /// A read was attempted past the last byte.
    fn overrun(&self) -> bool {
        self.overrun
    }
}

/// Copies `src` into a buffer of exactly `length` bytes, zero padded.
pub fn fit_to_length(src: &[u8], length: usize) -> Vec<u8> {
    let mut res = vec![0u8; length];
    let n = src.len().min(length);

    res[..n].copy_from_slice(&src[..n]);
    res
}

/// PCX run length encoding. A byte >= 0xc0 carries a count in its low 6 bits
/// and is followed by the value. Runs stop at the end of each scan line and
/// the padding past `width` is dropped.
pub fn decode_pcx_rle(src: &[u8], width: usize, height: usize, bytes_per_line: usize) -> Vec<u8> {
    if bytes_per_line == 0 {
        return fit_to_length(src, width * height);
    }

    let mut p = vec![0u8; width * height];
    if src.is_empty() {
        return p;
    }

    let mut reader = ClampedReader::new(src);
    let (mut j, mut k) = (0usize, 0usize);

    while j < p.len() {
        let mut n = 1usize;
        let mut d = reader.next();

        if d >= 0xc0 {
            n = (d & 0x3f) as usize;
            d = reader.next();
        }

        while n > 0 {
            if k < width && j < p.len() {
                p[j] = d;
                j += 1;
            }

            k += 1;

            if k == bytes_per_line {
                k = 0;
                n = 1;
            }

            n -= 1;
        }

        // stuck on a trailing zero-length run
        if reader.overrun() && reader.peek() == 0xc0 {
            break;
        }
    }

    p
}

/// RLE8: a byte with the top bits `01` is a count followed by the value,
/// anything else is a single pixel.
pub fn decode_rle8(src: &[u8], length: usize) -> Vec<u8> {
    let mut p = vec![0u8; length];
    if src.is_empty() {
        return p;
    }

    let mut reader = ClampedReader::new(src);
    let mut j = 0usize;

    while j < p.len() {
        let mut n = 1usize;
        let mut d = reader.next();

        if d & 0xc0 == 0x40 {
            n = (d & 0x3f) as usize;
            d = reader.next();
        }

        for _ in 0..n {
            if j < p.len() {
                p[j] = d;
                j += 1;
            }
        }

        // stuck on a trailing zero-length run
        if reader.overrun() && reader.peek() == 0x40 {
            break;
        }
    }

    p
}

/// RLE5: a run length byte, then a data length byte whose top bit announces an
/// explicit color byte. The following `data length` bytes each pack a 3 bit run
/// and a 5 bit color.
pub fn decode_rle5(src: &[u8], length: usize) -> Vec<u8> {
    let mut p = vec![0u8; length];
    if src.is_empty() {
        return p;
    }

    let mut reader = ClampedReader::new(src);
    let mut j = 0usize;

    while j < p.len() {
        let mut rl = reader.next() as i32;

        let data_length = reader.peek();
        let mut dl = (data_length & 0x7f) as i32;
        let mut c = 0u8;

        if data_length >> 7 != 0 {
            reader.advance();
            c = reader.peek();
        }

        reader.advance();

        loop {
            if j < p.len() {
                p[j] = c;
                j += 1;
            }

            rl -= 1;

            if rl < 0 {
                dl -= 1;

                if dl < 0 {
                    break;
                }

                let packed = reader.next();
                c = packed & 0x1f;
                rl = (packed >> 5) as i32;
            }
        }
    }

    p
}

/// LZ5. A control byte is read every 8 tokens, one bit per token: set for a
/// back reference, clear for a run of one value.
///
/// Short back references store the top 2 bits of their distance-carry in a
/// register; every fourth one takes its distance from that register instead of
/// the next byte. Copies go forward one byte at a time, so a reference may
/// overlap what it produces.
pub fn decode_lz5(src: &[u8], length: usize) -> Vec<u8> {
    let mut p = vec![0u8; length];
    if src.is_empty() {
        return p;
    }

    let mut reader = ClampedReader::new(src);
    let mut j = 0usize;

    let mut ct = reader.next();
    let mut cts = 0u32;
    let mut rb = 0u8;
    let mut rbc = 0u32;

    while j < p.len() {
        let mut d = reader.next() as usize;

        if ct & (1u8 << cts) != 0 {
            let n;

            if d & 0x3f == 0 {
                d = ((d << 2) | reader.next() as usize) + 1;
                n = reader.next() as usize + 2;
            } else {
                rb |= ((d & 0xc0) >> rbc) as u8;
                rbc += 2;
                n = d & 0x3f;

                if rbc < 8 {
                    d = reader.next() as usize + 1;
                } else {
                    d = rb as usize + 1;
                    rb = 0;
                    rbc = 0;
                }
            }

            for _ in 0..=n {
                if j < p.len() {
                    // reaching before the first pixel reads as 0
                    p[j] = if j >= d { p[j - d] } else { 0 };
                    j += 1;
                }
            }
        } else {
            let (n, value) = if d & 0xe0 == 0 {
                (reader.next() as usize + 8, d as u8)
            } else {
                (d >> 5, (d & 0x1f) as u8)
            };

            for _ in 0..n {
                if j < p.len() {
                    p[j] = value;
                    j += 1;
                }
            }
        }

        cts += 1;

        if cts >= 8 {
            ct = reader.next();
            cts = 0;
        }
    }

    p
}

/// Palette indices of an embedded indexed PNG, one byte per pixel.
pub fn decode_png_indexed(src: &[u8]) -> Result<(Vec<u8>, u32, u32), String> {
    let mut decoder = png::Decoder::new(src);
    decoder.set_transformations(png::Transformations::IDENTITY);

    let mut reader = decoder.read_info().map_err(|err| err.to_string())?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|err| err.to_string())?;

    if info.color_type != png::ColorType::Indexed {
        return Err(format!("expected indexed color, got {:?}", info.color_type));
    }

    let bits = info.bit_depth as usize;
    let (width, height) = (info.width as usize, info.height as usize);

    if bits == 8 {
        let pixels = buf
            .chunks(info.line_size)
            .take(height)
            .flat_map(|row| row.iter().take(width).copied())
            .collect();

        return Ok((pixels, info.width, info.height));
    }

    // 1, 2 and 4 bit images pack several indices per byte, most significant first
    let per_byte = 8 / bits;
    let mask = (1u8 << bits) - 1;

    let pixels = buf
        .chunks(info.line_size)
        .take(height)
        .flat_map(|row| {
            (0..width).map(move |x| {
                let byte = row[x / per_byte];
                let shift = 8 - bits * (x % per_byte + 1);
                (byte >> shift) & mask
            })
        })
        .collect();

    Ok((pixels, info.width, info.height))
}

/// An embedded PNG of any color type expanded to RGBA.
pub fn decode_png_truecolor(src: &[u8]) -> Result<TruecolorImage, String> {
    let img = image::load_from_memory_with_format(src, image::ImageFormat::Png)
        .map_err(|err| err.to_string())?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TruecolorImage {
        width,
        height,
        depth: 32,
        data: rgba.into_raw(),
    })
}

/// Decodes the data of a v2 sprite record.
///
/// Compressed and embedded formats start with a 4 byte uncompressed length, which is skipped.
pub fn decode_v2_pixels(bytes: &[u8], record: &SpriteRecord) -> Result<SpritePixels, SffError> {
    let SpriteRecord {
        group,
        number,
        size: [width, height],
        data_offset,
        data_size,
        codec_tag,
        color_depth,
        ..
    } = *record;

    let length = width as usize * height as usize;
    let offset = data_offset as usize;
    let packed = || clamped_slice(bytes, offset + 4, (data_size as usize).saturating_sub(4));
    let image_error = |message: String| SffError::ImageDecode {
        group,
        number,
        message,
    };

    let indexed = |px: Vec<u8>| SpritePixels::Indexed(Arc::from(px));

    match Codec::from_v2_tag(codec_tag) {
        Codec::Raw => {
            let data = clamped_slice(bytes, offset, data_size as usize);

            match color_depth {
                8 => Ok(indexed(fit_to_length(data, length))),
                24 | 32 => Ok(SpritePixels::Truecolor(Arc::new(TruecolorImage {
                    width: width as u32,
                    height: height as u32,
                    depth: color_depth,
                    data: data.to_vec(),
                }))),
                depth => Err(SffError::UnknownColorDepth {
                    depth,
                    group,
                    number,
                }),
            }
        }
        Codec::Rle8 => Ok(indexed(decode_rle8(packed(), length))),
        Codec::Rle5 => Ok(indexed(decode_rle5(packed(), length))),
        Codec::Lz5 => Ok(indexed(decode_lz5(packed(), length))),
        Codec::PngIndexed => {
            let src = bytes.get(offset + 4..).unwrap_or_default();
            let (px, _, _) = decode_png_indexed(src).map_err(image_error)?;

            Ok(indexed(fit_to_length(&px, length)))
        }
        Codec::PngTruecolor(_) => {
            let src = bytes.get(offset + 4..).unwrap_or_default();
            let img = decode_png_truecolor(src).map_err(image_error)?;

            Ok(SpritePixels::Truecolor(Arc::new(img)))
        }
        // v2 has no PCX tag, from_v2_tag never produces it
        Codec::Pcx { .. } | Codec::Unknown(_) => Err(SffError::UnknownCodec {
            tag: codec_tag,
            group,
            number,
        }),
    }
}
