use std::fmt::{self, Write};

use sff::{Codec, Sff, SpritePixels};

fn codec_name(codec: &Codec) -> String {
    match codec {
        Codec::Pcx { bytes_per_line: 0 } => "pcx (raw)".to_string(),
        Codec::Pcx { .. } => "pcx".to_string(),
        Codec::Raw => "raw".to_string(),
        Codec::Rle8 => "rle8".to_string(),
        Codec::Rle5 => "rle5".to_string(),
        Codec::Lz5 => "lz5".to_string(),
        Codec::PngIndexed => "png".to_string(),
        Codec::PngTruecolor(tag) => format!("png{tag}"),
        Codec::Unknown(tag) => format!("unknown ({tag})"),
    }
}

/// Header and one line per sprite, ordered by group then number.
pub fn sff_summary(sff: &Sff) -> Result<String, fmt::Error> {
    let mut res = String::new();
    let version = sff.header.version;

    writeln!(
        res,
        "version {}.{}.{}.{}",
        version.major, version.minor, version.revision, version.build
    )?;
    writeln!(
        res,
        "{} sprites, {} palette records",
        sff.header.sprite_count, sff.header.palette_count
    )?;

    if !sff.selectable_palettes().is_empty() {
        writeln!(res, "selectable palettes: {:?}", sff.selectable_palettes())?;
    }

    let mut sprites = sff.sprites().collect::<Vec<_>>();
    sprites.sort_by_key(|sprite| sprite.key());

    for sprite in sprites {
        write!(
            res,
            "{},{} {}x{} axis {},{} {}",
            sprite.group,
            sprite.number,
            sprite.width(),
            sprite.height(),
            sprite.offset[0],
            sprite.offset[1],
            codec_name(&sprite.codec),
        )?;

        match &sprite.pixels {
            Some(SpritePixels::Indexed(_)) => write!(res, " pal {}", sprite.pal_index)?,
            Some(SpritePixels::Truecolor(img)) => write!(res, " {}bpp", img.depth)?,
            None => write!(res, " (no pixels)")?,
        }

        if let Some(index) = sprite.shared_from {
            write!(res, " -> #{index}")?;
        }

        writeln!(res)?;
    }

    Ok(res)
}
