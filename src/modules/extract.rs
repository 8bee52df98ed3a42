use eyre::eyre;
use image::{DynamicImage, RgbImage, RgbaImage};
use palfx::{get_fx_pal, PalFx, PalFxDef};
use sff::{Sff, SpritePixels};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Canonical palette number (group 1) to draw indexed sprites with.
    pub palette: Option<i16>,
    pub fx: Option<PalFxDef>,
    /// Ticks the effect runs before the frame is taken.
    pub ticks: u32,
}

fn unpack_color(c: u32) -> image::Rgba<u8> {
    image::Rgba([c as u8, (c >> 8) as u8, (c >> 16) as u8, (c >> 24) as u8])
}

/// Renders sprite `group`, `number` to RGBA.
///
/// Indexed sprites go through the archive's palette table and the optional
/// effect. Truecolor sprites are taken as they are.
pub fn sprite_to_rgba(
    sff: &Sff,
    group: i16,
    number: i16,
    options: &ExtractOptions,
) -> eyre::Result<RgbaImage> {
    let Some(sprite) = sff.get_sprite(group, number) else {
        return Err(eyre!("Cannot find sprite {},{}", group, number));
    };

    let Some(pixels) = &sprite.pixels else {
        return Err(eyre!("Sprite {},{} has no pixel data", group, number));
    };

    let indices = match pixels {
        SpritePixels::Indexed(indices) => indices,
        SpritePixels::Truecolor(img) => {
            let res = match img.depth {
                32 => RgbaImage::from_raw(img.width, img.height, img.data.clone()),
                _ => RgbImage::from_raw(img.width, img.height, img.data.clone())
                    .map(|rgb| DynamicImage::ImageRgb8(rgb).to_rgba8()),
            };

            return res.ok_or_else(|| {
                eyre!("Sprite {},{} has a short image buffer", group, number)
            });
        }
    };

    // a remapped copy, the archive keeps its own palette mapping
    let mut palettes = sff.palettes.clone();

    if let Some(pal_no) = options.palette {
        let Some(slot) = palettes.lookup((1, pal_no)) else {
            return Err(eyre!("Cannot find palette 1,{}", pal_no));
        };

        let Ok(pal_index) = usize::try_from(sprite.pal_index) else {
            return Err(eyre!("Sprite {},{} has no palette", group, number));
        };

        if !palettes.remap(pal_index, slot) {
            return Err(eyre!("Cannot select palette 1,{}", pal_no));
        }
    }

    let Some(pal) = sprite.get_pal(&palettes) else {
        return Err(eyre!("Sprite {},{} has no palette", group, number));
    };

    let global = PalFx::new();
    let fx = options.fx.as_ref().map(|def| {
        let mut fx = PalFx::from_def(def.clone());

        for _ in 0..options.ticks {
            fx.step(true);
        }

        // effective values for the frame being drawn
        fx.step(false);
        fx
    });

    let pal = get_fx_pal(fx.as_ref(), pal.as_slice(), false, &global);

    let (width, height) = (sprite.width(), sprite.height());
    let res = RgbaImage::from_fn(width, height, |x, y| {
        let index = indices
            .get((y * width + x) as usize)
            .copied()
            .unwrap_or_default();

        unpack_color(pal[index as usize])
    });

    Ok(res)
}
