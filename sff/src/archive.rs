use std::{
    collections::{HashMap, HashSet},
    ffi::OsStr,
    path::Path,
    sync::Arc,
};

use crate::{
    error::SffError,
    palette::PaletteList,
    parser::{
        parse_at, parse_header, parse_palette_record, read_rgba_palette, read_sprite_record,
        PaletteRecord,
    },
    texture::{queue_unique, TextureSender},
    types::{Header, PaletteColors, Sprite, SpriteKey, MAX_PAL_NO, V2_PALETTE_RECORD_LENGTH},
    walker::{
        decode_v1_sprite, decode_v2_sprite, next_record_offset, sprite_from_record, SpriteWalker,
        V1Context,
    },
};

/// A parsed sprite archive.
///
/// Cloning is shallow: pixel and palette buffers are shared, the remap layer
/// of [`Sff::palettes`] is not.
#[derive(Debug, Clone)]
pub struct Sff {
    pub header: Header,
    sprites: HashMap<SpriteKey, Sprite>,
    pub palettes: PaletteList,
    selectable_palettes: Vec<i32>,
    filename: String,
}

impl Default for Sff {
    fn default() -> Self {
        Self::new()
    }
}

/// Which sprites a partial load decodes.
#[derive(Debug, Clone, Default)]
pub struct PreloadRequest {
    pub targets: HashSet<SpriteKey>,
    /// Stop after this many targets were loaded. Defaults to the number of targets.
    pub budget: Option<usize>,
}

impl PreloadRequest {
    pub fn new(targets: impl IntoIterator<Item = SpriteKey>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }
}

impl Sprite {
    /// The palette this sprite draws with: its own copy if it has one,
    /// otherwise `palettes` at its palette index. Truecolor sprites have none.
    pub fn get_pal(&self, palettes: &PaletteList) -> Option<Arc<PaletteColors>> {
        if self.pal.is_some() || self.color_depth > 8 {
            return self.pal.clone();
        }

        palettes
            .get(usize::try_from(self.pal_index).ok()?)
            .cloned()
    }
}

/// Palette records are 16 bytes each, data is relative to the literal base.
fn read_palette_record(
    bytes: &[u8],
    header: &Header,
    index: usize,
) -> Result<PaletteRecord, SffError> {
    let offset = header.first_palette_offset as usize + index * V2_PALETTE_RECORD_LENGTH;
    parse_at(bytes, offset, "palette record", parse_palette_record)
}

/// 2.0.0 archives have no usable palette alpha.
fn rebuilds_alpha(header: &Header) -> bool {
    header.version.revision == 0
}

fn read_palette_data(
    bytes: &[u8],
    header: &Header,
    record: &PaletteRecord,
) -> Result<PaletteColors, SffError> {
    read_rgba_palette(
        bytes,
        header.literal_offset as usize + record.data_offset as usize,
        record.data_size,
        rebuilds_alpha(header),
    )
}

/// Walks the v2 palette directory into `palettes`.
///
/// Duplicated (group, number) pairs reuse the first slot. Empty records alias
/// the slot they link to. The canonical (1, n) entries are then adjusted the
/// way older tools expect: a canonical slot shared with an unrelated palette
/// is marked unresolved (-1), and canonical numbers past the palette count
/// are dropped.
fn read_palette_directory(
    bytes: &[u8],
    header: &Header,
    palettes: &mut PaletteList,
    filename: &str,
) -> Result<(), SffError> {
    let palette_count = header.palette_count as usize;
    let mut unique_pals: HashMap<SpriteKey, usize> = HashMap::new();

    for i in 0..palette_count {
        let record = read_palette_record(bytes, header, i)?;
        let key = (record.group, record.number);

        let (idx, pal) = if let Some(&old) = unique_pals.get(&key) {
            log::warn!(
                "{} duplicated palette: {},{} ({}/{})",
                filename,
                record.group,
                record.number,
                i + 1,
                palette_count
            );

            (old, palettes.get(old).cloned())
        } else if record.data_size == 0 {
            let link = record.link as usize;
            (link, palettes.get(link).cloned())
        } else {
            (i, Some(Arc::new(read_palette_data(bytes, header, &record)?)))
        };

        let Some(pal) = pal else {
            return Err(SffError::InvalidPaletteLink {
                index: i,
                link: idx,
            });
        };

        unique_pals.insert(key, idx);
        palettes.set_source(i, pal);
        palettes.pal_table.insert(key, idx as i32);
        palettes.numcols.insert(key, record.color_count as i32);

        if i <= MAX_PAL_NO {
            let canonical = (1, (i + 1) as i16);
            let canonical_idx = palettes.pal_table.get(&canonical).copied().unwrap_or(0);

            if canonical_idx == idx as i32 && record.group != 1 && record.number != (i + 1) as i16
            {
                log::debug!(
                    "{} palette {},{} takes canonical slot {}",
                    filename,
                    record.group,
                    record.number,
                    i + 1
                );
                palettes.pal_table.insert(canonical, -1);
            }

            if i + 1 == palette_count {
                for j in (i + 1)..MAX_PAL_NO {
                    palettes.pal_table.remove(&(1, (j + 1) as i16));
                }
            }
        }
    }

    Ok(())
}

/// Canonical palette numbers (group 1, 1..=MAX_PAL_NO) in directory order.
fn read_selectable_palettes(bytes: &[u8], header: &Header) -> Result<Vec<i32>, SffError> {
    let mut res = vec![];

    for i in 0..header.palette_count as usize {
        let record = read_palette_record(bytes, header, i)?;

        if record.group == 1 && record.number >= 1 && record.number as usize <= MAX_PAL_NO {
            res.push(record.number as i32);
        }

        if res.len() >= MAX_PAL_NO {
            break;
        }
    }

    Ok(res)
}

/// Follows a palette link chain from `start` to a record that has data.
///
/// A record linking to itself ends the chain with an empty palette.
fn read_linked_palette(
    bytes: &[u8],
    header: &Header,
    start: usize,
) -> Result<PaletteColors, SffError> {
    let mut current = start;

    for _ in 0..=header.palette_count {
        let record = read_palette_record(bytes, header, current)?;

        if record.data_size != 0 {
            return read_palette_data(bytes, header, &record);
        }

        if record.link as usize == current {
            return Ok([0u32; 256]);
        }

        current = record.link as usize;
    }

    Err(SffError::InvalidPaletteLink {
        index: start,
        link: current,
    })
}

impl Sff {
    /// An empty archive with the canonical palette slots in place.
    pub fn new() -> Self {
        Self {
            header: Header::default(),
            sprites: HashMap::new(),
            palettes: PaletteList::with_canonical_slots(),
            selectable_palettes: vec![],
            filename: String::new(),
        }
    }

    /// Parses a whole archive.
    ///
    /// `character` makes the first v1 sprite (and sprite 0,0) read its palette
    /// from the end of its data, and collects the selectable palettes of v2 archives.
    pub fn open_from_bytes(bytes: &[u8], character: bool) -> Result<Self, SffError> {
        let mut sff = Self::new();
        sff.read(bytes, character)?;

        Ok(sff)
    }

    pub fn open_from_file(
        path: impl AsRef<OsStr> + AsRef<Path>,
        character: bool,
    ) -> Result<Self, SffError> {
        let bytes = std::fs::read(&path)?;

        let mut sff = Self::new();
        sff.filename = AsRef::<Path>::as_ref(&path).display().to_string();
        sff.read(&bytes, character)?;

        Ok(sff)
    }

    fn read(&mut self, bytes: &[u8], character: bool) -> Result<(), SffError> {
        self.header = parse_header(bytes)?;

        if !self.header.is_v1() {
            read_palette_directory(bytes, &self.header, &mut self.palettes, &self.filename)?;

            if character {
                self.selectable_palettes = read_selectable_palettes(bytes, &self.header)?;
            }
        }

        let walker = SpriteWalker::new(bytes, &self.header, &mut self.palettes, character);

        for sprite in walker {
            let sprite = sprite?;

            // first one wins
            self.sprites.entry(sprite.key()).or_insert(sprite);
        }

        Ok(())
    }

    /// Decodes only the requested sprites, each with its own palette copy.
    ///
    /// Also returns the selectable palette numbers of v2 character archives.
    pub fn preload_from_bytes(
        bytes: &[u8],
        character: bool,
        request: &PreloadRequest,
    ) -> Result<(Self, Vec<i32>), SffError> {
        let mut sff = Self::new();
        let header = parse_header(bytes)?;

        // v1 palettes found along the way
        let mut inline_palettes = PaletteList::new();
        let mut arena: Vec<Sprite> = Vec::with_capacity(header.sprite_count as usize);
        let mut loaded: HashSet<usize> = HashSet::new();
        let mut prev: Option<usize> = None;
        let mut remaining = request.budget.unwrap_or(request.targets.len());
        let mut record_offset = header.first_sprite_offset as usize;

        for index in 0..header.sprite_count as usize {
            let record = read_sprite_record(bytes, &header, record_offset)?;
            let mut sprite = sprite_from_record(&header, &record);
            let key = sprite.key();
            let targeted = request.targets.contains(&key);

            if targeted || (prev.is_none() && sprite.pal_index < 0) {
                let fresh = targeted && !sff.sprites.contains_key(&key);

                if record.is_link() {
                    let link = record.link as usize;

                    if link >= index {
                        return Err(SffError::InvalidSpriteLink { index, link });
                    }

                    if loaded.contains(&link) {
                        let src = &arena[link];
                        sprite.share_copy(src, link);
                        sprite.pal_index = src.pal_index;
                    } else {
                        log::warn!(
                            "Sprite {},{} links to sprite {}, which was not preloaded",
                            sprite.group,
                            sprite.number,
                            link
                        );
                        sprite.pal_index = 0;
                    }
                } else {
                    if header.is_v1() {
                        let ctx = V1Context {
                            prev_pal_index: prev.map(|prev| arena[prev].pal_index),
                            character,
                            palettes: &mut inline_palettes,
                        };

                        decode_v1_sprite(bytes, record_offset, &record, &mut sprite, ctx)?;
                    } else {
                        decode_v2_sprite(bytes, &record, &mut sprite)?;
                    }

                    if fresh {
                        if header.is_v1() {
                            sprite.pal = usize::try_from(sprite.pal_index)
                                .ok()
                                .and_then(|idx| inline_palettes.get(idx))
                                .cloned();

                            if sprite.pal_index >= MAX_PAL_NO as i32 {
                                sprite.pal_index = 0;
                            }
                        } else if sprite.color_depth <= 8 {
                            let pal = read_linked_palette(bytes, &header, sprite.pal_index as usize)?;
                            sprite.pal = Some(Arc::new(pal));
                            sprite.pal_index = 0;
                        }
                    }

                    if prev.is_none() {
                        prev = Some(index);
                    }
                }

                loaded.insert(index);

                if fresh {
                    sff.sprites.insert(key, sprite.clone());

                    if remaining > 0 {
                        remaining -= 1;

                        if remaining == 0 {
                            break;
                        }
                    }
                }
            }

            record_offset = next_record_offset(&header, record_offset, &record);
            arena.push(sprite);
        }

        let selectable = if !header.is_v1() && character {
            read_selectable_palettes(bytes, &header)?
        } else {
            vec![]
        };

        sff.header = header;
        sff.selectable_palettes = selectable.clone();

        Ok((sff, selectable))
    }

    pub fn preload_from_file(
        path: impl AsRef<OsStr> + AsRef<Path>,
        character: bool,
        request: &PreloadRequest,
    ) -> Result<(Self, Vec<i32>), SffError> {
        let bytes = std::fs::read(&path)?;

        let (mut sff, selectable) = Self::preload_from_bytes(&bytes, character, request)?;
        sff.filename = AsRef::<Path>::as_ref(&path).display().to_string();

        Ok((sff, selectable))
    }

    /// Group -1 never matches anything.
    pub fn get_sprite(&self, group: i16, number: i16) -> Option<&Sprite> {
        if group == -1 {
            return None;
        }

        self.sprites.get(&(group, number))
    }

    /// A copy of the sprite that owns a copy of its current palette from `palettes`.
    pub fn get_own_pal_sprite(
        &self,
        group: i16,
        number: i16,
        palettes: &PaletteList,
    ) -> Option<Sprite> {
        let sprite = self.get_sprite(group, number)?;
        let pal = sprite.get_pal(palettes);

        let mut res = sprite.clone();
        res.pal = pal.map(|pal| Arc::new(*pal));

        Some(res)
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.values()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Group 1 palette numbers present in a v2 character archive, for selection menus.
    pub fn selectable_palettes(&self) -> &[i32] {
        &self.selectable_palettes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub(crate) fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Queues texture creation for every decoded sprite. Sprites sharing pixels
    /// share one texture, so each is queued once.
    pub fn queue_textures(&self, sender: &TextureSender) -> usize {
        queue_unique(self.sprites.values(), sender)
    }
}
