use std::{collections::HashMap, sync::Arc};

use crate::types::{PaletteColors, SpriteKey, MAX_PAL_NO};

/// Physical palette storage with a logical-to-physical remap layer.
///
/// Several slots may hold the same buffer (duplicates and links), and cloning
/// the list only clones the `Arc`s, so remapping one copy leaves the others alone.
#[derive(Debug, Clone, Default)]
pub struct PaletteList {
    palettes: Vec<Option<Arc<PaletteColors>>>,
    palette_map: Vec<usize>,
    /// (group, number) -> physical slot. -1 marks an invalidated canonical slot.
    pub pal_table: HashMap<SpriteKey, i32>,
    /// (group, number) -> declared color count
    pub numcols: HashMap<SpriteKey, i32>,
}

impl PaletteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list whose first [`MAX_PAL_NO`] slots are empty palettes addressed
    /// as (1, 1) through (1, MAX_PAL_NO).
    pub fn with_canonical_slots() -> Self {
        let mut res = Self::new();

        for number in 1..=MAX_PAL_NO as i16 {
            let (idx, _) = res.new_pal();
            res.pal_table.insert((1, number), idx as i32);
        }

        res
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// Registers `palette` at physical slot `i` and points the logical index `i` back at it.
    /// Storage grows with empty placeholders as needed.
    pub fn set_source(&mut self, i: usize, palette: Arc<PaletteColors>) {
        if i < self.palette_map.len() {
            self.palette_map[i] = i;
        } else {
            while i > self.palette_map.len() {
                self.palette_map.push(self.palette_map.len());
            }
            self.palette_map.push(i);
        }

        if i < self.palettes.len() {
            self.palettes[i] = Some(palette);
        } else {
            self.palettes.resize(i, None);
            self.palettes.push(Some(palette));
        }
    }

    /// Allocates a new zeroed palette at the end of the list.
    pub fn new_pal(&mut self) -> (usize, &mut PaletteColors) {
        let i = self.palettes.len();
        self.set_source(i, Arc::new([0u32; 256]));

        let slot = self.palettes[i].get_or_insert_with(|| Arc::new([0u32; 256]));

        (i, Arc::make_mut(slot))
    }

    /// Palette for logical index `i`, through the remap layer.
    pub fn get(&self, i: usize) -> Option<&Arc<PaletteColors>> {
        let physical = *self.palette_map.get(i)?;
        self.palettes.get(physical)?.as_ref()
    }

    /// Points logical index `source` at physical slot `destination`.
    ///
    /// Returns false and leaves the map alone when either index is out of range.
    pub fn remap(&mut self, source: usize, destination: usize) -> bool {
        if source >= self.palette_map.len() || destination >= self.palettes.len() {
            log::warn!("Cannot remap palette {source} to {destination}: out of range");
            return false;
        }

        self.palette_map[source] = destination;
        true
    }

    pub fn reset_remap(&mut self) {
        self.palette_map
            .iter_mut()
            .enumerate()
            .for_each(|(i, slot)| *slot = i);
    }

    pub fn pal_map(&self) -> Vec<usize> {
        self.palette_map.clone()
    }

    /// Exchanges the remap array with `pal_map` if both have the same length.
    pub fn swap_pal_map(&mut self, pal_map: &mut Vec<usize>) -> bool {
        if pal_map.len() != self.palette_map.len() {
            return false;
        }

        std::mem::swap(pal_map, &mut self.palette_map);
        true
    }

    /// Physical slot for (group, number), if it resolves.
    pub fn lookup(&self, key: SpriteKey) -> Option<usize> {
        self.pal_table
            .get(&key)
            .and_then(|&idx| usize::try_from(idx).ok())
    }
}
