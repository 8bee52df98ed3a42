//! Texture materialization.
//!
//! Sprites can be decoded anywhere, but textures must be created on the one
//! context that owns the renderer. Decoders push finalize tasks through a
//! [`TextureSender`]; the rendering context runs them with [`TextureQueue::drain`]
//! before anything reads [`crate::Sprite::texture`].
use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use crate::types::{SpritePixels, TextureSlot};

/// Opaque handle returned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// The drawing backend, which lives outside this crate.
pub trait Renderer {
    fn create_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        bits_per_pixel: u8,
    ) -> TextureHandle;
}

type FinalizeTask = Box<dyn FnOnce(&mut dyn Renderer) + Send>;

/// Cloneable producer side of the queue, safe to move into worker threads.
#[derive(Clone)]
pub struct TextureSender {
    tx: Sender<FinalizeTask>,
}

impl TextureSender {
    /// Queues texture creation for `pixels`. The slot is filled once; later
    /// tasks for an already filled slot do nothing.
    pub fn finalize(&self, slot: TextureSlot, pixels: SpritePixels, size: [u16; 2]) -> bool {
        let task: FinalizeTask = Box::new(move |renderer| {
            if slot.get().is_some() {
                return;
            }

            let handle = match &pixels {
                SpritePixels::Indexed(px) => {
                    if px.len() != size[0] as usize * size[1] as usize {
                        log::warn!(
                            "Pixel buffer of {} bytes does not match {}x{}",
                            px.len(),
                            size[0],
                            size[1]
                        );
                        return;
                    }

                    renderer.create_texture(px, size[0] as u32, size[1] as u32, 8)
                }
                SpritePixels::Truecolor(img) => {
                    renderer.create_texture(&img.data, img.width, img.height, img.depth)
                }
            };

            let _ = slot.set(handle);
        });

        match self.tx.send(task) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Texture queue is gone, dropping finalize task");
                false
            }
        }
    }
}

/// Consumer side, owned by the rendering context.
pub struct TextureQueue {
    tx: Sender<FinalizeTask>,
    rx: Receiver<FinalizeTask>,
}

impl Default for TextureQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> TextureSender {
        TextureSender {
            tx: self.tx.clone(),
        }
    }

    /// Runs every queued task. Returns how many ran.
    pub fn drain(&self, renderer: &mut dyn Renderer) -> usize {
        let mut ran = 0;

        while let Ok(task) = self.rx.try_recv() {
            task(renderer);
            ran += 1;
        }

        ran
    }
}

/// Queues one finalize task per distinct texture slot among `sprites`.
pub(crate) fn queue_unique<'a>(
    sprites: impl Iterator<Item = &'a crate::Sprite>,
    sender: &TextureSender,
) -> usize {
    let mut seen = std::collections::HashSet::new();

    sprites
        .filter_map(|sprite| {
            let pixels = sprite.pixels.as_ref()?;

            if !seen.insert(Arc::as_ptr(&sprite.texture)) {
                return None;
            }

            sender
                .finalize(sprite.texture.clone(), pixels.clone(), sprite.size)
                .then_some(())
        })
        .count()
}
