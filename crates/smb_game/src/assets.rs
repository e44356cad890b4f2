//! GPU texture cache keyed by asset path.
//!
//! Every brick shares one entry, and so does every frame of every animation
//! that names the same file. A texture that fails to load is replaced by a
//! magenta placeholder, logged once, and never retried.

use smb_core::LoadFailure;
use smb_render::{SpritePipeline, Texture};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Plain white texel for tinted debug quads.
pub const DEBUG_WHITE: &str = "__debug_white";

const PLACEHOLDER_RGBA: [u8; 4] = [255, 0, 255, 255];

pub struct GpuSpriteTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<Arc<str>, GpuSpriteTexture>,
    failed: usize,
}

pub fn read_texture_bytes(path: &Path) -> Result<Vec<u8>, LoadFailure> {
    std::fs::read(path).map_err(|e| LoadFailure::resource(path, e.to_string()))
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `key` is resident, loading it from disk on first use.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        key: &str,
    ) {
        if self.textures.contains_key(key) {
            return;
        }
        let texture = if key == DEBUG_WHITE {
            Texture::from_rgba8(device, queue, &[255, 255, 255, 255], 1, 1, key)
        } else {
            match load_texture(device, queue, key) {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("{err}. Drawing a placeholder instead.");
                    self.failed += 1;
                    Texture::from_rgba8(device, queue, &PLACEHOLDER_RGBA, 1, 1, key)
                }
            }
        };
        let bind_group = pipeline.create_texture_bind_group(device, &texture);
        self.textures.insert(
            Arc::from(key),
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
    }

    pub fn ensure_all<'a>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        keys: impl IntoIterator<Item = &'a str>,
    ) {
        for key in keys {
            self.ensure(device, queue, pipeline, key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&GpuSpriteTexture> {
        self.textures.get(key)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    /// RGBA8 bytes held on the GPU.
    pub fn memory_bytes(&self) -> usize {
        self.textures
            .values()
            .map(|t| t.texture.size.0 as usize * t.texture.size.1 as usize * 4)
            .sum()
    }
}

fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    key: &str,
) -> Result<Texture, LoadFailure> {
    let path = Path::new(key);
    let bytes = read_texture_bytes(path)?;
    Texture::from_bytes(device, queue, &bytes, key).map_err(|e| LoadFailure::resource(path, e))
}
