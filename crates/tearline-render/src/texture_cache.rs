//! GPU texture cache: decoded RGBA images keyed by asset path, plus a white fallback

use std::collections::HashMap;
use tracing::debug;
use wgpu::util::DeviceExt;

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}

pub struct TextureCache {
    textures: HashMap<String, GpuTexture>,
    /// 1x1 white texture, bound wherever an image is missing
    pub default_white: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            textures: HashMap::new(),
            default_white: create_rgba(device, queue, "Default White", 1, 1, &[255, 255, 255, 255]),
        }
    }

    /// Upload RGBA8 pixels under `name`. Returns false if the name is already
    /// cached or the pixel buffer does not match the dimensions.
    pub fn upload_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> bool {
        if self.textures.contains_key(name) {
            return false;
        }
        if width == 0 || height == 0 || rgba.len() != (width as usize * height as usize * 4) {
            debug!("Skipping texture '{}': {}x{} with {} bytes", name, width, height, rgba.len());
            return false;
        }

        let gpu = create_rgba(device, queue, name, width, height, rgba);
        debug!("Uploaded texture '{}' ({}x{})", name, width, height);
        self.textures.insert(name.to_string(), gpu);
        true
    }

    pub fn get(&self, name: &str) -> Option<&GpuTexture> {
        self.textures.get(name)
    }

    /// Cached texture, or the white fallback
    pub fn get_or_white(&self, name: &str) -> &GpuTexture {
        self.textures.get(name).unwrap_or(&self.default_white)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

fn create_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> GpuTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    // Card regions sample right up to the texture edge; never wrap into the opposite side
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{} Sampler", label)),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}
