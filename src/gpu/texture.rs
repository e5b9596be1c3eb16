//! Offscreen render-target textures.

use super::render_context::{COLOR_FORMAT, DEPTH_FORMAT};

/// An offscreen color+depth target.
///
/// The color texture is created with `RENDER_ATTACHMENT | COPY_SRC` usage,
/// making it suitable for rendering followed by read-back.
pub struct RenderTarget {
    /// Target width in texels.
    pub width: u32,
    /// Target height in texels.
    pub height: u32,
    /// Color texture.
    pub color: wgpu::Texture,
    /// Full-texture color view.
    pub color_view: wgpu::TextureView,
    /// Depth texture.
    pub depth: wgpu::Texture,
    /// Full-texture depth view.
    pub depth_view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a new render target with the given dimensions.
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            width,
            height,
            color,
            color_view,
            depth,
            depth_view,
        }
    }

    /// Eagerly release the underlying textures.
    pub fn dispose(self) {
        self.color.destroy();
        self.depth.destroy();
    }
}
