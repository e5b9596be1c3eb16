//! Image export: offscreen render at a scaled resolution plus pixel
//! readback.
//!
//! Dimension validation happens before any GPU resource is created, and
//! the export renders into a fresh per-call target, so the persistent
//! viewport and camera state are never touched and nothing needs to be
//! restored afterwards.

use crate::error::ExportError;
use crate::gpu::{RenderContext, RenderTarget};

/// Largest supported export dimension, matching the default wgpu 2D
/// texture limit.
pub const MAX_EXPORT_DIMENSION: u32 = 8192;

/// A rendered frame as tightly packed RGBA8 pixels, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes of RGBA data.
    pub rgba: Vec<u8>,
}

/// Compute and validate export dimensions: `container x multiplier`.
///
/// Pure; runs before any renderer state is involved.
///
/// # Errors
///
/// [`ExportError::InvalidMultiplier`] for non-finite or non-positive
/// multipliers, [`ExportError::ZeroDimension`] when a side collapses to
/// zero, [`ExportError::DimensionTooLarge`] past the texture limit.
pub fn validate_dimensions(
    container: (u32, u32),
    multiplier: f32,
) -> Result<(u32, u32), ExportError> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(ExportError::InvalidMultiplier);
    }
    let width = (container.0 as f32 * multiplier).floor() as u32;
    let height = (container.1 as f32 * multiplier).floor() as u32;
    if width == 0 || height == 0 {
        return Err(ExportError::ZeroDimension);
    }
    if width > MAX_EXPORT_DIMENSION || height > MAX_EXPORT_DIMENSION {
        return Err(ExportError::DimensionTooLarge {
            width,
            height,
            limit: MAX_EXPORT_DIMENSION,
        });
    }
    Ok((width, height))
}

/// Copy the target's color texture into host memory, unpadding the
/// 256-byte-aligned rows.
///
/// # Errors
///
/// [`ExportError::Readback`] when buffer mapping fails.
pub fn read_pixels(
    context: &RenderContext,
    target: &RenderTarget,
) -> Result<ImageData, ExportError> {
    let bytes_per_row = target.width * 4;
    let padded_bytes_per_row = bytes_per_row.div_ceil(256) * 256;
    let staging = context.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Export Staging Buffer"),
        size: u64::from(padded_bytes_per_row) * u64::from(target.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = context.create_encoder();
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target.color,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(target.height),
            },
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
    context.submit(encoder);

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = context.device.poll(wgpu::PollType::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ExportError::Readback(e.to_string())),
        Err(e) => return Err(ExportError::Readback(e.to_string())),
    }

    let mut rgba = Vec::with_capacity((bytes_per_row * target.height) as usize);
    {
        let data = slice.get_mapped_range();
        for row in 0..target.height {
            let start = (row * padded_bytes_per_row) as usize;
            rgba.extend_from_slice(&data[start..start + bytes_per_row as usize]);
        }
    }
    staging.unmap();
    staging.destroy();

    Ok(ImageData {
        width: target.width,
        height: target.height,
        rgba,
    })
}

/// Encode as a binary PPM (P6). Alpha is dropped.
#[must_use]
pub fn to_ppm(image: &ImageData) -> Vec<u8> {
    let mut out = format!("P6\n{} {}\n255\n", image.width, image.height).into_bytes();
    out.reserve((image.width * image.height * 3) as usize);
    for pixel in image.rgba.chunks_exact(4) {
        out.extend_from_slice(&pixel[..3]);
    }
    out
}
