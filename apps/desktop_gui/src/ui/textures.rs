//! Decoding avatar bytes into egui textures.

use std::collections::HashMap;

use eframe::egui;
use egui::TextureHandle;
use image::GenericImageView;
use shared::domain::MAX_AVATAR_BYTES;
use ticket_core::{AvatarSource, PreviewRegistry};

const MAX_PREVIEW_DIMENSION: f32 = 160.0;

#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| format!("failed to decode image: {err}"))?;

    let (orig_w, orig_h) = decoded.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err("image has no pixels".to_string());
    }
    let scale = (MAX_PREVIEW_DIMENSION / (orig_w.max(orig_h) as f32)).min(1.0);
    let resized = if scale < 1.0 {
        decoded.resize(
            (orig_w as f32 * scale).max(1.0) as u32,
            (orig_h as f32 * scale).max(1.0) as u32,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };
    let rgba = resized.to_rgba8();
    Ok(PreviewImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    })
}

pub fn upload_texture(ctx: &egui::Context, name: &str, image: &PreviewImage) -> TextureHandle {
    let color_image =
        egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

/// Oversized sources are refused without being read in full; they are
/// already flagged by the avatar size check.
pub fn load_preview_bytes(source: &AvatarSource) -> Result<Vec<u8>, String> {
    let bytes = source
        .read_capped_blocking(MAX_AVATAR_BYTES)
        .map_err(|err| err.to_string())?;
    if bytes.len() as u64 > MAX_AVATAR_BYTES {
        return Err(format!("larger than {MAX_AVATAR_BYTES} bytes"));
    }
    Ok(bytes)
}

enum CachedPreview {
    Ready(TextureHandle),
    Undecodable,
}

/// Textures for live preview handles. Entries whose handle has been revoked
/// are dropped on the next [`PreviewTextures::prune`], freeing the GPU side.
#[derive(Default)]
pub struct PreviewTextures {
    entries: HashMap<String, CachedPreview>,
}

impl PreviewTextures {
    pub fn prune(&mut self, registry: &PreviewRegistry) {
        self.entries.retain(|url, _| registry.is_live(url));
    }

    pub fn texture_for(
        &mut self,
        ctx: &egui::Context,
        registry: &PreviewRegistry,
        url: &str,
    ) -> Option<&TextureHandle> {
        if !self.entries.contains_key(url) {
            let source = registry.resolve(url)?;
            let entry = match load_preview_bytes(&source)
                .and_then(|bytes| decode_preview_image(&bytes))
            {
                Ok(image) => CachedPreview::Ready(upload_texture(ctx, url, &image)),
                Err(reason) => {
                    tracing::debug!(url, reason = %reason, "avatar preview not renderable");
                    CachedPreview::Undecodable
                }
            };
            self.entries.insert(url.to_string(), entry);
        }

        match self.entries.get(url)? {
            CachedPreview::Ready(texture) => Some(texture),
            CachedPreview::Undecodable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([200u8, 80, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn large_images_are_scaled_to_preview_bounds() {
        let preview = decode_preview_image(&encoded_png(640, 320)).expect("decode");
        assert_eq!(preview.width, 160);
        assert_eq!(preview.height, 80);
        assert_eq!(preview.rgba.len(), 160 * 80 * 4);
    }

    #[test]
    fn small_images_keep_their_size() {
        let preview = decode_preview_image(&encoded_png(32, 16)).expect("decode");
        assert_eq!((preview.width, preview.height), (32, 16));
    }

    #[test]
    fn oversized_sources_are_not_loaded() {
        let source = AvatarSource::Bytes(vec![0u8; MAX_AVATAR_BYTES as usize + 10].into());
        assert!(load_preview_bytes(&source).is_err());

        let png = encoded_png(8, 8);
        let source = AvatarSource::Bytes(png.clone().into());
        assert_eq!(load_preview_bytes(&source).expect("within limit"), png);
    }

    #[test]
    fn oversized_preview_is_cached_as_undecodable() {
        let ctx = egui::Context::default();
        let registry = PreviewRegistry::new();
        let file = ticket_core::AvatarFile::from_bytes(
            "huge.png",
            "image/png",
            vec![0u8; MAX_AVATAR_BYTES as usize * 4],
        );
        let handle = registry.create(&file);
        let mut textures = PreviewTextures::default();

        assert!(textures.texture_for(&ctx, &registry, handle.url()).is_none());
        assert!(matches!(
            textures.entries.get(handle.url()),
            Some(CachedPreview::Undecodable)
        ));

        drop(handle);
        textures.prune(&registry);
        assert!(textures.entries.is_empty());
    }

    #[test]
    fn garbage_bytes_are_reported() {
        assert!(decode_preview_image(b"definitely not an image").is_err());
    }
}
