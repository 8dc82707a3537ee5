use image::imageops::FilterType;
use tracing::debug;

use crate::fetch::{FetchError, Upstream};
use crate::state::PageError;

/// Terminal cells are roughly twice as tall as they are wide, so a square
/// sprite is sampled to a 2:1 grid.
pub const SPRITE_W: u32 = 32;
pub const SPRITE_H: u32 = 16;

/// Small decoded sprite, one entry per terminal cell. `None` is transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// Row-major, len = w*h
    pub pixels: Vec<Option<(u8, u8, u8)>>,
}

impl SpriteThumb {
    pub fn rows(&self) -> impl Iterator<Item = &[Option<(u8, u8, u8)>]> {
        self.pixels.chunks(self.w.max(1) as usize)
    }
}

pub fn decode_sprite(bytes: &[u8], w: u32, h: u32) -> Result<SpriteThumb, FetchError> {
    let img = image::load_from_memory(bytes).map_err(|e| FetchError::Image(e.to_string()))?;
    let small = image::imageops::resize(&img.to_rgba8(), w, h, FilterType::Lanczos3);
    let pixels = small
        .pixels()
        .map(|p| {
            if p[3] < 128 {
                None
            } else {
                Some((p[0], p[1], p[2]))
            }
        })
        .collect();
    Ok(SpriteThumb {
        w: small.width(),
        h: small.height(),
        pixels,
    })
}

/// Fetch and decode a sprite. Failures only ever mean "no sprite".
pub async fn load_sprite(upstream: &dyn Upstream, url: &str) -> Result<SpriteThumb, PageError> {
    let bytes = upstream.sprite(url).await.map_err(|error| {
        debug!(url, %error, "sprite fetch failed");
        PageError::NotFound
    })?;
    decode_sprite(&bytes, SPRITE_W, SPRITE_H).map_err(|error| {
        debug!(url, %error, "sprite decode failed");
        PageError::NotFound
    })
}

#[cfg(test)]
pub fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
    bytes
}
