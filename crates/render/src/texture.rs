//! Card textures: decoding, fallback resolution and GPU upload.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Side of the synthesized fallback textures.
pub const SYNTH_SIZE: u32 = 256;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("empty image {}x{}", width, height);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            bail!("expected {} RGBA bytes, got {}", expected, pixels.len());
        }
        Ok(Self { width, height, pixels })
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("decoding image")?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("loading {}", path.display()))
    }

    /// Whether both sides are within `max_dim` texels.
    pub fn fits(&self, max_dim: u32) -> bool {
        self.width <= max_dim && self.height <= max_dim
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Load an optional texture. Missing, undecodable or oversized files are
/// logged and skipped; `max_dim` is the device's 2D texture limit.
pub fn load_optional(path: Option<&Path>, max_dim: u32) -> Option<ImageData> {
    let path = path?;
    match ImageData::open(path) {
        Ok(img) if !img.fits(max_dim) => {
            log::warn!(
                "texture {} is {}x{}, over the {} texel limit; using fallback",
                path.display(),
                img.width,
                img.height,
                max_dim
            );
            None
        }
        Ok(img) => {
            log::info!("loaded {} ({}x{})", path.display(), img.width, img.height);
            Some(img)
        }
        Err(e) => {
            log::warn!("texture unavailable, using fallback: {:#}", e);
            None
        }
    }
}

/// Diagonal rainbow used when no holo texture is supplied.
pub fn holo_gradient(width: u32, height: u32) -> ImageData {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let t = (x as f32 / width as f32 + y as f32 / height as f32) * 0.5;
            let [r, g, b] = hue_to_rgb(t);
            pixels.extend_from_slice(&[to_u8(r), to_u8(g), to_u8(b), 200]);
        }
    }
    ImageData { width, height, pixels }
}

/// Plain light card with a darker border, used when no card art is supplied.
pub fn plain_card(width: u32, height: u32) -> ImageData {
    let border = (width.min(height) / 24).max(1);
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let edge = x < border || y < border || x >= width - border || y >= height - border;
            let rgba = if edge {
                [0x39, 0x3E, 0x46, 0xFF]
            } else {
                [0xE3, 0xD6, 0xD1, 0xFF]
            };
            pixels.extend_from_slice(&rgba);
        }
    }
    ImageData { width, height, pixels }
}

fn hue_to_rgb(h: f32) -> [f32; 3] {
    let h = h.fract() * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Textures as supplied; any may be missing.
#[derive(Debug, Default, Clone)]
pub struct TextureInputs {
    pub card: Option<ImageData>,
    pub holo: Option<ImageData>,
    pub grain: Option<ImageData>,
    pub noise: Option<ImageData>,
    pub normal: Option<ImageData>,
}

/// The five textures the holographic shader samples, all present.
#[derive(Debug, Clone)]
pub struct TextureSet {
    pub card: ImageData,
    pub holo: ImageData,
    pub grain: ImageData,
    pub noise: ImageData,
    pub normal: ImageData,
}

impl TextureSet {
    /// Fill gaps: holo ← gradient, grain ← holo, noise ← grain, normal ← noise.
    pub fn resolve(inputs: TextureInputs) -> Self {
        let holo = inputs
            .holo
            .unwrap_or_else(|| holo_gradient(SYNTH_SIZE, SYNTH_SIZE));
        let grain = inputs.grain.unwrap_or_else(|| holo.clone());
        let noise = inputs.noise.unwrap_or_else(|| grain.clone());
        let normal = inputs.normal.unwrap_or_else(|| noise.clone());
        let card = inputs
            .card
            .unwrap_or_else(|| plain_card(SYNTH_SIZE * 5 / 7, SYNTH_SIZE));
        Self {
            card,
            holo,
            grain,
            noise,
            normal,
        }
    }
}

/// A texture uploaded to the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Upload `image`. Color art uses an sRGB format; data maps stay linear.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        srgb: bool,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn solid(v: u8) -> ImageData {
        ImageData::solid(2, 2, [v, v, v, 255])
    }

    #[test]
    fn test_resolve_all_present() {
        let set = TextureSet::resolve(TextureInputs {
            card: Some(solid(1)),
            holo: Some(solid(2)),
            grain: Some(solid(3)),
            noise: Some(solid(4)),
            normal: Some(solid(5)),
        });
        assert_eq!(set.card, solid(1));
        assert_eq!(set.holo, solid(2));
        assert_eq!(set.grain, solid(3));
        assert_eq!(set.noise, solid(4));
        assert_eq!(set.normal, solid(5));
    }

    #[test]
    fn test_fallback_chain() {
        let set = TextureSet::resolve(TextureInputs {
            holo: Some(solid(2)),
            ..Default::default()
        });
        assert_eq!(set.grain, solid(2));
        assert_eq!(set.noise, solid(2));
        assert_eq!(set.normal, solid(2));

        let set = TextureSet::resolve(TextureInputs {
            holo: Some(solid(2)),
            grain: Some(solid(3)),
            ..Default::default()
        });
        assert_eq!(set.noise, solid(3));
        assert_eq!(set.normal, solid(3));

        let set = TextureSet::resolve(TextureInputs {
            noise: Some(solid(4)),
            ..Default::default()
        });
        assert_eq!(set.normal, solid(4));
        assert_eq!(set.grain, set.holo);
    }

    #[test]
    fn test_nothing_supplied_synthesizes() {
        let set = TextureSet::resolve(TextureInputs::default());
        assert_eq!(set.holo.width, SYNTH_SIZE);
        assert_eq!(set.holo.pixels.len(), (SYNTH_SIZE * SYNTH_SIZE * 4) as usize);
        assert_eq!(set.normal, set.holo);
        assert!(set.card.height > set.card.width);
        assert_eq!(set.card.pixel(0, 0), [0x39, 0x3E, 0x46, 0xFF]);
        let (cx, cy) = (set.card.width / 2, set.card.height / 2);
        assert_eq!(set.card.pixel(cx, cy), [0xE3, 0xD6, 0xD1, 0xFF]);
    }

    #[test]
    fn test_from_rgba_validates() {
        assert!(ImageData::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(ImageData::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(ImageData::from_rgba(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_decode_png() {
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgba([10, 20, 30, 40]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

        let decoded = ImageData::decode(bytes.get_ref()).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixel(2, 1), [10, 20, 30, 40]);
        assert!(ImageData::decode(b"not an image").is_err());
    }

    #[test]
    fn test_load_optional_failures_are_none() {
        assert!(load_optional(None, 8192).is_none());
        let missing = std::env::temp_dir().join("holocard-missing-texture.png");
        assert!(load_optional(Some(&missing), 8192).is_none());

        let garbage = std::env::temp_dir().join("holocard-garbage-texture.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();
        assert!(load_optional(Some(&garbage), 8192).is_none());
        let _ = std::fs::remove_file(&garbage);
    }

    #[test]
    fn test_load_optional_rejects_oversized() {
        let path = std::env::temp_dir().join("holocard-oversized-texture.png");
        image::RgbaImage::new(20, 8).save(&path).unwrap();

        let loaded = load_optional(Some(&path), 32).unwrap();
        assert_eq!((loaded.width, loaded.height), (20, 8));
        assert!(load_optional(Some(&path), 16).is_none());

        // Rejected art falls through to the synthesized fallbacks
        let set = TextureSet::resolve(TextureInputs {
            holo: load_optional(Some(&path), 16),
            ..Default::default()
        });
        assert_eq!(set.holo.width, SYNTH_SIZE);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_fits() {
        let img = ImageData::solid(20, 8, [0; 4]);
        assert!(img.fits(20));
        assert!(!img.fits(19));
        assert!(!ImageData::solid(8, 20, [0; 4]).fits(19));
    }

    #[test]
    fn test_gradient_covers_hues() {
        let g = holo_gradient(64, 64);
        let a = g.pixel(0, 0);
        let b = g.pixel(63, 0);
        assert_ne!(a, b);
        assert!(g.pixels.chunks(4).all(|p| p[3] == 200));
    }
}
