//! Frame loading and image data

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use rustc_hash::FxHashMap;

use crate::error::{ImageError, Result};

/// Decoded RGBA image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pixels: Vec<u8>,
    /// Image width in pixels
    width: u32,
    /// Image height in pixels
    height: u32,
}

impl ImageData {
    /// Create ImageData from raw RGBA pixels
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "Invalid pixel data length: expected {}, got {}",
                expected_len,
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// A `width` x `height` image filled with one RGBA color
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = (width as usize) * (height as usize);
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Decode image from encoded bytes (PNG)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)?;
        Ok(Self::from_dynamic_image(img))
    }

    /// Read and decode an image file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| ImageError::FileLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&data)
    }

    fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.to_rgba8().into_raw();
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Get the raw RGBA pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the number of bytes in the pixel data
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loaders
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves a frame name to decoded pixels
pub trait FrameLoader {
    fn load(&self, frame: &str) -> Result<ImageData>;
}

impl<F> FrameLoader for F
where
    F: Fn(&str) -> Result<ImageData>,
{
    fn load(&self, frame: &str) -> Result<ImageData> {
        self(frame)
    }
}

/// Loads frames as image files relative to a root directory
#[derive(Debug, Clone)]
pub struct FileFrameLoader {
    root: PathBuf,
}

impl FileFrameLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FrameLoader for FileFrameLoader {
    fn load(&self, frame: &str) -> Result<ImageData> {
        let path = self.root.join(frame);
        tracing::debug!(path = %path.display(), "FileFrameLoader: decoding frame");
        ImageData::from_file(&path)
    }
}

/// Serves frames registered in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameLoader {
    frames: FxHashMap<String, ImageData>,
}

impl MemoryFrameLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: impl Into<String>, data: ImageData) {
        self.frames.insert(frame.into(), data);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_frame(mut self, frame: impl Into<String>, data: ImageData) -> Self {
        self.insert(frame, data);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameLoader for MemoryFrameLoader {
    fn load(&self, frame: &str) -> Result<ImageData> {
        self.frames
            .get(frame)
            .cloned()
            .ok_or_else(|| ImageError::NotFound(frame.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_rgba() {
        // Create a 2x2 red image
        let pixels = vec![
            255, 0, 0, 255, // Red
            255, 0, 0, 255, // Red
            255, 0, 0, 255, // Red
            255, 0, 0, 255, // Red
        ];

        let data = ImageData::from_rgba(pixels, 2, 2).unwrap();
        assert_eq!(data.dimensions(), (2, 2));
        assert_eq!(data.byte_len(), 16);
        assert_eq!(data, ImageData::solid(2, 2, [255, 0, 0, 255]));
    }

    #[test]
    fn test_invalid_rgba_length() {
        let pixels = vec![255, 0, 0, 255]; // Only 1 pixel for 2x2
        assert!(ImageData::from_rgba(pixels, 2, 2).is_err());
    }

    #[test]
    fn test_png_round_trip_through_decoder() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 128, 255, 255]))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let data = ImageData::from_bytes(&png).unwrap();
        assert_eq!(data.dimensions(), (3, 2));
        assert_eq!(&data.pixels()[..4], &[0, 128, 255, 255]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = ImageData::from_bytes(b"definitely not a png");
        assert!(matches!(result, Err(ImageError::Image(_))));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryFrameLoader::new().with_frame("pop_0", ImageData::solid(1, 1, [0; 4]));
        assert!(loader.load("pop_0").is_ok());
        assert!(matches!(loader.load("pop_1"), Err(ImageError::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let loader = FileFrameLoader::new("/nonexistent/tether/frames");
        assert!(matches!(loader.load("pop_0.png"), Err(ImageError::FileLoad(_))));
    }

    #[test]
    fn test_closure_loader() {
        let loader = |frame: &str| -> Result<ImageData> {
            if frame == "ok" {
                Ok(ImageData::solid(1, 1, [1, 2, 3, 4]))
            } else {
                Err(ImageError::NotFound(frame.to_string()))
            }
        };
        assert_eq!(loader.load("ok").unwrap().pixels(), &[1, 2, 3, 4]);
    }
}
