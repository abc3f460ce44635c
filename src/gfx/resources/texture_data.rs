//! Decoded image data, independent of any backend.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GfxError, Result};

/// Pixel format of texture data and texture objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgb,
    Rgba,
    Depth,
    Stencil,
    Depth24Stencil8,
}

impl TextureFormat {
    /// Bytes per pixel in CPU-side data.
    pub fn channels(self) -> u32 {
        match self {
            TextureFormat::Rgb => 3,
            TextureFormat::Rgba => 4,
            TextureFormat::Depth => 4,
            TextureFormat::Stencil => 1,
            TextureFormat::Depth24Stencil8 => 4,
        }
    }

    pub fn is_color(self) -> bool {
        matches!(self, TextureFormat::Rgb | TextureFormat::Rgba)
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureFormat::Rgb => "RGB",
            TextureFormat::Rgba => "RGBA",
            TextureFormat::Depth => "DEPTH",
            TextureFormat::Stencil => "STENCIL",
            TextureFormat::Depth24Stencil8 => "DEPTH24_STENCIL8",
        };
        write!(f, "{}", name)
    }
}

/// Tightly packed pixels plus their dimensions.
///
/// An empty value (no pixels) is the *invalid* state returned when loading
/// fails through [`TextureData::load_or_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub path: Option<PathBuf>,
    pub data: Vec<u8>,
}

impl TextureData {
    /// Decodes a PNG or JPEG file. Images with an alpha channel become RGBA,
    /// everything else RGB.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GfxError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let image = image::load_from_memory(&bytes).map_err(|source| GfxError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let (format, data) = if image.color().has_alpha() {
            (TextureFormat::Rgba, image.to_rgba8().into_raw())
        } else {
            (TextureFormat::Rgb, image.to_rgb8().into_raw())
        };

        let data = Self {
            width: image.width(),
            height: image.height(),
            format,
            path: Some(path.to_path_buf()),
            data,
        };
        log::debug!("decoded {}", data);
        Ok(data)
    }

    /// Like [`TextureData::from_file`], but logs failures and returns the
    /// empty value instead.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_file(path).unwrap_or_else(|err| {
            log::warn!("{}", err);
            let mut empty = Self::empty();
            empty.path = Some(path.to_path_buf());
            empty
        })
    }

    /// Pixels supplied by the caller.
    ///
    /// # Panics
    ///
    /// If `data` does not hold exactly `width * height * channels` bytes.
    pub fn from_raw(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        let expected = width as usize * height as usize * format.channels() as usize;
        assert_eq!(
            data.len(),
            expected,
            "{}x{} {} data needs {} bytes",
            width,
            height,
            format,
            expected
        );
        Self {
            width,
            height,
            format,
            path: None,
            data,
        }
    }

    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            format: TextureFormat::Rgba,
            path: None,
            data: Vec::new(),
        }
    }

    pub fn channels(&self) -> u32 {
        self.format.channels()
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.data.is_empty()
    }

    /// Pixels as RGBA8, expanding RGB with an opaque alpha channel.
    pub fn to_rgba8(&self) -> Cow<'_, [u8]> {
        match self.format {
            TextureFormat::Rgb => Cow::Owned(expand_rgb(&self.data)),
            _ => Cow::Borrowed(&self.data),
        }
    }
}

pub(crate) fn expand_rgb(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .flat_map(|px| [px[0], px[1], px[2], 255])
        .collect()
}

impl fmt::Display for TextureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        write!(
            f,
            "TextureData {{ path: {}, {}x{}, channels: {}, format: {} }}",
            path,
            self.width,
            self.height,
            self.channels(),
            self.format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TextureData::from_file("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, GfxError::Io { .. }));
    }

    #[test]
    fn test_load_or_empty_keeps_path() {
        let data = TextureData::load_or_empty("definitely/not/here.png");
        assert!(!data.is_valid());
        assert_eq!(data.path.as_deref(), Some(Path::new("definitely/not/here.png")));
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let path = std::env::temp_dir().join("loco_texture_data_garbage.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        let err = TextureData::from_file(&path).unwrap_err();
        assert!(matches!(err, GfxError::Decode { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_png_round_trip_through_decoder() {
        let path = std::env::temp_dir().join("loco_texture_data_rgba.png");
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 40]));
        img.save(&path).unwrap();

        let data = TextureData::from_file(&path).unwrap();
        assert_eq!((data.width, data.height), (2, 3));
        assert_eq!(data.format, TextureFormat::Rgba);
        assert_eq!(data.data.len(), 2 * 3 * 4);
        assert_eq!(&data.data[(2 * 2 + 1) * 4..(2 * 2 + 1) * 4 + 4], &[10, 20, 30, 40]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rgb_expands_to_rgba() {
        let data = TextureData::from_raw(1, 2, TextureFormat::Rgb, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(data.to_rgba8().as_ref(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    #[should_panic]
    fn test_from_raw_rejects_wrong_size() {
        TextureData::from_raw(2, 2, TextureFormat::Rgba, vec![0; 3]);
    }
}
