// src/image_loader.rs

//! Decoding the image named on the command line, once, and keeping it around.

use crate::color::Color;
use crate::error::{Result, ViewerError};

use image::{ImageReader, Rgba, RgbaImage};
use log::{debug, info, trace};
use std::path::{Path, PathBuf};

/// Lifecycle of an [`ImageBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// As decoded; may contain transparent or partially transparent pixels.
    Raw,
    /// Every pixel is opaque. Never scanned again.
    Normalized,
}

/// Decoded RGBA8 pixels plus their normalization state.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pixels: RgbaImage,
    state: ImageState,
}

impl ImageBuffer {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        ImageBuffer {
            pixels,
            state: ImageState::Raw,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn state(&self) -> ImageState {
        self.state
    }

    /// # Panics
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// # Panics
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        self.pixels.put_pixel(x, y, pixel);
    }

    /// Rewrites every pixel whose alpha is not `0xFF` to the opaque `fill`
    /// color and marks the buffer `Normalized`. Returns how many pixels were
    /// rewritten; a buffer that is already normalized is left alone and 0 is
    /// returned.
    pub fn normalize(&mut self, fill: Color) -> usize {
        if self.state == ImageState::Normalized {
            trace!("Image already normalized, skipping alpha scan");
            return 0;
        }

        let fill = Rgba(fill.to_rgba());
        let mut rewritten = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.get_pixel(x, y)[3] != 0xFF {
                    self.set_pixel(x, y, fill);
                    rewritten += 1;
                }
            }
        }
        self.state = ImageState::Normalized;
        debug!(
            "Normalized {}x{} image: {} non-opaque pixels replaced",
            self.width(),
            self.height(),
            rewritten
        );
        rewritten
    }

    /// Row-major `0x00RRGGBB` pixels for a 24-bit TrueColor drawable. Alpha
    /// is dropped.
    pub fn to_xrgb(&self) -> Vec<u32> {
        self.pixels
            .pixels()
            .map(|p| Color::rgb(p[0], p[1], p[2]).to_xrgb())
            .collect()
    }
}

/// Turns a file into an [`ImageBuffer`].
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageBuffer>;
}

/// Decoder backed by the `image` crate. The format is sniffed from the file
/// content, so a PNG named `photo.jpg` still loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<ImageBuffer> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| ViewerError::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;
        trace!("Guessed format for {}: {:?}", path.display(), reader.format());

        let decoded = reader.decode().map_err(|source| ViewerError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ImageBuffer::from_rgba(decoded.to_rgba8()))
    }
}

/// Lazily decodes one file and caches the result for the rest of the run.
pub struct ImageLoader {
    path: PathBuf,
    decoder: Box<dyn ImageDecoder>,
    cached: Option<ImageBuffer>,
}

impl ImageLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_decoder(path, Box::new(FileDecoder))
    }

    pub fn with_decoder(path: impl Into<PathBuf>, decoder: Box<dyn ImageDecoder>) -> Self {
        ImageLoader {
            path: path.into(),
            decoder,
            cached: None,
        }
    }

    /// Returns the cached image, decoding the file on the first call. A failed
    /// decode leaves the cache empty.
    pub fn load(&mut self) -> Result<&mut ImageBuffer> {
        let image = match self.cached.take() {
            Some(image) => image,
            None => {
                info!("Decoding {}", self.path.display());
                let image = self.decoder.decode(&self.path)?;
                info!(
                    "Decoded {}: {}x{}",
                    self.path.display(),
                    image.width(),
                    image.height()
                );
                image
            }
        };
        Ok(self.cached.insert(image))
    }

    /// Drops the cached image.
    pub fn release(&mut self) {
        if self.cached.take().is_some() {
            debug!("Released cached image for {}", self.path.display());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use test_log::test;

    fn checkerboard(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0xFF, 0x00, 0x00, 0xFF])
            } else {
                Rgba([0x00, 0x00, 0xFF, 0x40])
            }
        })
    }

    struct CountingDecoder {
        calls: Rc<Cell<usize>>,
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, _path: &Path) -> Result<ImageBuffer> {
            self.calls.set(self.calls.get() + 1);
            Ok(ImageBuffer::from_rgba(checkerboard(4, 4)))
        }
    }

    #[test]
    fn normalize_replaces_only_non_opaque_pixels() {
        let source = checkerboard(5, 3);
        let mut image = ImageBuffer::from_rgba(source.clone());

        let rewritten = image.normalize(Color::NEUTRAL_GRAY);

        assert_eq!(rewritten, 7);
        assert_eq!(image.state(), ImageState::Normalized);
        for (x, y, original) in source.enumerate_pixels() {
            let now = image.get_pixel(x, y);
            if original[3] == 0xFF {
                assert_eq!(now, *original, "opaque pixel at ({x},{y}) changed");
            } else {
                assert_eq!(now, Rgba([0x80, 0x80, 0x80, 0xFF]));
            }
        }
    }

    #[test]
    fn partial_alpha_is_neutralized_like_full_transparency() {
        let mut image = ImageBuffer::from_rgba(RgbaImage::from_pixel(
            1,
            3,
            Rgba([0x10, 0x20, 0x30, 0xFE]),
        ));
        image.set_pixel(0, 1, Rgba([0x10, 0x20, 0x30, 0x00]));
        image.set_pixel(0, 2, Rgba([0x10, 0x20, 0x30, 0xFF]));

        assert_eq!(image.normalize(Color::NEUTRAL_GRAY), 2);
        assert_eq!(image.get_pixel(0, 0), Rgba([0x80, 0x80, 0x80, 0xFF]));
        assert_eq!(image.get_pixel(0, 1), Rgba([0x80, 0x80, 0x80, 0xFF]));
        assert_eq!(image.get_pixel(0, 2), Rgba([0x10, 0x20, 0x30, 0xFF]));
    }

    #[test]
    fn normalize_is_stable_once_applied() {
        let mut image = ImageBuffer::from_rgba(checkerboard(6, 6));
        image.normalize(Color::NEUTRAL_GRAY);
        let after_first = image.to_xrgb();

        // A second pass does not rescan, even if a transparent pixel shows up.
        image.set_pixel(1, 0, Rgba([1, 2, 3, 0]));
        assert_eq!(image.normalize(Color::NEUTRAL_GRAY), 0);
        assert_eq!(image.get_pixel(1, 0), Rgba([1, 2, 3, 0]));

        image.set_pixel(1, 0, Rgba([0x80, 0x80, 0x80, 0xFF]));
        assert_eq!(image.to_xrgb(), after_first);
    }

    #[test]
    fn xrgb_is_row_major_and_drops_alpha() {
        let mut image = ImageBuffer::from_rgba(RgbaImage::new(2, 2));
        image.set_pixel(1, 0, Rgba([0x11, 0x22, 0x33, 0x00]));
        image.set_pixel(0, 1, Rgba([0xAA, 0xBB, 0xCC, 0xFF]));
        assert_eq!(image.to_xrgb(), vec![0, 0x0011_2233, 0x00AA_BBCC, 0]);
    }

    #[test]
    fn loader_decodes_once_and_reuses_the_cache() {
        let calls = Rc::new(Cell::new(0));
        let mut loader = ImageLoader::with_decoder(
            "unused.png",
            Box::new(CountingDecoder {
                calls: Rc::clone(&calls),
            }),
        );
        assert!(!loader.is_loaded());

        for _ in 0..5 {
            let image = loader.load().unwrap();
            assert_eq!((image.width(), image.height()), (4, 4));
        }
        assert_eq!(calls.get(), 1);

        loader.release();
        assert!(!loader.is_loaded());
    }

    #[test]
    fn cached_image_keeps_its_normalization() {
        let calls = Rc::new(Cell::new(0));
        let mut loader = ImageLoader::with_decoder(
            "unused.png",
            Box::new(CountingDecoder {
                calls: Rc::clone(&calls),
            }),
        );
        loader.load().unwrap().normalize(Color::NEUTRAL_GRAY);
        assert_eq!(loader.load().unwrap().state(), ImageState::Normalized);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn file_decoder_reads_png_by_content() {
        let dir = std::env::temp_dir().join(format!("sip-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // Misleading extension on purpose.
        let path = dir.join("picture.jpg");
        RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 0xFF]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let image = FileDecoder.decode(&path).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.get_pixel(2, 1), Rgba([9, 8, 7, 0xFF]));
        assert_eq!(image.state(), ImageState::Raw);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_decoder_rejects_non_images() {
        let dir = std::env::temp_dir().join(format!("sip-loader-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notes.txt");
        std::fs::write(&path, b"definitely not pixels\n").unwrap();

        let err = FileDecoder.decode(&path).unwrap_err();
        assert!(matches!(err, ViewerError::Decode { .. }), "got {err:?}");

        std::fs::remove_dir_all(&dir).ok();
    }
}
