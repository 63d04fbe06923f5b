use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use shared::{AppError, Result};
use std::io::Cursor;

/// Base tint for an "on" cell (magenta)
const BASE_TINT: [u8; 3] = [128, 0, 128];

/// Anything that can answer "what colour is pixel (x, y)" inside fixed bounds.
pub trait PixelSource {
    /// (width, height) of the canvas; valid coordinates are `[0, width) x [0, height)`.
    fn bounds(&self) -> (u32, u32);

    fn at(&self, x: u32, y: u32) -> Rgba<u8>;
}

/// Geometry of the rendered bitmap: a `magnification x magnification` logical
/// grid scaled into a `canvas_size` square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapGeometry {
    pub magnification: u32,
    pub canvas_size: u32,
}

impl Default for BitmapGeometry {
    fn default() -> Self {
        Self {
            magnification: shared::config::DEFAULT_MAGNIFICATION,
            canvas_size: shared::config::DEFAULT_CANVAS_SIZE,
        }
    }
}

impl BitmapGeometry {
    pub fn new(magnification: u32, canvas_size: u32) -> Result<Self> {
        if magnification == 0 {
            return Err(AppError::invalid_geometry("magnification must be positive"));
        }
        if canvas_size == 0 || canvas_size % magnification != 0 {
            return Err(AppError::invalid_geometry(format!(
                "canvas size {} is not a multiple of magnification {}",
                canvas_size, magnification
            )));
        }
        Ok(Self {
            magnification,
            canvas_size,
        })
    }

    /// Number of digest bytes consumed: ceil(magnification² / 8).
    pub fn required_bytes(&self) -> usize {
        let cells = self.magnification as usize * self.magnification as usize;
        cells.div_ceil(8)
    }

    /// Edge length in pixels of one logical cell.
    pub fn cell_size(&self) -> u32 {
        self.canvas_size / self.magnification
    }
}

/// A digest viewed as a bitmap: one bit per logical cell, LSB first within each byte.
#[derive(Debug, Clone)]
pub struct BitPng<'a> {
    geometry: BitmapGeometry,
    bytes: &'a [u8],
}

impl<'a> BitPng<'a> {
    /// Fails with `InputTooShort` if `bytes` can't cover every logical cell.
    pub fn new(bytes: &'a [u8], geometry: BitmapGeometry) -> Result<Self> {
        let required = geometry.required_bytes();
        if bytes.len() < required {
            return Err(AppError::input_too_short(required, bytes.len()));
        }
        Ok(Self {
            geometry,
            bytes: &bytes[..required],
        })
    }

    pub fn geometry(&self) -> BitmapGeometry {
        self.geometry
    }

    /// Colour of the logical cell at `(cx, cy)`.
    pub fn cell_color(&self, cx: u32, cy: u32) -> Rgba<u8> {
        let pos = (cx + cy * self.geometry.magnification) as usize;
        let byt = self.bytes[pos / 8];
        let bit = (pos % 8) as u32;

        let is_set = |offset: u32| byt & (1u8 << ((bit + offset) % 8)) != 0;

        if !is_set(0) {
            return Rgba([0, 0, 0, 255]);
        }

        let [mut r, mut g, mut b] = BASE_TINT;

        // Fixed colour table, applied in order; later rules override earlier ones per channel.
        if is_set(4) {
            r = 255;
            b = 255;
        }
        if is_set(6) {
            b = 200;
        }
        if is_set(2) {
            r = 64;
        }
        if is_set(7) {
            g = 196;
            b /= 2;
        }

        Rgba([r, g, b, 255])
    }
}

impl PixelSource for BitPng<'_> {
    fn bounds(&self) -> (u32, u32) {
        (self.geometry.canvas_size, self.geometry.canvas_size)
    }

    fn at(&self, x: u32, y: u32) -> Rgba<u8> {
        let cell = self.geometry.cell_size();
        self.cell_color(x / cell, y / cell)
    }
}

/// Rasterizes `source` and serializes it as a PNG byte stream.
pub fn encode_png<S: PixelSource>(source: &S) -> Result<Vec<u8>> {
    let (width, height) = source.bounds();
    let buffer = ImageBuffer::from_fn(width, height, |x, y| source.at(x, y));

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(buffer).write_to(&mut cursor, ImageFormat::Png)?;

    Ok(cursor.into_inner())
}
