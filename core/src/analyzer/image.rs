//! PNG ingestion for the analyzer: decode to luminance, quantize to the
//! four Game-Boy shades, and slice into 2bpp tiles.

use std::fs::File;
use std::path::Path;

/// Maximum accepted image edge, in pixels.
pub const MAX_DIMENSION: u32 = 1024;

/// A decoded image reduced to per-pixel luminance.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl DecodedImage {
    /// Per-pixel Game-Boy shade (0 lightest, 3 darkest).
    pub fn shades(&self) -> Vec<u8> {
        self.luma.iter().map(|l| 3 - (l >> 6)).collect()
    }

    /// Slice into 8x8 tiles, row-major, and pack as 2bpp (16 bytes per
    /// tile, low plane byte then high plane byte per row).
    pub fn to_2bpp(&self) -> Vec<u8> {
        let shades = self.shades();
        let tiles_x = (self.width / 8) as usize;
        let tiles_y = (self.height / 8) as usize;
        let mut out = Vec::with_capacity(tiles_x * tiles_y * 16);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                for row in 0..8 {
                    let mut lo = 0u8;
                    let mut hi = 0u8;
                    for col in 0..8 {
                        let x = tx * 8 + col;
                        let y = ty * 8 + row;
                        let shade = shades[y * self.width as usize + x];
                        let bit = 7 - col;
                        lo |= (shade & 1) << bit;
                        hi |= ((shade >> 1) & 1) << bit;
                    }
                    out.push(lo);
                    out.push(hi);
                }
            }
        }
        out
    }
}

/// Why an image was rejected. These are warnings at the analyzer level:
/// the asset is skipped, never fatal.
#[derive(Debug)]
pub enum ImageError {
    Io(std::io::Error),
    Decode(png::DecodingError),
    BadDimensions { width: u32, height: u32 },
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::Io(e) => write!(f, "i/o error: {e}"),
            ImageError::Decode(e) => write!(f, "png decode error: {e}"),
            ImageError::BadDimensions { width, height } => write!(
                f,
                "{width}x{height} is not a positive multiple of 8 within \
                 {MAX_DIMENSION}x{MAX_DIMENSION}"
            ),
        }
    }
}

/// Decode a PNG into luminance. Grayscale, RGB(A), and indexed color are
/// accepted; dimensions must be positive multiples of 8 within the cap.
pub fn load_png(path: &Path) -> Result<DecodedImage, ImageError> {
    let file = File::open(path).map_err(ImageError::Io)?;
    let decoder = png::Decoder::new(file);
    let mut reader = decoder.read_info().map_err(ImageError::Decode)?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(ImageError::Decode)?;
    let (width, height) = (info.width, info.height);
    if width == 0
        || height == 0
        || width % 8 != 0
        || height % 8 != 0
        || width > MAX_DIMENSION
        || height > MAX_DIMENSION
    {
        return Err(ImageError::BadDimensions { width, height });
    }
    let pixels = &buf[..info.buffer_size()];
    let n = (width * height) as usize;
    let luma = match info.color_type {
        png::ColorType::Grayscale => pixels[..n].to_vec(),
        png::ColorType::GrayscaleAlpha => {
            pixels.chunks_exact(2).take(n).map(|p| p[0]).collect()
        }
        png::ColorType::Rgb => pixels
            .chunks_exact(3)
            .take(n)
            .map(|p| luminance(p[0], p[1], p[2]))
            .collect(),
        png::ColorType::Rgba => pixels
            .chunks_exact(4)
            .take(n)
            .map(|p| luminance(p[0], p[1], p[2]))
            .collect(),
        png::ColorType::Indexed => {
            let palette = reader.info().palette.clone().unwrap_or_default();
            pixels[..n]
                .iter()
                .map(|i| {
                    let base = *i as usize * 3;
                    match palette.get(base..base + 3) {
                        Some(rgb) => luminance(rgb[0], rgb[1], rgb[2]),
                        None => 0,
                    }
                })
                .collect()
        }
    };
    Ok(DecodedImage { width, height, luma })
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}
