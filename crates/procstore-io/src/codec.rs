//! Bitmap encoding and decoding.
//!
//! Cells are packed ARGB values. Every pixel of a record image must carry
//! [`REQUIRED_OPACITY`]; images are written as 24-bit bitmaps, which decode
//! back to fully opaque pixels.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use procstore_types::{Cell, Grid, TypeError};

/// Opacity every pixel of a record image must have.
pub const REQUIRED_OPACITY: u8 = 255;

/// Why a byte buffer is not a valid record image.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The bytes could not be decoded or encoded as a bitmap.
    #[error("bitmap codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// A pixel does not carry the required opacity.
    #[error("pixel ({x}, {y}) has opacity {found}, required {required}")]
    Opacity {
        x: u32,
        y: u32,
        found: u8,
        required: u8,
    },

    /// The decoded dimensions do not form a valid grid.
    #[error("invalid grid: {0}")]
    Shape(#[from] TypeError),
}

/// Decode bitmap bytes into a grid of cells.
///
/// Fails on the first pixel whose opacity is not [`REQUIRED_OPACITY`].
pub fn decode_bitmap(bytes: &[u8]) -> Result<Grid<Cell>, ContentError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Bmp)?.to_rgba8();
    let (width, height) = image.dimensions();

    let mut cells = Vec::with_capacity(width as usize * height as usize);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [red, green, blue, alpha] = pixel.0;
        if alpha != REQUIRED_OPACITY {
            return Err(ContentError::Opacity {
                x,
                y,
                found: alpha,
                required: REQUIRED_OPACITY,
            });
        }
        cells.push(Cell::from_argb(alpha, red, green, blue));
    }

    Ok(Grid::new(width, height, cells)?)
}

/// Encode a grid as 24-bit bitmap bytes.
pub fn encode_bitmap(content: &Grid<Cell>) -> Result<Vec<u8>, ContentError> {
    check_opacity(content)?;

    let width = content.width();
    let cells = content.cells();
    let image = ImageBuffer::from_fn(width, content.height(), |x, y| {
        let (red, green, blue) = cells[(y * width + x) as usize].rgb();
        Rgb([red, green, blue])
    });

    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut bytes, ImageFormat::Bmp)?;
    Ok(bytes.into_inner())
}

/// Verify every cell carries [`REQUIRED_OPACITY`].
pub fn check_opacity(content: &Grid<Cell>) -> Result<(), ContentError> {
    let width = content.width();
    match content
        .cells()
        .iter()
        .position(|cell| cell.alpha() != REQUIRED_OPACITY)
    {
        Some(i) => Err(ContentError::Opacity {
            x: i as u32 % width,
            y: i as u32 / width,
            found: content.cells()[i].alpha(),
            required: REQUIRED_OPACITY,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(width: u32, height: u32) -> Grid<Cell> {
        Grid::from_fn(width, height, |x, y| {
            Cell::from_argb(255, (x * 40) as u8, (y * 60) as u8, (x + y) as u8)
        })
        .unwrap()
    }

    #[test]
    fn encoded_bitmap_decodes_to_same_cells() {
        let grid = opaque(5, 3);
        let bytes = encode_bitmap(&grid).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(decode_bitmap(&bytes).unwrap(), grid);
    }

    #[test]
    fn translucent_cell_is_rejected_on_encode() {
        let grid = Grid::from_fn(3, 2, |x, y| {
            let alpha = if (x, y) == (2, 1) { 10 } else { 255 };
            Cell::from_argb(alpha, 0, 0, 0)
        })
        .unwrap();
        match encode_bitmap(&grid) {
            Err(ContentError::Opacity { x, y, found, required }) => {
                assert_eq!((x, y, found, required), (2, 1, 10, 255));
            }
            other => panic!("expected opacity error, got {other:?}"),
        }
    }

    #[test]
    fn translucent_pixel_is_rejected_on_decode() {
        let image = image::RgbaImage::from_fn(3, 2, |x, y| {
            let alpha = if (x, y) == (1, 1) { 7 } else { 255 };
            image::Rgba([10, 20, 30, alpha])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, ImageFormat::Bmp)
            .unwrap();

        match decode_bitmap(bytes.get_ref()) {
            Err(ContentError::Opacity { x, y, found, required }) => {
                assert_eq!((x, y, found, required), (1, 1, 7, REQUIRED_OPACITY));
            }
            other => panic!("expected opacity error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(
            decode_bitmap(b"definitely not a bitmap"),
            Err(ContentError::Codec(_))
        ));
    }

    #[test]
    fn check_opacity_accepts_opaque_grid() {
        assert!(check_opacity(&opaque(4, 4)).is_ok());
    }
}
