use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A single cell: one pixel packed as a 32-bit ARGB value.
///
/// The layout is `0xAARRGGBB` read as a signed integer, so a fully opaque
/// white cell has the value `-1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell(i32);

impl Cell {
    /// Wrap a raw packed value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Pack individual channels.
    pub const fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        let packed =
            (alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32;
        Self(packed as i32)
    }

    /// The raw packed value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Opacity channel.
    pub const fn alpha(self) -> u8 {
        (self.0 as u32 >> 24) as u8
    }

    /// `(red, green, blue)` channels.
    pub const fn rgb(self) -> (u8, u8, u8) {
        let v = self.0 as u32;
        ((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell(#{:08x})", self.0 as u32)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// A non-empty rectangle of values stored in row-major order.
///
/// Only [`Grid::new`] and [`Grid::from_fn`] construct grids, so the
/// dimensions always agree with the cell count.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Grid<T = Cell> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid from row-major cells.
    ///
    /// Fails if either dimension is zero or the cell count does not equal
    /// `width * height`.
    pub fn new(width: u32, height: u32, cells: Vec<T>) -> Result<Self, TypeError> {
        if width == 0 || height == 0 {
            return Err(TypeError::EmptyGrid { width, height });
        }
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(TypeError::CellCount {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every position.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> T,
    ) -> Result<Self, TypeError> {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self::new(width, height, cells)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The cell at column `x`, row `y`, if in bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width as usize)
    }
}

impl<T> fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_packing() {
        let c = Cell::from_argb(0xff, 0x10, 0x20, 0x30);
        assert_eq!(c.value() as u32, 0xff10_2030);
        assert_eq!(c.alpha(), 0xff);
        assert_eq!(c.rgb(), (0x10, 0x20, 0x30));
    }

    #[test]
    fn opaque_white_is_minus_one() {
        assert_eq!(Cell::from_argb(255, 255, 255, 255).value(), -1);
    }

    #[test]
    fn new_checks_cell_count() {
        let err = Grid::new(2, 2, vec![Cell::default(); 3]).unwrap_err();
        assert_eq!(
            err,
            TypeError::CellCount {
                width: 2,
                height: 2,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn new_rejects_zero_dimension() {
        assert!(matches!(
            Grid::<Cell>::new(0, 3, vec![]),
            Err(TypeError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn from_fn_is_row_major() {
        let g = Grid::from_fn(3, 2, |x, y| Cell::new((y * 10 + x) as i32)).unwrap();
        let values: Vec<i32> = g.cells().iter().map(|c| c.value()).collect();
        assert_eq!(values, vec![0, 1, 2, 10, 11, 12]);
        assert_eq!(g.get(2, 1), Some(&Cell::new(12)));
        assert_eq!(g.get(3, 0), None);
        assert_eq!(g.rows().count(), 2);
    }

    #[test]
    fn serializes_dimensions_and_cells() {
        let g = Grid::from_fn(2, 1, |x, _| Cell::new(x as i32)).unwrap();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["width"], 2);
        assert_eq!(json["height"], 1);
        assert_eq!(json["cells"], serde_json::json!([0, 1]));
    }
}
