use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Single axis used for board rows and columns.
pub type Coord = u8;

/// Two-dimensional size or position `(rows, cols)`.
pub type Coord2 = (Coord, Coord);

/// Count type used for tile counts and matched counts.
pub type TileCount = u16;

/// Linear position of a tile on the board, row-major.
pub type TileIndex = u16;

/// Identifies the two tiles that match each other.
pub type PairKey = u16;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> TileCount {
    let a = a as TileCount;
    let b = b as TileCount;
    a.saturating_mul(b)
}

/// Validated grid dimensions: both sides non-zero and an even tile count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BoardSize {
    rows: Coord,
    cols: Coord,
}

impl BoardSize {
    /// The sizes offered by the size picker, largest first.
    pub const PRESETS: [BoardSize; 3] = [
        BoardSize::new_unchecked(4, 4),
        BoardSize::new_unchecked(2, 4),
        BoardSize::new_unchecked(2, 2),
    ];

    pub(crate) const fn new_unchecked(rows: Coord, cols: Coord) -> Self {
        Self { rows, cols }
    }

    pub fn new(rows: Coord, cols: Coord) -> Result<Self> {
        if rows == 0 || cols == 0 || mult(rows, cols) % 2 != 0 {
            return Err(GameError::InvalidDimensions);
        }
        Ok(Self::new_unchecked(rows, cols))
    }

    pub const fn rows(self) -> Coord {
        self.rows
    }

    pub const fn cols(self) -> Coord {
        self.cols
    }

    pub const fn total_tiles(self) -> TileCount {
        mult(self.rows, self.cols)
    }

    pub const fn pair_count(self) -> TileCount {
        self.total_tiles() / 2
    }

    /// Row-major `(row, col)` of a linear index; the index is not bounds checked.
    pub const fn coords_of(self, index: TileIndex) -> Coord2 {
        let cols = self.cols as TileIndex;
        ((index / cols) as Coord, (index % cols) as Coord)
    }

    pub const fn index_of(self, (row, col): Coord2) -> TileIndex {
        row as TileIndex * self.cols as TileIndex + col as TileIndex
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self::PRESETS[0]
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for BoardSize {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let (rows, cols) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or(GameError::InvalidDimensions)?;
        let rows = rows.trim().parse().map_err(|_| GameError::InvalidDimensions)?;
        let cols = cols.trim().parse().map_err(|_| GameError::InvalidDimensions)?;
        Self::new(rows, cols)
    }
}

impl From<BoardSize> for String {
    fn from(size: BoardSize) -> Self {
        size.to_string()
    }
}

impl TryFrom<String> for BoardSize {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BoardSize> for Coord2 {
    fn from(size: BoardSize) -> Self {
        (size.rows, size.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_odd_and_empty_dimensions() {
        assert_eq!(BoardSize::new(3, 3), Err(GameError::InvalidDimensions));
        assert_eq!(BoardSize::new(0, 4), Err(GameError::InvalidDimensions));
        assert_eq!(BoardSize::new(4, 0), Err(GameError::InvalidDimensions));
        assert!(BoardSize::new(3, 2).is_ok());
    }

    #[test]
    fn parses_and_prints_rows_by_cols() {
        let size: BoardSize = "2x4".parse().unwrap();
        assert_eq!((size.rows(), size.cols()), (2, 4));
        assert_eq!(size.to_string(), "2x4");
        assert_eq!("3x3".parse::<BoardSize>(), Err(GameError::InvalidDimensions));
        assert_eq!("4by4".parse::<BoardSize>(), Err(GameError::InvalidDimensions));
    }

    #[test]
    fn serializes_as_string() {
        let size = BoardSize::new(2, 2).unwrap();
        assert_eq!(serde_json::to_string(&size).unwrap(), "\"2x2\"");
        let back: BoardSize = serde_json::from_str("\"4x4\"").unwrap();
        assert_eq!(back, BoardSize::new(4, 4).unwrap());
        assert!(serde_json::from_str::<BoardSize>("\"1x1\"").is_err());
    }

    #[test]
    fn linear_and_grid_indices_agree() {
        let size = BoardSize::new(2, 4).unwrap();
        for index in 0..size.total_tiles() {
            assert_eq!(size.index_of(size.coords_of(index)), index);
        }
        assert_eq!(size.coords_of(5), (1, 1));
    }
}
