use core::ops::{Index, IndexMut};
use core::time::Duration;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

pub use clock::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use leaderboard::*;
pub use session::*;
pub use tile::*;
pub use types::*;

mod clock;
mod engine;
mod error;
mod generator;
mod leaderboard;
mod session;
mod tile;
mod types;

/// How long a mismatched pair stays face-up before flipping back.
pub const DEFAULT_RESOLUTION_DELAY: Duration = Duration::from_millis(1000);

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: BoardSize,
    pub resolution_delay: Duration,
}

impl GameConfig {
    pub const fn new(size: BoardSize) -> Self {
        Self {
            size,
            resolution_delay: DEFAULT_RESOLUTION_DELAY,
        }
    }

    pub const fn with_resolution_delay(self, resolution_delay: Duration) -> Self {
        Self {
            resolution_delay,
            ..self
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(BoardSize::default())
    }
}

/// The tiles of one game laid out row-major on a `rows x cols` grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    size: BoardSize,
    tiles: Array2<Tile>,
}

impl Board {
    /// Builds a board from pair keys in row-major order; the tile `id` is its position.
    pub fn from_pair_keys(size: BoardSize, pair_keys: &[PairKey]) -> Result<Self> {
        if pair_keys.len() != usize::from(size.total_tiles()) {
            return Err(GameError::InvalidBoard);
        }

        let mut occurrences = vec![0u8; usize::from(size.pair_count())];
        for &key in pair_keys {
            let seen = occurrences
                .get_mut(usize::from(key))
                .ok_or(GameError::InvalidBoard)?;
            *seen += 1;
            if *seen > 2 {
                return Err(GameError::InvalidBoard);
            }
        }
        // with len == 2 * pairs and no key seen more than twice, every key is seen exactly twice

        let tiles = pair_keys
            .iter()
            .zip(0..)
            .map(|(&key, id)| Tile::new(id, key))
            .collect();
        let tiles = Array2::from_shape_vec(Coord2::from(size).to_nd_index(), tiles)
            .map_err(|_| GameError::InvalidBoard)?;

        Ok(Self { size, tiles })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn len(&self) -> TileCount {
        self.size.total_tiles()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate_index(&self, index: TileIndex) -> Result<TileIndex> {
        if index < self.len() {
            Ok(index)
        } else {
            Err(GameError::InvalidTileIndex)
        }
    }

    pub fn tile(&self, index: TileIndex) -> Option<Tile> {
        self.validate_index(index).ok().map(|index| self[index])
    }

    pub fn tile_at(&self, coords: Coord2) -> Tile {
        self.tiles[coords.to_nd_index()]
    }

    /// Tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Rows top to bottom, for rendering the grid.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, Tile>> {
        self.tiles.rows().into_iter()
    }

    pub fn pair_keys(&self) -> Vec<PairKey> {
        self.iter().map(|tile| tile.pair_key).collect()
    }

    pub fn matched_count(&self) -> TileCount {
        self.iter().filter(|tile| tile.matched).count() as TileCount
    }
}

impl Index<TileIndex> for Board {
    type Output = Tile;

    fn index(&self, index: TileIndex) -> &Self::Output {
        &self.tiles[self.size.coords_of(index).to_nd_index()]
    }
}

impl IndexMut<TileIndex> for Board {
    fn index_mut(&mut self, index: TileIndex) -> &mut Self::Output {
        &mut self.tiles[self.size.coords_of(index).to_nd_index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SelectOutcome {
    NoChange,
    /// First tile of a pair turned face-up.
    Flipped,
    Matched,
    /// Two different tiles are face-up until the ticket is resolved.
    Mismatched(PendingResolution),
    Completed(FinalScore),
}

impl SelectOutcome {
    pub const fn has_update(self) -> bool {
        use SelectOutcome::*;
        match self {
            NoChange => false,
            Flipped => true,
            Matched => true,
            Mismatched(_) => true,
            Completed(_) => true,
        }
    }

    pub const fn pending(self) -> Option<PendingResolution> {
        match self {
            Self::Mismatched(pending) => Some(pending),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResolveOutcome {
    NoChange,
    FlippedBack,
}

impl ResolveOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::FlippedBack => true,
        }
    }
}
