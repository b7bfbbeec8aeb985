use serde::{Deserialize, Serialize};

use crate::{PairKey, TileIndex};

/// A single card on the board. Identity is fixed, only the flags change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileIndex,
    pub pair_key: PairKey,
    pub face_up: bool,
    pub matched: bool,
}

impl Tile {
    pub const fn new(id: TileIndex, pair_key: PairKey) -> Self {
        Self {
            id,
            pair_key,
            face_up: false,
            matched: false,
        }
    }

    /// Whether a click on this tile may flip it.
    pub const fn is_selectable(self) -> bool {
        !self.face_up && !self.matched
    }

    pub const fn matches(self, other: Tile) -> bool {
        self.id != other.id && self.pair_key == other.pair_key
    }
}
