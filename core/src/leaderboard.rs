use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::*;

/// Number of entries kept in the ranking.
pub const LEADERBOARD_CAPACITY: usize = 5;

/// Longest player name accepted, in characters.
pub const MAX_PLAYER_NAME_LEN: usize = 32;

/// One finished game. The serialized field names are part of the stored format.
///
/// Deserializing goes through [`LeaderboardEntry::new`], so a stored entry
/// breaking the rules never loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct LeaderboardEntry {
    #[serde(rename = "name")]
    player_name: String,
    attempts: u32,
    #[serde(rename = "time")]
    time_secs: f64,
    #[serde(rename = "size")]
    board_size: BoardSize,
}

#[derive(Deserialize)]
struct RawEntry {
    name: String,
    attempts: u32,
    time: f64,
    size: BoardSize,
}

impl TryFrom<RawEntry> for LeaderboardEntry {
    type Error = GameError;

    fn try_from(raw: RawEntry) -> Result<Self> {
        Self::new(raw.name, raw.attempts, raw.time, raw.size)
    }
}

impl LeaderboardEntry {
    /// The name is kept as given; it must hold 1 to [`MAX_PLAYER_NAME_LEN`] characters.
    pub fn new(
        player_name: impl Into<String>,
        attempts: u32,
        time_secs: f64,
        board_size: BoardSize,
    ) -> Result<Self> {
        let player_name = player_name.into();
        let name_len = player_name.chars().count();
        if name_len == 0 || name_len > MAX_PLAYER_NAME_LEN {
            return Err(GameError::InvalidEntry);
        }
        if attempts == 0 || !time_secs.is_finite() || time_secs <= 0.0 {
            return Err(GameError::InvalidEntry);
        }

        Ok(Self {
            player_name,
            attempts,
            time_secs,
            board_size,
        })
    }

    pub fn from_score(player_name: impl Into<String>, score: &FinalScore) -> Result<Self> {
        Self::new(player_name, score.attempts, score.time_secs(), score.size)
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn board_size(&self) -> BoardSize {
        self.board_size
    }
}

/// One element of a stored table. Entries that fail validation or do not parse
/// are kept as `Rejected` so the rest of the table still loads.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Valid(LeaderboardEntry),
    Rejected(serde::de::IgnoredAny),
}

/// Drops rejected elements of a loaded table.
pub fn retain_valid(stored: Vec<StoredEntry>) -> Vec<LeaderboardEntry> {
    let total = stored.len();
    let entries: Vec<_> = stored
        .into_iter()
        .filter_map(|entry| match entry {
            StoredEntry::Valid(entry) => Some(entry),
            StoredEntry::Rejected(_) => None,
        })
        .collect();
    if entries.len() < total {
        log::warn!("dropped {} invalid leaderboard entries", total - entries.len());
    }
    entries
}

/// Backing store for the ranking, usually provided by the host environment.
pub trait LeaderboardStorage {
    /// The stored table, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>>;

    fn save(&mut self, entries: &[LeaderboardEntry]) -> Result<()>;
}

/// In-memory store keeping the table as a JSON string, the same shape the
/// browser store writes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStorage {
    json: Option<String>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            unavailable: false,
        }
    }

    /// A store whose every read and write fails.
    pub fn unavailable() -> Self {
        Self {
            json: None,
            unavailable: true,
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.unavailable = !available;
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(GameError::StorageUnavailable)
        } else {
            Ok(())
        }
    }
}

impl LeaderboardStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>> {
        self.check_available()?;
        let Some(json) = self.json.as_deref() else {
            return Ok(None);
        };
        match serde_json::from_str(json) {
            Ok(stored) => Ok(Some(retain_valid(stored))),
            Err(err) => {
                log::warn!("discarding unreadable leaderboard: {}", err);
                Ok(None)
            }
        }
    }

    fn save(&mut self, entries: &[LeaderboardEntry]) -> Result<()> {
        self.check_available()?;
        let json = serde_json::to_string(entries).map_err(|_| GameError::StorageUnavailable)?;
        self.json = Some(json);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordOutcome {
    /// 1-based position of the new entry, `None` if it did not make the table.
    pub rank: Option<usize>,
    pub entries: Vec<LeaderboardEntry>,
}

/// The top-[`LEADERBOARD_CAPACITY`] table, fastest first, across all board sizes.
///
/// Every `record` is a single load, insert, truncate and save under one lock so
/// two games finishing together cannot drop each other's result.
#[derive(Debug, Default)]
pub struct Leaderboard<S> {
    storage: Mutex<S>,
}

impl<S: LeaderboardStorage> Leaderboard<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // a panic mid-record leaves the stored table as it was, so the guard is still usable
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access to the backing store.
    pub fn with_storage<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock())
    }

    /// The current table, empty if nothing is stored or the store fails.
    pub fn read(&self) -> Vec<LeaderboardEntry> {
        match self.lock().load() {
            Ok(entries) => entries.map(ranked).unwrap_or_default(),
            Err(err) => {
                log::warn!("leaderboard unavailable: {}", err);
                Vec::new()
            }
        }
    }

    pub fn record(&self, entry: LeaderboardEntry) -> Result<RecordOutcome> {
        let mut storage = self.lock();
        let mut entries = ranked(storage.load()?.unwrap_or_default());

        // ties go after existing entries, same as appending then stable sorting
        let position = entries.partition_point(|e| e.time_secs <= entry.time_secs);
        log::debug!(
            "recording {} / {} / {}s / {} at position {}",
            entry.player_name,
            entry.attempts,
            entry.time_secs,
            entry.board_size,
            position + 1
        );
        entries.insert(position, entry);
        entries.truncate(LEADERBOARD_CAPACITY);

        storage.save(&entries)?;

        Ok(RecordOutcome {
            rank: (position < LEADERBOARD_CAPACITY).then_some(position + 1),
            entries,
        })
    }
}

/// Stable ascending sort by time, truncated to capacity.
fn ranked(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
    entries.truncate(LEADERBOARD_CAPACITY);
    entries
}
