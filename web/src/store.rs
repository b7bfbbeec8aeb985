use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};
use js_sys::Reflect;
use memento_core::{
    GameError, Leaderboard, LeaderboardEntry, LeaderboardStorage, RecordOutcome, Result,
    StoredEntry, retain_valid,
};
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::LockManager;

use crate::utils::*;

/// Leaderboard kept in the browser's local storage as a JSON array.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct BrowserLeaderboard;

impl StorageKey for BrowserLeaderboard {
    const KEY: &'static str = "memento:best-players";
}

impl LeaderboardStorage for BrowserLeaderboard {
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>> {
        if !local_storage_available() {
            return Err(GameError::StorageUnavailable);
        }

        match LocalStorage::get::<Vec<StoredEntry>>(Self::KEY) {
            Ok(stored) => Ok(Some(retain_valid(stored))),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(StorageError::SerdeError(err)) => {
                log::warn!("discarding unreadable leaderboard: {}", err);
                Ok(None)
            }
            Err(err) => {
                log::error!("Could not load leaderboard: {:?}", err);
                Err(GameError::StorageUnavailable)
            }
        }
    }

    fn save(&mut self, entries: &[LeaderboardEntry]) -> Result<()> {
        if !local_storage_available() {
            return Err(GameError::StorageUnavailable);
        }

        LocalStorage::set(Self::KEY, entries).map_err(|err| {
            log::error!("Could not save leaderboard: {:?}", err);
            GameError::StorageUnavailable
        })
    }
}

/// Records `entry` while holding the Web Lock named after the storage key, so
/// tabs sharing local storage take turns at the load, insert and save.
///
/// `done` runs once the record went through; it never runs if the lock request fails.
pub(crate) fn record_exclusive(
    leaderboard: Arc<Leaderboard<BrowserLeaderboard>>,
    entry: LeaderboardEntry,
    done: impl FnOnce(Result<RecordOutcome>) + 'static,
) {
    let Some(locks) = lock_manager() else {
        log::warn!("Web Locks unavailable, recording without a cross-tab lock");
        done(leaderboard.record(entry));
        return;
    };

    // the lock is held until the callback returns, record is synchronous
    let callback = Closure::once_into_js(move || done(leaderboard.record(entry)));
    let request = locks.request(BrowserLeaderboard::KEY, callback.unchecked_ref());
    spawn_local(async move {
        if let Err(err) = JsFuture::from(request).await {
            log::error!("Could not lock leaderboard: {:?}", err);
        }
    });
}

/// `navigator.locks` is missing outside secure contexts.
fn lock_manager() -> Option<LockManager> {
    let navigator = gloo::utils::window().navigator();
    Reflect::get(&navigator, &JsValue::from_str("locks"))
        .ok()
        .filter(|locks| !locks.is_undefined() && !locks.is_null())
        .map(|locks| locks.unchecked_into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_is_namespaced() {
        assert_eq!(<BrowserLeaderboard as StorageKey>::KEY, "memento:best-players");
    }
}
