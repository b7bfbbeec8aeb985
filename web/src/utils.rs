use gloo::storage::{LocalStorage, Storage};
use memento_core::round_centis;
use serde::{Serialize, de::DeserializeOwned};

/// Values persisted in the browser under a fixed key.
pub(crate) trait StorageKey {
    const KEY: &'static str;
}

pub(crate) trait LocalOrDefault: Sized {
    /// Loads the stored value, falling back to the default when missing or unreadable.
    fn local_or_default() -> Self;

    fn local_save(&self);
}

impl<T> LocalOrDefault for T
where
    T: StorageKey + Default + Serialize + DeserializeOwned,
{
    fn local_or_default() -> Self {
        if !local_storage_available() {
            return Self::default();
        }
        LocalStorage::get(T::KEY).unwrap_or_default()
    }

    fn local_save(&self) {
        if !local_storage_available() {
            log::warn!("local storage unavailable, {} not saved", T::KEY);
            return;
        }
        if let Err(err) = LocalStorage::set(T::KEY, self) {
            log::error!("Could not save {} to local storage: {:?}", T::KEY, err);
        }
    }
}

/// gloo panics when the browser refuses access to local storage, check first.
pub(crate) fn local_storage_available() -> bool {
    matches!(gloo::utils::window().local_storage(), Ok(Some(_)))
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

/// Seconds with two decimals, the way times are scored.
pub(crate) fn format_secs(secs: f64) -> String {
    format!("{:.2}", round_centis(secs))
}
