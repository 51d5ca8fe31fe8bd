//! User preferences that survive deep sleep and power loss.
//!
//! Only the UI language is persisted. Storage is behind
//! [`PreferenceStore`]; the firmware keeps the encoded bytes in RTC memory,
//! the simulator and the tests in RAM.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::i18n::Language;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("failed to encode preferences: {0}")]
    Encode(postcard::Error),
    #[error("stored preferences are corrupt: {0}")]
    Decode(postcard::Error),
    #[error("preference storage unavailable: {0}")]
    Storage(&'static str),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub language: Language,
}

impl Preferences {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PreferencesError> {
        postcard::to_allocvec(self).map_err(PreferencesError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PreferencesError> {
        postcard::from_bytes(bytes).map_err(PreferencesError::Decode)
    }
}

pub trait PreferenceStore {
    /// `Ok(None)` when nothing has been saved since the last clear.
    fn load(&mut self) -> Result<Option<Preferences>, PreferencesError>;

    fn save(&mut self, preferences: &Preferences) -> Result<(), PreferencesError>;

    /// Forget everything, as after a factory reset.
    fn clear(&mut self) -> Result<(), PreferencesError>;
}

/// Keeps the encoded preferences in RAM.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored bytes, for inspection.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Replace the stored bytes verbatim.
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        self.bytes = Some(bytes.to_vec());
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&mut self) -> Result<Option<Preferences>, PreferencesError> {
        self.bytes
            .as_deref()
            .map(Preferences::from_bytes)
            .transpose()
    }

    fn save(&mut self, preferences: &Preferences) -> Result<(), PreferencesError> {
        self.bytes = Some(preferences.to_bytes()?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PreferencesError> {
        self.bytes = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let mut store = MemoryPreferenceStore::new();
        assert_eq!(store.load(), Ok(None));

        let prefs = Preferences {
            language: Language::Catalan,
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), Ok(Some(prefs)));

        store.clear().unwrap();
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn test_corrupt_bytes_are_reported() {
        let mut store = MemoryPreferenceStore::new();
        store.set_bytes(&[0x07]);
        assert!(matches!(store.load(), Err(PreferencesError::Decode(_))));
    }
}
