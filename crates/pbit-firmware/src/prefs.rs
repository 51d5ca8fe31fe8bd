//! Preferences kept in RTC fast memory, which survives deep sleep and
//! software resets but not a power cycle.

use pbit_core::prefs::{PreferenceStore, Preferences, PreferencesError};

const MAGIC: u32 = 0x5042_4954; // "PBIT"
const CAPACITY: usize = 32;

struct Slot {
    magic: u32,
    len: u8,
    bytes: [u8; CAPACITY],
}

impl Slot {
    const fn empty() -> Self {
        Self {
            magic: 0,
            len: 0,
            bytes: [0; CAPACITY],
        }
    }
}

#[esp_hal::ram(unstable(rtc_fast))]
static mut SLOT: Slot = Slot::empty();

/// Only one instance may exist; the firmware creates it once in `main`.
pub struct RtcPreferenceStore {
    _private: (),
}

impl RtcPreferenceStore {
    /// # Safety
    /// The caller must not create a second store while this one is alive.
    pub unsafe fn take() -> Self {
        Self { _private: () }
    }

    fn slot(&mut self) -> &mut Slot {
        // SAFETY: `take` hands out a single store, and `&mut self` makes
        // its accesses exclusive.
        unsafe { &mut *(&raw mut SLOT) }
    }
}

impl PreferenceStore for RtcPreferenceStore {
    fn load(&mut self) -> Result<Option<Preferences>, PreferencesError> {
        let slot = self.slot();
        if slot.magic != MAGIC {
            return Ok(None);
        }
        let len = slot.len as usize;
        if len > CAPACITY {
            return Err(PreferencesError::Storage("stored length out of range"));
        }
        Preferences::from_bytes(&slot.bytes[..len]).map(Some)
    }

    fn save(&mut self, preferences: &Preferences) -> Result<(), PreferencesError> {
        let slot = self.slot();
        slot.magic = 0;
        let used = postcard::to_slice(preferences, &mut slot.bytes)
            .map_err(PreferencesError::Encode)?
            .len();
        slot.len = used as u8;
        slot.magic = MAGIC;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PreferencesError> {
        *self.slot() = Slot::empty();
        Ok(())
    }
}
