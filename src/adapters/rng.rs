//! Random source adapter.
//!
//! ESP-IDF: the hardware RNG (`esp_random`), which is seeded by RF noise
//! once the radio is up. Host: `RandomState` hasher output, which is
//! enough for simulated readings.

use crate::app::ports::RandomSource;

#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareRng;

impl HardwareRng {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    fn next_u32(&mut self) -> u32 {
        // SAFETY: no preconditions; reads the RNG data register.
        unsafe { esp_idf_svc::sys::esp_random() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_u32(&mut self) -> u32 {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};

        RandomState::new().build_hasher().finish() as u32
    }
}

impl RandomSource for HardwareRng {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let span = (i64::from(high) - i64::from(low)) as u64;
        let offset = u64::from(self.next_u32()) % span;
        (i64::from(low) + offset as i64) as i32
    }
}
