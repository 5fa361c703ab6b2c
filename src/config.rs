//! Support for library configuration options
//!
//! There are no global settings: build a [`Settings`] and hand it to the types that need it.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a single write may take before it is reported as failed
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the user must stop typing before a location search is sent
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(600);
/// Shorter search queries are not sent to the geocoder
pub const DEFAULT_SEARCH_MIN_CHARS: usize = 3;
/// Maximum number of addresses a location search returns
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// In milliseconds
    pub write_timeout_ms: u64,
    /// In milliseconds
    pub search_debounce_ms: u64,
    pub search_min_chars: usize,
    pub search_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT.as_millis() as u64,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            search_min_chars: DEFAULT_SEARCH_MIN_CHARS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing keys keep their default value
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let file = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => file,
        };
        let settings = serde_json::from_reader(file)?;
        log::debug!("Loaded settings from {:?}: {:?}", path, settings);
        Ok(settings)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
