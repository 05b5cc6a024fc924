// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the SCORM bridge (config store port,
//! player preferences). Keeps the host and binaries free of storage details.

pub mod config;
pub mod prefs;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use prefs::{PlayerPrefs, PlayerSettings, PrefsError, PLAYER_PREFS_KEY};
