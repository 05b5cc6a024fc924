// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Player preferences: where the LMS API lives and how the content host
//! composes proxy URLs.

use scorm_proto::ScormVersion;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Config key under which [`PlayerPrefs`] are stored.
pub const PLAYER_PREFS_KEY: &str = "player";

/// Persisted, unvalidated player preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPrefs {
    /// Base URL of the LMS REST API (tracking, packages, tickets).
    pub api_base: String,
    /// Origin the player page is served from; proxy URLs are built on it.
    pub origin: String,
    /// Version used when the embedding page does not specify one.
    pub default_version: ScormVersion,
    /// Bearer token attached to backend calls, if the deployment needs one.
    pub bearer_token: Option<String>,
    /// Per-request timeout for backend calls, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/api/".to_string(),
            origin: "http://localhost:3000".to_string(),
            default_version: ScormVersion::Scorm12,
            bearer_token: None,
            request_timeout_ms: 10_000,
        }
    }
}

/// Reasons preferences cannot be turned into settings.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// A URL field failed to parse.
    #[error("{field} is not a valid url: {source}")]
    Url {
        /// Offending field.
        field: &'static str,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// A URL field parsed but cannot serve as a base.
    #[error("{field} cannot be used as a base url")]
    NotABase {
        /// Offending field.
        field: &'static str,
    },
    /// Timeout of zero.
    #[error("request timeout must be positive")]
    ZeroTimeout,
}

/// Validated player settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    /// LMS API base; always ends with `/` so relative joins append.
    pub api_base: Url,
    /// Page origin.
    pub origin: Url,
    /// Fallback version.
    pub default_version: ScormVersion,
    /// Optional bearer token.
    pub bearer_token: Option<String>,
    /// Backend request timeout.
    pub request_timeout: Duration,
}

impl PlayerPrefs {
    /// Parse and check every field.
    pub fn validate(&self) -> Result<PlayerSettings, PrefsError> {
        let mut api_base = parse_base("api_base", &self.api_base)?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }
        let origin = parse_base("origin", &self.origin)?;
        if self.request_timeout_ms == 0 {
            return Err(PrefsError::ZeroTimeout);
        }
        Ok(PlayerSettings {
            api_base,
            origin,
            default_version: self.default_version,
            bearer_token: self.bearer_token.clone().filter(|t| !t.is_empty()),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        })
    }
}

fn parse_base(field: &'static str, raw: &str) -> Result<Url, PrefsError> {
    let url = Url::parse(raw.trim()).map_err(|source| PrefsError::Url { field, source })?;
    if url.cannot_be_a_base() {
        return Err(PrefsError::NotABase { field });
    }
    Ok(url)
}
