// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted gateway preferences; command-line flags take precedence.

use anyhow::{bail, Context, Result};
use scorm_app_core::{ConfigService, ConfigStore};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Config key for [`GatewayPrefs`].
pub const GATEWAY_PREFS_KEY: &str = "proxy_gateway";

/// Gateway preferences as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayPrefs {
    /// Listen address for content requests.
    pub listen: SocketAddr,
    /// Base URL of package storage; content lives under `scorm/content/{id}/`.
    pub upstream: String,
    /// Upstream request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for GatewayPrefs {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8788)),
            upstream: "http://localhost:8080/api/".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Effective gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Listen address.
    pub listen: SocketAddr,
    /// Upstream base; always ends with `/`.
    pub upstream: Url,
    /// Upstream request timeout.
    pub request_timeout: Duration,
}

/// Flag values overriding stored prefs.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--listen`.
    pub listen: Option<SocketAddr>,
    /// `--upstream`.
    pub upstream: Option<Url>,
}

impl GatewayPrefs {
    /// Load from `service`, persisting defaults when absent.
    ///
    /// Unreadable prefs fall back to defaults with a warning; the bad blob is
    /// left in place.
    pub fn load<S: ConfigStore>(service: &ConfigService<S>) -> Self {
        match service.load_or_init(GATEWAY_PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(%err, "gateway prefs unavailable; using defaults");
                Self::default()
            }
        }
    }

    /// Apply `overrides` and validate.
    pub fn resolve(&self, overrides: Overrides) -> Result<GatewaySettings> {
        let mut upstream = match overrides.upstream {
            Some(url) => url,
            None => Url::parse(&self.upstream)
                .with_context(|| format!("parse upstream url {:?}", self.upstream))?,
        };
        if upstream.cannot_be_a_base() {
            bail!("upstream {upstream} cannot be used as a base url");
        }
        if !upstream.path().ends_with('/') {
            let path = format!("{}/", upstream.path());
            upstream.set_path(&path);
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be positive");
        }
        Ok(GatewaySettings {
            listen: overrides.listen.unwrap_or(self.listen),
            upstream,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        })
    }
}
