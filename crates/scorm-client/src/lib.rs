// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `reqwest` implementation of the LMS collaborator surface.
#![forbid(unsafe_code)]
//!
//! All paths are relative to a configurable API base:
//!
//! | call | request |
//! | --- | --- |
//! | package metadata | `GET scorm/packages/{id}` |
//! | viewer ticket | `POST scorm/packages/{id}/viewer-ticket` |
//! | tracking | `POST scorm/runtime/{id}/{initialize,terminate,commit,set-value}` |

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use scorm_app_core::PlayerSettings;
use scorm_proto::{PackageId, PackageMeta, TicketResponse, TrackingCall, TrackingReply, ViewerTicket};
use scorm_runtime::{BackendError, PackageService, TrackingBackend};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Client construction failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be built (TLS backend, ...).
    #[error("could not build http client: {0}")]
    Build(#[from] reqwest::Error),
    /// The API base cannot have paths appended.
    #[error("api base {0} cannot be used as a base url")]
    NotABase(Url),
}

/// LMS backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    api_base: Url,
    http: reqwest::Client,
    bearer_token: Option<String>,
}

impl HttpBackend {
    /// Backend at `api_base` with a default client.
    pub fn new(api_base: Url) -> Result<Self, ClientError> {
        if api_base.cannot_be_a_base() {
            return Err(ClientError::NotABase(api_base));
        }
        Ok(Self {
            api_base,
            http: reqwest::Client::new(),
            bearer_token: None,
        })
    }

    /// Backend configured from player settings (base, timeout, token).
    pub fn from_settings(settings: &PlayerSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        let mut backend = Self::new(settings.api_base.clone())?.with_http_client(http);
        backend.bearer_token.clone_from(&settings.bearer_token);
        Ok(backend)
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Attach `Authorization: Bearer {token}` to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// API base all endpoints are resolved against.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// `{api_base}/{segments...}` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Metadata of `package_id`.
    pub async fn fetch_package(&self, package_id: &PackageId) -> Result<PackageMeta, BackendError> {
        const OP: &str = "package metadata";
        let url = self.endpoint(&["scorm", "packages", package_id.as_str()]);
        let request = self.authorize(self.http.get(url));
        let response = send(request, OP).await?;
        decode(response, OP).await
    }

    /// Issue a viewer ticket for `package_id`.
    pub async fn request_ticket(&self, package_id: &PackageId) -> Result<ViewerTicket, BackendError> {
        const OP: &str = "viewer ticket";
        let url = self.endpoint(&["scorm", "packages", package_id.as_str(), "viewer-ticket"]);
        let request = self.authorize(self.http.post(url));
        let response = send(request, OP).await?;
        let body: TicketResponse = decode(response, OP).await?;
        Ok(body.ticket)
    }

    /// Deliver one tracking call.
    pub async fn post_tracking(
        &self,
        package_id: &PackageId,
        call: &TrackingCall,
    ) -> Result<TrackingReply, BackendError> {
        let op = call.op().path_segment();
        let url = self.endpoint(&["scorm", "runtime", package_id.as_str(), op]);
        let mut request = self.authorize(self.http.post(url));
        if let Some(body) = call.body() {
            request = request.json(body);
        }
        let response = send(request, op).await?;
        let reply: TrackingReply = decode(response, op).await?;
        debug!(package_id = %package_id, op, result = %reply.result, "tracking reply");
        Ok(reply)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    operation: &'static str,
) -> Result<reqwest::Response, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|err| BackendError::Transport {
            operation,
            detail: err.to_string(),
        })?;
    ensure_success(response, operation).await
}

/// Checks HTTP response status; returns the response on success or an error with details.
async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, BackendError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        operation,
        status,
        detail,
    })
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<T, BackendError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| BackendError::Transport {
            operation,
            detail: err.to_string(),
        })?;
    serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode {
        operation,
        detail: err.to_string(),
    })
}

impl TrackingBackend for HttpBackend {
    fn track<'a>(
        &'a self,
        package_id: &'a PackageId,
        call: &'a TrackingCall,
    ) -> BoxFuture<'a, Result<TrackingReply, BackendError>> {
        self.post_tracking(package_id, call).boxed()
    }
}

impl PackageService for HttpBackend {
    fn package<'a>(
        &'a self,
        package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<PackageMeta, BackendError>> {
        self.fetch_package(package_id).boxed()
    }

    fn issue_ticket<'a>(
        &'a self,
        package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<ViewerTicket, BackendError>> {
        self.request_ticket(package_id).boxed()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use scorm_app_core::PlayerPrefs;
    use std::time::Duration;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn endpoints_append_to_the_base_path() {
        let b = backend("https://lms.example.edu/api/");
        assert_eq!(
            b.endpoint(&["scorm", "packages", "pkg1"]).as_str(),
            "https://lms.example.edu/api/scorm/packages/pkg1"
        );
        let b = backend("https://lms.example.edu/api");
        assert_eq!(
            b.endpoint(&["scorm", "runtime", "pkg1", "set-value"]).as_str(),
            "https://lms.example.edu/api/scorm/runtime/pkg1/set-value"
        );
    }

    #[test]
    fn package_ids_cannot_inject_path_segments() {
        let b = backend("https://lms.example.edu/api/");
        let url = b.endpoint(&["scorm", "packages", "../admin?x=1"]);
        assert_eq!(url.path(), "/api/scorm/packages/..%2Fadmin%3Fx=1");
        assert!(url.query().is_none());
    }

    #[test]
    fn opaque_bases_are_rejected() {
        assert!(matches!(
            HttpBackend::new(Url::parse("mailto:lms@example.edu").unwrap()),
            Err(ClientError::NotABase(_))
        ));
    }

    #[test]
    fn settings_carry_token_and_base() {
        let settings = PlayerPrefs {
            api_base: "https://lms.example.edu/api".into(),
            bearer_token: Some("secret".into()),
            request_timeout_ms: 2_000,
            ..PlayerPrefs::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(2));
        let b = HttpBackend::from_settings(&settings).unwrap();
        assert_eq!(b.api_base().as_str(), "https://lms.example.edu/api/");
        assert_eq!(b.bearer_token.as_deref(), Some("secret"));
    }
}
