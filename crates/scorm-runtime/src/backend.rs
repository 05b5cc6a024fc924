// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collaborator ports: the LMS backend as seen by the bridge.
//!
//! `scorm-client` provides the HTTP adapter; `scorm-dry-tests` provides fakes.

use futures_util::future::BoxFuture;
use scorm_proto::{PackageId, PackageMeta, TrackingCall, TrackingReply, ViewerTicket};
use thiserror::Error;

/// Failure talking to the LMS backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Request never produced a response (connect, timeout, TLS, ...).
    #[error("transport error during {operation}: {detail}")]
    Transport {
        /// Operation being attempted.
        operation: &'static str,
        /// Underlying error text.
        detail: String,
    },
    /// Backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        /// Operation being attempted.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        detail: String,
    },
    /// Response body did not match the expected shape.
    #[error("could not decode {operation} response: {detail}")]
    Decode {
        /// Operation being attempted.
        operation: &'static str,
        /// Decoder error text.
        detail: String,
    },
}

/// Runtime tracking endpoints, one call per SCORM lifecycle or data event.
pub trait TrackingBackend: Send + Sync + 'static {
    /// Deliver one tracking call for `package_id`.
    fn track<'a>(
        &'a self,
        package_id: &'a PackageId,
        call: &'a TrackingCall,
    ) -> BoxFuture<'a, Result<TrackingReply, BackendError>>;
}

/// Package metadata and viewer-ticket endpoints used when a host mounts.
pub trait PackageService: Send + Sync + 'static {
    /// Fetch package metadata.
    fn package<'a>(
        &'a self,
        package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<PackageMeta, BackendError>>;

    /// Issue a viewer ticket for one browsing session of `package_id`.
    fn issue_ticket<'a>(
        &'a self,
        package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<ViewerTicket, BackendError>>;
}
