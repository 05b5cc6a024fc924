// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fatal host errors. Each one is terminal for the mount it interrupted.

use scorm_proto::{PackageStatus, ProxyUrlError};
use scorm_runtime::BackendError;
use thiserror::Error;

/// Why a mount (or a reload) could not produce playable content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Package metadata could not be fetched.
    #[error("package metadata unavailable: {0}")]
    PackageUnavailable(#[source] BackendError),
    /// Package exists but is not launchable yet (or failed processing).
    #[error("package is not ready (status: {status})")]
    PackageNotReady {
        /// Reported processing state.
        status: PackageStatus,
    },
    /// Package is ready but declares no launch resource.
    #[error("package has no launch url")]
    MissingLaunchUrl,
    /// Viewer ticket could not be issued.
    #[error("viewer ticket unavailable: {0}")]
    TicketUnavailable(#[source] BackendError),
    /// Launch path, ticket or package id cannot form a safe proxy URL.
    #[error("malformed launch: {0}")]
    MalformedLaunch(#[source] ProxyUrlError),
    /// Operation needs mounted content.
    #[error("no content is mounted")]
    NotMounted,
}
