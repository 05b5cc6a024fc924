// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fakes for the LMS collaborator ports.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use scorm_proto::{
    PackageId, PackageMeta, PackageStatus, ScormVersion, TrackingCall, TrackingOp, TrackingReply,
    ViewerTicket,
};
use scorm_runtime::{BackendError, PackageService, TrackingBackend};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tracking backend that records every call and answers from a switch.
///
/// Calls are recorded when the dispatcher task reaches the backend; await
/// `Dispatcher::settle` before counting.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Recording>>,
}

#[derive(Default)]
struct Recording {
    calls: Vec<(PackageId, TrackingCall)>,
    failing: bool,
    rejecting: bool,
}

impl RecordingBackend {
    /// Backend accepting every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose calls fail at the transport level.
    pub fn failing() -> Self {
        let backend = Self::new();
        backend.set_failing(true);
        backend
    }

    /// Toggle transport failures for later calls.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Toggle backend-side rejections (`{result: "false", errorCode: "101"}`).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.lock().rejecting = rejecting;
    }

    /// Every call so far, in arrival order.
    pub fn calls(&self) -> Vec<(PackageId, TrackingCall)> {
        self.lock().calls.clone()
    }

    /// Operation kinds so far, in arrival order.
    pub fn ops(&self) -> Vec<TrackingOp> {
        self.lock().calls.iter().map(|(_, call)| call.op()).collect()
    }

    /// Number of calls of kind `op`.
    pub fn count(&self, op: TrackingOp) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(_, call)| call.op() == op)
            .count()
    }

    /// Total number of calls.
    pub fn total(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrackingBackend for RecordingBackend {
    fn track<'a>(
        &'a self,
        package_id: &'a PackageId,
        call: &'a TrackingCall,
    ) -> BoxFuture<'a, Result<TrackingReply, BackendError>> {
        let result = {
            let mut rec = self.lock();
            rec.calls.push((package_id.clone(), call.clone()));
            if rec.failing {
                Err(BackendError::Transport {
                    operation: call.op().path_segment(),
                    detail: "simulated connection reset".into(),
                })
            } else if rec.rejecting {
                Ok(TrackingReply::failure())
            } else {
                Ok(TrackingReply::success())
            }
        };
        async move { result }.boxed()
    }
}

/// Package service answering from scripted results and counting requests.
#[derive(Clone)]
pub struct ScriptedPackages {
    inner: Arc<Mutex<Script>>,
}

struct Script {
    meta: Result<PackageMeta, BackendError>,
    ticket: Result<ViewerTicket, BackendError>,
    package_requests: usize,
    ticket_requests: usize,
}

impl ScriptedPackages {
    /// Ready package with `launch_url`, declaring `version`, and ticket `ticket`.
    pub fn ready(launch_url: &str, version: ScormVersion, ticket: &str) -> Self {
        Self::scripted(
            Ok(PackageMeta {
                status: PackageStatus::Ready,
                launch_url: Some(launch_url.to_string()),
                version: Some(version),
                title: None,
            }),
            Ok(ViewerTicket::new(ticket)),
        )
    }

    /// Package stuck in `status`; tickets are still issued.
    pub fn with_status(status: PackageStatus) -> Self {
        Self::scripted(
            Ok(PackageMeta {
                status,
                launch_url: None,
                version: None,
                title: None,
            }),
            Ok(ViewerTicket::new("t")),
        )
    }

    /// Arbitrary scripted answers.
    pub fn scripted(
        meta: Result<PackageMeta, BackendError>,
        ticket: Result<ViewerTicket, BackendError>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Script {
                meta,
                ticket,
                package_requests: 0,
                ticket_requests: 0,
            })),
        }
    }

    /// Replace the ticket answer.
    pub fn set_ticket(&self, ticket: Result<ViewerTicket, BackendError>) {
        self.lock().ticket = ticket;
    }

    /// Replace the metadata answer.
    pub fn set_meta(&self, meta: Result<PackageMeta, BackendError>) {
        self.lock().meta = meta;
    }

    /// Metadata requests so far.
    pub fn package_requests(&self) -> usize {
        self.lock().package_requests
    }

    /// Ticket requests so far.
    pub fn ticket_requests(&self) -> usize {
        self.lock().ticket_requests
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PackageService for ScriptedPackages {
    fn package<'a>(
        &'a self,
        _package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<PackageMeta, BackendError>> {
        let result = {
            let mut script = self.lock();
            script.package_requests += 1;
            script.meta.clone()
        };
        async move { result }.boxed()
    }

    fn issue_ticket<'a>(
        &'a self,
        _package_id: &'a PackageId,
    ) -> BoxFuture<'a, Result<ViewerTicket, BackendError>> {
        let result = {
            let mut script = self.lock();
            script.ticket_requests += 1;
            script.ticket.clone()
        };
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn recording_backend_switches_between_answers() {
        let backend = RecordingBackend::new();
        let id = PackageId::new("pkg1");
        assert!(backend
            .track(&id, &TrackingCall::Initialize)
            .await
            .unwrap()
            .is_success());
        backend.set_rejecting(true);
        assert!(!backend
            .track(&id, &TrackingCall::Commit)
            .await
            .unwrap()
            .is_success());
        backend.set_failing(true);
        assert!(backend.track(&id, &TrackingCall::Terminate).await.is_err());
        assert_eq!(
            backend.ops(),
            vec![TrackingOp::Initialize, TrackingOp::Commit, TrackingOp::Terminate]
        );
        assert_eq!(backend.count(TrackingOp::SetValue), 0);
    }

    #[tokio::test]
    async fn scripted_packages_count_requests() {
        let packages = ScriptedPackages::ready("index.html", ScormVersion::Scorm12, "tkt");
        let id = PackageId::new("pkg1");
        let meta = packages.package(&id).await.unwrap();
        assert_eq!(meta.launch_url.as_deref(), Some("index.html"));
        assert_eq!(packages.issue_ticket(&id).await.unwrap().expose(), "tkt");
        packages.set_ticket(Err(BackendError::Status {
            operation: "viewer-ticket",
            status: 403,
            detail: String::new(),
        }));
        assert!(packages.issue_ticket(&id).await.is_err());
        assert_eq!(packages.package_requests(), 1);
        assert_eq!(packages.ticket_requests(), 2);
    }
}
