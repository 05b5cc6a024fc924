// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fire-and-forget delivery of tracking calls.
//!
//! Every call becomes its own task on the runtime. The caller gets nothing
//! back; failures are logged and mapped to the generic failure reply. Calls
//! carry no ordering guarantee relative to each other.

use crate::backend::TrackingBackend;
use scorm_proto::{PackageId, TrackingCall, TrackingOp, TrackingReply};
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

/// Dispatcher construction failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Built outside a Tokio runtime and no handle was supplied.
    #[error("no tokio runtime available for background tracking calls")]
    NoRuntime,
}

/// Result of one background tracking call, as seen after completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingOutcome {
    /// Package the call was scoped to.
    pub package_id: PackageId,
    /// Endpoint kind.
    pub op: TrackingOp,
    /// Backend reply, or the generic failure shape when the call failed.
    pub reply: TrackingReply,
}

struct Inner {
    backend: Arc<dyn TrackingBackend>,
    runtime: Handle,
    in_flight: AtomicUsize,
    idle: Notify,
    observer: Mutex<Option<mpsc::UnboundedSender<TrackingOutcome>>>,
}

/// Cheap-to-clone handle spawning tracking calls in the background.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter even if the task unwinds.
struct InFlight(Arc<Inner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl Dispatcher {
    /// Dispatcher spawning onto `runtime`.
    pub fn new(backend: Arc<dyn TrackingBackend>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                runtime,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Dispatcher spawning onto the runtime of the calling context.
    pub fn current(backend: Arc<dyn TrackingBackend>) -> Result<Self, DispatchError> {
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        Ok(Self::new(backend, runtime))
    }

    /// Route every later outcome to the returned receiver (replaces any previous observer).
    pub fn observe(&self) -> mpsc::UnboundedReceiver<TrackingOutcome> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// Number of calls spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Spawn `call` without waiting for it.
    pub fn dispatch(&self, package_id: &PackageId, call: TrackingCall) {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(Arc::clone(&self.inner));
        let package_id = package_id.clone();
        self.inner.runtime.spawn(async move {
            let inner = Arc::clone(&guard.0);
            let op = call.op();
            let reply = match inner.backend.track(&package_id, &call).await {
                Ok(reply) if reply.is_success() => {
                    debug!(package_id = %package_id, %op, "tracking call accepted");
                    reply
                }
                Ok(reply) => {
                    warn!(
                        package_id = %package_id,
                        %op,
                        error_code = %reply.error_code,
                        "tracking call rejected by backend"
                    );
                    reply
                }
                Err(err) => {
                    warn!(package_id = %package_id, %op, %err, "tracking call failed");
                    TrackingReply::failure()
                }
            };
            inner.publish(TrackingOutcome {
                package_id,
                op,
                reply,
            });
            drop(guard);
        });
    }

    /// Wait until every spawned call has finished.
    pub async fn settle(&self) {
        loop {
            let mut notified = pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn publish(&self, outcome: TrackingOutcome) {
        let mut observer = self.observer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = observer.as_ref() {
            if tx.send(outcome).is_err() {
                *observer = None;
            }
        }
    }
}
