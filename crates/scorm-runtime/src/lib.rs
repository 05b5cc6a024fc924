// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SCORM runtime bridge: a synchronous SCORM 1.2 / 2004 API object over an
//! asynchronous LMS tracking backend.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`session`] - `Uninitialized → Initialized → Terminated` state machine
//! - [`codes`] - error codes and standard message tables
//! - [`profile`] - fixed per-version function/error/element tables
//! - [`datamodel`] - last-known CMI element values and access rules
//! - [`backend`] - collaborator ports (tracking, package metadata, tickets)
//! - [`dispatch`] - fire-and-forget delivery of tracking calls
//! - [`adapter`] - the API object content calls
//! - [`registry`] - frame-keyed publication and content-side discovery

pub mod adapter;
pub mod backend;
pub mod codes;
pub mod datamodel;
pub mod dispatch;
pub mod profile;
pub mod registry;
pub mod session;

pub use adapter::{
    completion_channel, CompletionSink, ScormApi, ScormApiBuilder, SessionSnapshot, FALSE, TRUE,
};
pub use backend::{BackendError, PackageService, TrackingBackend};
pub use codes::ErrorCode;
pub use datamodel::Learner;
pub use dispatch::{DispatchError, Dispatcher, TrackingOutcome};
pub use profile::{profile_for, ApiFunction, VersionProfile, SCORM_12, SCORM_2004};
pub use registry::{ApiRegistry, FrameChain, FrameRef, Publication};
pub use session::{Lifecycle, RuntimeSession};
