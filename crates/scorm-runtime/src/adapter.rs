// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synchronous SCORM API object handed to third-party content.
//!
//! Every call returns immediately from local state. Backend persistence is
//! dispatched in the background and never awaited. No call panics or returns
//! an error type: failures are encoded in the return value and the last
//! error code, as the SCORM contract requires.

use crate::codes::ErrorCode;
use crate::datamodel::{AccessError, DataModel, Learner};
use crate::dispatch::Dispatcher;
use crate::profile::{profile_for, ApiFunction, VersionProfile};
use crate::session::{Lifecycle, RuntimeSession, Transition};
use scorm_proto::{PackageId, ScormVersion, TrackingCall};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

/// SCORM boolean success.
pub const TRUE: &str = "true";
/// SCORM boolean failure.
pub const FALSE: &str = "false";

/// Shared sink for the completion projection; survives API rebuilds.
pub type CompletionSink = Arc<watch::Sender<Option<String>>>;

/// Create a completion sink and its first receiver.
pub fn completion_channel() -> (CompletionSink, watch::Receiver<Option<String>>) {
    let (tx, rx) = watch::channel(None);
    (Arc::new(tx), rx)
}

/// Point-in-time view of the session behind an API object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
    /// Last recorded error code.
    pub last_error: ErrorCode,
}

impl SessionSnapshot {
    /// True between initialize and terminate.
    pub fn initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Initialized
    }

    /// True once terminated.
    pub fn terminated(&self) -> bool {
        self.lifecycle == Lifecycle::Terminated
    }
}

struct Core {
    session: RuntimeSession,
    model: DataModel,
    completion: Option<String>,
}

/// Version-specific SCORM runtime API bound to one package and one session.
pub struct ScormApi {
    profile: &'static VersionProfile,
    package_id: PackageId,
    core: Mutex<Core>,
    dispatcher: Dispatcher,
    completion: CompletionSink,
}

impl std::fmt::Debug for ScormApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScormApi")
            .field("version", &self.profile.version)
            .field("package_id", &self.package_id)
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ScormApi`].
pub struct ScormApiBuilder {
    version: ScormVersion,
    package_id: PackageId,
    dispatcher: Dispatcher,
    learner: Option<Learner>,
    completion: Option<CompletionSink>,
}

impl ScormApiBuilder {
    /// Seed the learner id/name elements.
    pub fn learner(mut self, learner: Learner) -> Self {
        self.learner = Some(learner);
        self
    }

    /// Mirror completion writes into `sink` instead of a private channel.
    pub fn completion(mut self, sink: CompletionSink) -> Self {
        self.completion = Some(sink);
        self
    }

    /// Select the version profile and build a fresh, uninitialized API.
    pub fn build(self) -> ScormApi {
        let profile = profile_for(self.version);
        let completion = self.completion.unwrap_or_else(|| completion_channel().0);
        ScormApi {
            profile,
            package_id: self.package_id,
            core: Mutex::new(Core {
                session: RuntimeSession::new(),
                model: DataModel::seeded(&profile.elements, self.learner.as_ref()),
                completion: None,
            }),
            dispatcher: self.dispatcher,
            completion,
        }
    }
}

impl ScormApi {
    /// Start building an API for `version` and `package_id`.
    pub fn builder(
        version: ScormVersion,
        package_id: PackageId,
        dispatcher: Dispatcher,
    ) -> ScormApiBuilder {
        ScormApiBuilder {
            version,
            package_id,
            dispatcher,
            learner: None,
            completion: None,
        }
    }

    /// Profile selected at construction.
    pub fn profile(&self) -> &'static VersionProfile {
        self.profile
    }

    /// Package this API reports for.
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    /// Dispatcher carrying this API's tracking calls.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current lifecycle and last error.
    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.lock();
        SessionSnapshot {
            lifecycle: core.session.lifecycle(),
            last_error: core.session.last_error(),
        }
    }

    /// Last completion/success/lesson status written through this API.
    pub fn completion_status(&self) -> Option<String> {
        self.lock().completion.clone()
    }

    /// Subscribe to completion changes.
    pub fn subscribe_completion(&self) -> watch::Receiver<Option<String>> {
        self.completion.subscribe()
    }

    /// `LMSInitialize("")` / `Initialize("")`.
    pub fn initialize(&self, arg: &str) -> &'static str {
        let codes = &self.profile.codes;
        let mut core = self.lock();
        if !arg.is_empty() {
            core.session.fail(codes.argument);
            return FALSE;
        }
        match core.session.initialize(codes) {
            Ok(Transition::Changed) => {
                drop(core);
                info!(package_id = %self.package_id, version = %self.profile.version, "scorm session initialized");
                self.dispatcher
                    .dispatch(&self.package_id, TrackingCall::Initialize);
                TRUE
            }
            Ok(Transition::Unchanged) => TRUE,
            Err(_) => FALSE,
        }
    }

    /// `LMSFinish("")` / `Terminate("")`.
    pub fn terminate(&self, arg: &str) -> &'static str {
        let codes = &self.profile.codes;
        let mut core = self.lock();
        if !arg.is_empty() {
            core.session.fail(codes.argument);
            return FALSE;
        }
        match core.session.terminate(codes) {
            Ok(_) => {
                drop(core);
                info!(package_id = %self.package_id, "scorm session terminated");
                self.dispatcher
                    .dispatch(&self.package_id, TrackingCall::Terminate);
                TRUE
            }
            Err(_) => FALSE,
        }
    }

    /// `LMSGetValue(element)` / `GetValue(element)`.
    pub fn get_value(&self, element: &str) -> String {
        let codes = &self.profile.codes;
        let mut core = self.lock();
        if core
            .session
            .require_initialized(codes.get_not_initialized)
            .is_err()
        {
            return String::new();
        }
        match core.model.read(element) {
            Ok(value) => {
                core.session.succeed();
                value
            }
            Err(err) => {
                let code = match err {
                    AccessError::EmptyElement => codes.get_empty_element,
                    AccessError::WriteOnly => codes.write_only,
                    AccessError::Keyword | AccessError::ReadOnly | AccessError::TypeMismatch => {
                        codes.general
                    }
                };
                core.session.fail(code);
                String::new()
            }
        }
    }

    /// `LMSSetValue(element, value)` / `SetValue(element, value)`.
    pub fn set_value(&self, element: &str, value: &str) -> &'static str {
        let codes = &self.profile.codes;
        let mut core = self.lock();
        if core
            .session
            .require_initialized(codes.set_not_initialized)
            .is_err()
        {
            return FALSE;
        }
        match core.model.write(element, value) {
            Ok(write) => {
                core.session.succeed();
                if write.completion {
                    core.completion = Some(value.to_string());
                    self.completion.send_replace(Some(value.to_string()));
                }
                drop(core);
                debug!(package_id = %self.package_id, element, "scorm value set");
                self.dispatcher
                    .dispatch(&self.package_id, TrackingCall::set_value(element, value));
                TRUE
            }
            Err(err) => {
                let code = match err {
                    AccessError::EmptyElement => codes.set_empty_element,
                    AccessError::Keyword => codes.set_keyword,
                    AccessError::ReadOnly => codes.read_only,
                    AccessError::TypeMismatch => codes.type_mismatch,
                    AccessError::WriteOnly => codes.general,
                };
                core.session.fail(code);
                FALSE
            }
        }
    }

    /// `LMSCommit("")` / `Commit("")`.
    pub fn commit(&self, arg: &str) -> &'static str {
        let codes = &self.profile.codes;
        let mut core = self.lock();
        if core
            .session
            .require_initialized(codes.commit_not_initialized)
            .is_err()
        {
            return FALSE;
        }
        if !arg.is_empty() {
            core.session.fail(codes.argument);
            return FALSE;
        }
        core.session.succeed();
        drop(core);
        self.dispatcher
            .dispatch(&self.package_id, TrackingCall::Commit);
        TRUE
    }

    /// `LMSGetLastError()` / `GetLastError()`; no side effect.
    pub fn get_last_error(&self) -> String {
        self.lock().session.last_error().to_string()
    }

    /// `LMSGetErrorString(code)` / `GetErrorString(code)`; pure.
    pub fn get_error_string(&self, code: &str) -> String {
        self.profile.codes.error_string(code)
    }

    /// `LMSGetDiagnostic(code)` / `GetDiagnostic(code)`; pure.
    pub fn get_diagnostic(&self, code: &str) -> String {
        self.profile.codes.diagnostic(code)
    }

    /// Call by conventional function name, as content does.
    ///
    /// Only names from this API's own version table resolve. A missing single
    /// argument is read as `""`.
    pub fn invoke(&self, name: &str, args: &[&str]) -> String {
        let Some(function) = self.profile.resolve(name) else {
            debug!(name, version = %self.profile.version, "unknown scorm function");
            self.lock().session.fail(self.profile.codes.general);
            return FALSE.to_string();
        };
        let single = match args {
            [] => Some(""),
            [arg] => Some(*arg),
            _ => None,
        };
        match (function, single) {
            (ApiFunction::Initialize, Some(arg)) => self.initialize(arg).to_string(),
            (ApiFunction::Terminate, Some(arg)) => self.terminate(arg).to_string(),
            (ApiFunction::Commit, Some(arg)) => self.commit(arg).to_string(),
            (ApiFunction::GetValue, Some(element)) => self.get_value(element),
            (ApiFunction::GetLastError, Some("")) => self.get_last_error(),
            (ApiFunction::GetErrorString, Some(code)) => self.get_error_string(code),
            (ApiFunction::GetDiagnostic, Some(code)) => self.get_diagnostic(code),
            (ApiFunction::SetValue, _) => match args {
                [element, value] => self.set_value(element, value).to_string(),
                _ => self.argument_error(),
            },
            _ => self.argument_error(),
        }
    }

    fn argument_error(&self) -> String {
        self.lock().session.fail(self.profile.codes.argument);
        FALSE.to_string()
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::backend::{BackendError, TrackingBackend};
    use futures_util::future::BoxFuture;
    use scorm_proto::TrackingReply;

    struct Accepting;

    impl TrackingBackend for Accepting {
        fn track<'a>(
            &'a self,
            _package_id: &'a PackageId,
            _call: &'a TrackingCall,
        ) -> BoxFuture<'a, Result<TrackingReply, BackendError>> {
            Box::pin(async { Ok(TrackingReply::success()) })
        }
    }

    fn api(version: ScormVersion) -> ScormApi {
        let dispatcher = Dispatcher::current(Arc::new(Accepting)).unwrap();
        ScormApi::builder(version, PackageId::new("pkg1"), dispatcher).build()
    }

    #[tokio::test]
    async fn invoke_resolves_only_own_version_names() {
        let api = api(ScormVersion::Scorm12);
        assert_eq!(api.invoke("Initialize", &[""]), "false");
        assert_eq!(api.get_last_error(), "101");
        assert_eq!(api.invoke("LMSInitialize", &[""]), "true");
        assert_eq!(api.invoke("LMSGetLastError", &[]), "0");
    }

    #[tokio::test]
    async fn invoke_checks_argument_shape() {
        let api = api(ScormVersion::Scorm2004);
        assert_eq!(api.invoke("Initialize", &[]), "true");
        assert_eq!(api.invoke("SetValue", &["cmi.location"]), "false");
        assert_eq!(api.get_last_error(), "201");
        assert_eq!(api.invoke("SetValue", &["cmi.location", "p2"]), "true");
        assert_eq!(api.invoke("GetValue", &["cmi.location"]), "p2");
        assert_eq!(api.invoke("GetValue", &["a", "b"]), "false");
    }

    #[tokio::test]
    async fn get_last_error_by_name_has_no_side_effect() {
        let api = api(ScormVersion::Scorm12);
        assert_eq!(api.get_value("cmi.core.lesson_location"), "");
        assert_eq!(api.invoke("LMSGetLastError", &[""]), "301");
        assert_eq!(api.invoke("LMSGetLastError", &[]), "301");
        assert_eq!(api.get_last_error(), "301");
        assert_eq!(api.invoke("LMSGetLastError", &["x"]), "false");
        assert_eq!(api.get_last_error(), "201");
    }

    #[tokio::test]
    async fn non_empty_initialize_argument_is_rejected() {
        let api = api(ScormVersion::Scorm12);
        assert_eq!(api.initialize("x"), FALSE);
        assert_eq!(api.get_last_error(), "201");
        assert!(!api.snapshot().initialized());
    }

    #[tokio::test]
    async fn get_error_string_does_not_touch_last_error() {
        let api = api(ScormVersion::Scorm2004);
        assert_eq!(api.get_value("cmi.location"), "");
        assert_eq!(api.get_error_string("0"), "No Error");
        assert_eq!(api.get_last_error(), "123");
    }

    #[tokio::test]
    async fn read_only_and_vocabulary_failures_use_version_codes() {
        let api = api(ScormVersion::Scorm2004);
        api.initialize("");
        assert_eq!(api.set_value("cmi.learner_id", "x"), FALSE);
        assert_eq!(api.get_last_error(), "404");
        assert_eq!(api.set_value("cmi.completion_status", "done"), FALSE);
        assert_eq!(api.get_last_error(), "406");
        assert_eq!(api.get_value("cmi.session_time"), "");
        assert_eq!(api.get_last_error(), "405");
        assert_eq!(api.get_value(""), "");
        assert_eq!(api.get_last_error(), "301");
    }

    #[tokio::test]
    async fn lesson_status_cannot_be_reset_to_not_attempted() {
        let api = api(ScormVersion::Scorm12);
        api.initialize("");
        assert_eq!(api.get_value("cmi.core.lesson_status"), "not attempted");
        assert_eq!(api.set_value("cmi.core.lesson_status", "browsed"), TRUE);
        assert_eq!(api.set_value("cmi.core.lesson_status", "not attempted"), FALSE);
        assert_eq!(api.get_last_error(), "405");
        assert_eq!(api.get_value("cmi.core.lesson_status"), "browsed");
        assert_eq!(api.completion_status().as_deref(), Some("browsed"));
    }
}
