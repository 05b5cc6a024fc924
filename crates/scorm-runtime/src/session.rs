// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime session state machine: `Uninitialized → Initialized → Terminated`.
//!
//! Holds no I/O and no rendering state; the API object owns one session and
//! replaces it wholesale on reload.

use crate::codes::{ErrorCode, ProtocolCodes};

/// Communication-session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Fresh session; nothing may be read or written yet.
    #[default]
    Uninitialized,
    /// Between a successful initialize and terminate.
    Initialized,
    /// Closed for good; a new session is needed to continue.
    Terminated,
}

/// Outcome of a successful lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State moved; the backend must hear about it.
    Changed,
    /// Call succeeded without a state change (repeat initialize).
    Unchanged,
}

/// Per-mount session state plus the last protocol error.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSession {
    lifecycle: Lifecycle,
    last_error: ErrorCode,
}

impl RuntimeSession {
    /// New, uninitialized session with no error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// True between initialize and terminate.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Initialized
    }

    /// True once terminate succeeded.
    pub fn is_terminated(&self) -> bool {
        self.lifecycle == Lifecycle::Terminated
    }

    /// Code recorded by the most recent call.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Record success of the current call.
    pub fn succeed(&mut self) {
        self.last_error = ErrorCode::NONE;
    }

    /// Record failure of the current call.
    pub fn fail(&mut self, code: ErrorCode) -> ErrorCode {
        self.last_error = code;
        code
    }

    /// `Initialize`: idempotent while open, refused once terminated.
    pub fn initialize(&mut self, codes: &ProtocolCodes) -> Result<Transition, ErrorCode> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {
                self.lifecycle = Lifecycle::Initialized;
                self.succeed();
                Ok(Transition::Changed)
            }
            Lifecycle::Initialized => {
                self.succeed();
                Ok(Transition::Unchanged)
            }
            Lifecycle::Terminated => Err(self.fail(codes.reinitialize_after_terminate)),
        }
    }

    /// `Terminate`: only valid while initialized.
    pub fn terminate(&mut self, codes: &ProtocolCodes) -> Result<Transition, ErrorCode> {
        self.require_initialized(codes.terminate_not_initialized)?;
        self.lifecycle = Lifecycle::Terminated;
        self.succeed();
        Ok(Transition::Changed)
    }

    /// Gate for data access; records `code` when the session is not open.
    pub fn require_initialized(&mut self, code: ErrorCode) -> Result<(), ErrorCode> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(self.fail(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{SCORM_12, SCORM_2004};

    #[test]
    fn initialize_is_idempotent_while_open() {
        let mut s = RuntimeSession::new();
        assert_eq!(s.initialize(&SCORM_12.codes), Ok(Transition::Changed));
        assert_eq!(s.initialize(&SCORM_12.codes), Ok(Transition::Unchanged));
        assert!(s.is_initialized());
        assert_eq!(s.last_error(), ErrorCode::NONE);
    }

    #[test]
    fn terminate_before_initialize_fails_with_version_code() {
        let mut s = RuntimeSession::new();
        assert_eq!(
            s.terminate(&SCORM_2004.codes),
            Err(ErrorCode::new(112))
        );
        assert_eq!(s.lifecycle(), Lifecycle::Uninitialized);
    }

    #[test]
    fn terminated_session_cannot_reopen() {
        let mut s = RuntimeSession::new();
        assert!(s.initialize(&SCORM_2004.codes).is_ok());
        assert!(s.terminate(&SCORM_2004.codes).is_ok());
        assert!(s.is_terminated());
        assert!(!s.is_initialized());
        assert_eq!(s.initialize(&SCORM_2004.codes), Err(ErrorCode::new(104)));
        assert!(s.is_terminated());
    }

    #[test]
    fn successful_call_clears_previous_error() {
        let mut s = RuntimeSession::new();
        assert!(s.require_initialized(ErrorCode::new(301)).is_err());
        assert_eq!(s.last_error(), ErrorCode::new(301));
        assert!(s.initialize(&SCORM_12.codes).is_ok());
        assert_eq!(s.last_error(), ErrorCode::NONE);
    }
}
