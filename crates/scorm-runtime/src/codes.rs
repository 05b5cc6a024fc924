// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SCORM error codes and their standard message tables.
//!
//! Codes and messages are external-standard identifiers: content compares
//! them as strings, so they are kept verbatim.

use std::fmt;

/// Numeric SCORM error code (`0` means no error).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// No error.
    pub const NONE: Self = Self(0);

    /// Wrap a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// True for every code other than `0`.
    pub const fn is_error(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message returned for codes missing from a version's table.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Diagnostic returned for codes missing from a version's table.
pub const NO_DIAGNOSTIC: &str = "No diagnostic information is available for this error code";

/// Per-version assignment of codes to the failure conditions the bridge reports.
#[derive(Debug)]
pub struct ProtocolCodes {
    /// General exception (also used for failed backend calls).
    pub general: ErrorCode,
    /// Malformed or unexpected argument.
    pub argument: ErrorCode,
    /// `Initialize` on a session that already terminated.
    pub reinitialize_after_terminate: ErrorCode,
    /// `Terminate` while not initialized.
    pub terminate_not_initialized: ErrorCode,
    /// `GetValue` while not initialized.
    pub get_not_initialized: ErrorCode,
    /// `SetValue` while not initialized.
    pub set_not_initialized: ErrorCode,
    /// `Commit` while not initialized.
    pub commit_not_initialized: ErrorCode,
    /// `GetValue("")`.
    pub get_empty_element: ErrorCode,
    /// `SetValue("", ..)`.
    pub set_empty_element: ErrorCode,
    /// `SetValue` on `_children` / `_count` keywords.
    pub set_keyword: ErrorCode,
    /// `SetValue` on a read-only element.
    pub read_only: ErrorCode,
    /// `GetValue` on a write-only element.
    pub write_only: ErrorCode,
    /// Value outside an element's vocabulary.
    pub type_mismatch: ErrorCode,
    /// Standard message table.
    pub messages: &'static [(u16, &'static str)],
}

impl ProtocolCodes {
    /// Standard message for `code`; `None` when the table has no entry.
    pub fn message(&self, code: u16) -> Option<&'static str> {
        self.messages
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, msg)| *msg)
    }

    /// `GetErrorString` semantics: pure lookup with a generic fallback.
    pub fn error_string(&self, code: &str) -> String {
        parse_code(code)
            .and_then(|c| self.message(c))
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()
    }

    /// `GetDiagnostic` semantics: `"[code] message"` or a generic fallback.
    pub fn diagnostic(&self, code: &str) -> String {
        match parse_code(code).and_then(|c| self.message(c).map(|m| (c, m))) {
            Some((c, msg)) => format!("[{c}] {msg}"),
            None => NO_DIAGNOSTIC.to_string(),
        }
    }
}

fn parse_code(code: &str) -> Option<u16> {
    code.trim().parse().ok()
}

pub(crate) const SCORM_12_MESSAGES: &[(u16, &str)] = &[
    (0, "No error"),
    (101, "General exception"),
    (201, "Invalid argument error"),
    (202, "Element cannot have children"),
    (203, "Element not an array - cannot have count"),
    (301, "Not initialized"),
    (401, "Not implemented error"),
    (402, "Invalid set value, element is a keyword"),
    (403, "Element is read only"),
    (404, "Element is write only"),
    (405, "Incorrect data type"),
];

pub(crate) const SCORM_2004_MESSAGES: &[(u16, &str)] = &[
    (0, "No Error"),
    (101, "General Exception"),
    (102, "General Initialization Failure"),
    (103, "Already Initialized"),
    (104, "Content Instance Terminated"),
    (111, "General Termination Failure"),
    (112, "Termination Before Initialization"),
    (113, "Termination After Termination"),
    (122, "Retrieve Data Before Initialization"),
    (123, "Retrieve Data After Termination"),
    (132, "Store Data Before Initialization"),
    (133, "Store Data After Termination"),
    (142, "Commit Before Initialization"),
    (143, "Commit After Termination"),
    (201, "General Argument Error"),
    (301, "General Get Failure"),
    (351, "General Set Failure"),
    (391, "General Commit Failure"),
    (401, "Undefined Data Model Element"),
    (402, "Unimplemented Data Model Element"),
    (403, "Data Model Element Value Not Initialized"),
    (404, "Data Model Element Is Read Only"),
    (405, "Data Model Element Is Write Only"),
    (406, "Data Model Element Type Mismatch"),
    (407, "Data Model Element Value Out Of Range"),
    (408, "Data Model Dependency Not Established"),
];
