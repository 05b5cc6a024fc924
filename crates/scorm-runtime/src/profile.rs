// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed per-version tables: function names, error codes, element rules.
//!
//! One profile is selected from the version tag when an API object is built.
//! Call handlers read fields off the selected profile and never look at the
//! version again.

use crate::codes::{ErrorCode, ProtocolCodes, SCORM_12_MESSAGES, SCORM_2004_MESSAGES};
use scorm_proto::ScormVersion;

/// Operations of the SCORM runtime API, independent of naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFunction {
    /// `LMSInitialize` / `Initialize`.
    Initialize,
    /// `LMSFinish` / `Terminate`.
    Terminate,
    /// `LMSGetValue` / `GetValue`.
    GetValue,
    /// `LMSSetValue` / `SetValue`.
    SetValue,
    /// `LMSCommit` / `Commit`.
    Commit,
    /// `LMSGetLastError` / `GetLastError`.
    GetLastError,
    /// `LMSGetErrorString` / `GetErrorString`.
    GetErrorString,
    /// `LMSGetDiagnostic` / `GetDiagnostic`.
    GetDiagnostic,
}

/// Data-model element rules for one version.
#[derive(Debug)]
pub struct ElementRules {
    /// Elements whose writes feed the completion projection.
    pub completion: &'static [&'static str],
    /// Elements content may read but not write.
    pub read_only: &'static [&'static str],
    /// Elements content may write but not read.
    pub write_only: &'static [&'static str],
    /// Values `SetValue` accepts for vocabulary-typed elements.
    pub vocabularies: &'static [(&'static str, &'static [&'static str])],
    /// Values present before the first write.
    pub defaults: &'static [(&'static str, &'static str)],
    /// Element carrying the learner identifier.
    pub learner_id: &'static str,
    /// Element carrying the learner display name.
    pub learner_name: &'static str,
}

impl ElementRules {
    /// True when writes to `element` update the completion projection.
    pub fn is_completion(&self, element: &str) -> bool {
        self.completion.iter().any(|c| *c == element)
    }

    /// Allowed values for `element`, if it is vocabulary-typed.
    pub fn vocabulary(&self, element: &str) -> Option<&'static [&'static str]> {
        self.vocabularies
            .iter()
            .find(|(name, _)| *name == element)
            .map(|(_, values)| *values)
    }
}

/// Everything version-specific about the runtime API.
#[derive(Debug)]
pub struct VersionProfile {
    /// Version tag this profile implements.
    pub version: ScormVersion,
    /// Name content probes for on each frame (`API` / `API_1484_11`).
    pub global_name: &'static str,
    /// How many ancestor hops content discovery walks before giving up.
    pub discovery_depth: usize,
    /// Conventional function names mapped to operations.
    pub functions: &'static [(&'static str, ApiFunction)],
    /// Error code assignment and message table.
    pub codes: ProtocolCodes,
    /// Element rules and defaults.
    pub elements: ElementRules,
}

impl VersionProfile {
    /// Resolve a conventional function name against this profile only.
    pub fn resolve(&self, name: &str) -> Option<ApiFunction> {
        self.functions
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
    }

    /// Conventional name of `function` under this profile.
    pub fn name_of(&self, function: ApiFunction) -> &'static str {
        self.functions
            .iter()
            .find(|(_, f)| *f == function)
            .map_or("", |(n, _)| *n)
    }
}

/// Select the fixed profile for `version`.
pub fn profile_for(version: ScormVersion) -> &'static VersionProfile {
    match version {
        ScormVersion::Scorm12 => &SCORM_12,
        ScormVersion::Scorm2004 => &SCORM_2004,
    }
}

/// Writable `cmi.core.lesson_status` values; `not attempted` is LMS-set only.
const LESSON_STATUS_12: &[&str] = &["passed", "completed", "failed", "incomplete", "browsed"];

const EXIT_12: &[&str] = &["time-out", "suspend", "logout", ""];

const COMPLETION_2004: &[&str] = &["completed", "incomplete", "not attempted", "unknown"];

const SUCCESS_2004: &[&str] = &["passed", "failed", "unknown"];

const EXIT_2004: &[&str] = &["time-out", "suspend", "logout", "normal", ""];

/// SCORM 1.2 profile.
pub static SCORM_12: VersionProfile = VersionProfile {
    version: ScormVersion::Scorm12,
    global_name: "API",
    discovery_depth: 7,
    functions: &[
        ("LMSInitialize", ApiFunction::Initialize),
        ("LMSFinish", ApiFunction::Terminate),
        ("LMSGetValue", ApiFunction::GetValue),
        ("LMSSetValue", ApiFunction::SetValue),
        ("LMSCommit", ApiFunction::Commit),
        ("LMSGetLastError", ApiFunction::GetLastError),
        ("LMSGetErrorString", ApiFunction::GetErrorString),
        ("LMSGetDiagnostic", ApiFunction::GetDiagnostic),
    ],
    codes: ProtocolCodes {
        general: ErrorCode::new(101),
        argument: ErrorCode::new(201),
        reinitialize_after_terminate: ErrorCode::new(101),
        terminate_not_initialized: ErrorCode::new(301),
        get_not_initialized: ErrorCode::new(301),
        set_not_initialized: ErrorCode::new(301),
        commit_not_initialized: ErrorCode::new(301),
        get_empty_element: ErrorCode::new(201),
        set_empty_element: ErrorCode::new(201),
        set_keyword: ErrorCode::new(402),
        read_only: ErrorCode::new(403),
        write_only: ErrorCode::new(404),
        type_mismatch: ErrorCode::new(405),
        messages: SCORM_12_MESSAGES,
    },
    elements: ElementRules {
        completion: &["cmi.core.lesson_status"],
        read_only: &[
            "cmi._version",
            "cmi.core.student_id",
            "cmi.core.student_name",
            "cmi.core.credit",
            "cmi.core.entry",
            "cmi.core.total_time",
            "cmi.core.lesson_mode",
            "cmi.launch_data",
            "cmi.comments_from_lms",
            "cmi.student_data.mastery_score",
            "cmi.student_data.max_time_allowed",
            "cmi.student_data.time_limit_action",
        ],
        write_only: &["cmi.core.exit", "cmi.core.session_time"],
        vocabularies: &[
            ("cmi.core.lesson_status", LESSON_STATUS_12),
            ("cmi.core.exit", EXIT_12),
        ],
        defaults: &[
            ("cmi._version", "3.4"),
            (
                "cmi.core._children",
                "student_id,student_name,lesson_location,credit,lesson_status,entry,score,total_time,lesson_mode,exit,session_time",
            ),
            ("cmi.core.score._children", "raw,min,max"),
            ("cmi.core.lesson_status", "not attempted"),
            ("cmi.core.lesson_location", ""),
            ("cmi.core.entry", "ab-initio"),
            ("cmi.core.credit", "credit"),
            ("cmi.core.lesson_mode", "normal"),
            ("cmi.core.total_time", "0000:00:00.00"),
            ("cmi.suspend_data", ""),
            ("cmi.launch_data", ""),
            ("cmi.objectives._count", "0"),
            ("cmi.interactions._count", "0"),
        ],
        learner_id: "cmi.core.student_id",
        learner_name: "cmi.core.student_name",
    },
};

/// SCORM 2004 profile.
pub static SCORM_2004: VersionProfile = VersionProfile {
    version: ScormVersion::Scorm2004,
    global_name: "API_1484_11",
    discovery_depth: 500,
    functions: &[
        ("Initialize", ApiFunction::Initialize),
        ("Terminate", ApiFunction::Terminate),
        ("GetValue", ApiFunction::GetValue),
        ("SetValue", ApiFunction::SetValue),
        ("Commit", ApiFunction::Commit),
        ("GetLastError", ApiFunction::GetLastError),
        ("GetErrorString", ApiFunction::GetErrorString),
        ("GetDiagnostic", ApiFunction::GetDiagnostic),
    ],
    codes: ProtocolCodes {
        general: ErrorCode::new(101),
        argument: ErrorCode::new(201),
        reinitialize_after_terminate: ErrorCode::new(104),
        terminate_not_initialized: ErrorCode::new(112),
        get_not_initialized: ErrorCode::new(123),
        set_not_initialized: ErrorCode::new(132),
        commit_not_initialized: ErrorCode::new(142),
        get_empty_element: ErrorCode::new(301),
        set_empty_element: ErrorCode::new(351),
        set_keyword: ErrorCode::new(404),
        read_only: ErrorCode::new(404),
        write_only: ErrorCode::new(405),
        type_mismatch: ErrorCode::new(406),
        messages: SCORM_2004_MESSAGES,
    },
    elements: ElementRules {
        completion: &["cmi.completion_status", "cmi.success_status"],
        read_only: &[
            "cmi._version",
            "cmi.completion_threshold",
            "cmi.credit",
            "cmi.entry",
            "cmi.launch_data",
            "cmi.learner_id",
            "cmi.learner_name",
            "cmi.max_time_allowed",
            "cmi.mode",
            "cmi.scaled_passing_score",
            "cmi.time_limit_action",
            "cmi.total_time",
        ],
        write_only: &["cmi.exit", "cmi.session_time"],
        vocabularies: &[
            ("cmi.completion_status", COMPLETION_2004),
            ("cmi.success_status", SUCCESS_2004),
            ("cmi.exit", EXIT_2004),
        ],
        defaults: &[
            ("cmi._version", "1.0"),
            ("cmi.score._children", "scaled,raw,min,max"),
            ("cmi.completion_status", "unknown"),
            ("cmi.success_status", "unknown"),
            ("cmi.location", ""),
            ("cmi.entry", "ab-initio"),
            ("cmi.credit", "credit"),
            ("cmi.mode", "normal"),
            ("cmi.total_time", "PT0H0M0S"),
            ("cmi.suspend_data", ""),
            ("cmi.launch_data", ""),
            ("cmi.objectives._count", "0"),
            ("cmi.interactions._count", "0"),
        ],
        learner_id: "cmi.learner_id",
        learner_name: "cmi.learner_name",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_profile_resolves_only_its_own_names() {
        assert_eq!(SCORM_12.resolve("LMSFinish"), Some(ApiFunction::Terminate));
        assert_eq!(SCORM_12.resolve("Terminate"), None);
        assert_eq!(SCORM_2004.resolve("Terminate"), Some(ApiFunction::Terminate));
        assert_eq!(SCORM_2004.resolve("LMSInitialize"), None);
    }

    #[test]
    fn profiles_cover_every_function() {
        let all = [
            ApiFunction::Initialize,
            ApiFunction::Terminate,
            ApiFunction::GetValue,
            ApiFunction::SetValue,
            ApiFunction::Commit,
            ApiFunction::GetLastError,
            ApiFunction::GetErrorString,
            ApiFunction::GetDiagnostic,
        ];
        for profile in [&SCORM_12, &SCORM_2004] {
            for f in all {
                assert!(!profile.name_of(f).is_empty(), "{f:?} missing");
            }
        }
    }

    #[test]
    fn not_initialized_codes_match_the_standards() {
        assert_eq!(SCORM_12.codes.set_not_initialized.to_string(), "301");
        assert_eq!(SCORM_12.codes.get_not_initialized.to_string(), "301");
        assert_eq!(SCORM_2004.codes.get_not_initialized.to_string(), "123");
        assert_eq!(SCORM_2004.codes.set_not_initialized.to_string(), "132");
    }

    #[test]
    fn profile_for_selects_by_tag() {
        assert_eq!(profile_for(ScormVersion::Scorm12).global_name, "API");
        assert_eq!(profile_for(ScormVersion::Scorm2004).global_name, "API_1484_11");
    }

    #[test]
    fn completion_elements_differ_per_version() {
        assert!(SCORM_12.elements.is_completion("cmi.core.lesson_status"));
        assert!(!SCORM_12.elements.is_completion("cmi.completion_status"));
        assert!(SCORM_2004.elements.is_completion("cmi.success_status"));
    }
}
