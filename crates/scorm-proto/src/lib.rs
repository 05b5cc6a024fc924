// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the LMS collaborator surface consumed by the SCORM bridge:
//! package metadata, viewer tickets, runtime tracking calls, and the
//! same-origin proxy path layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod proxy;

pub use proxy::{proxy_url, ProxyRoute, ProxyUrlError, PROXY_PREFIX};

/// Error code the bridge reports for any failed backend tracking call.
///
/// `101` is "General Exception" in both SCORM 1.2 and SCORM 2004.
pub const GENERAL_FAILURE_CODE: &str = "101";

/// SCORM runtime revision a package targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScormVersion {
    /// SCORM 1.2 (`API`, `LMSInitialize`, ...).
    #[serde(rename = "1.2")]
    Scorm12,
    /// SCORM 2004 (`API_1484_11`, `Initialize`, ...).
    #[serde(rename = "2004")]
    Scorm2004,
}

impl ScormVersion {
    /// Version tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scorm12 => "1.2",
            Self::Scorm2004 => "2004",
        }
    }
}

impl fmt::Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a version tag is not `1.2` or `2004`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SCORM version: {0:?}")]
pub struct UnknownVersion(pub String);

impl FromStr for ScormVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(Self::Scorm12),
            "2004" => Ok(Self::Scorm2004),
            other => Err(UnknownVersion(other.to_string())),
        }
    }
}

/// Opaque package identifier assigned by the LMS backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Wrap a backend-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Processing state of an uploaded package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    /// Upload accepted, extraction still running.
    Processing,
    /// Extracted and launchable.
    Ready,
    /// Extraction or validation failed.
    Error,
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        })
    }
}

/// Package metadata returned by `GET scorm/packages/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMeta {
    /// Processing state; only `ready` packages are launchable.
    pub status: PackageStatus,
    /// Entry-point resource path inside the package.
    #[serde(default)]
    pub launch_url: Option<String>,
    /// SCORM revision declared by the manifest.
    #[serde(default)]
    pub version: Option<ScormVersion>,
    /// Display title, when the manifest carries one.
    #[serde(default)]
    pub title: Option<String>,
}

/// Short-lived token scoping one browsing session to one package.
///
/// `Debug` output is redacted so tickets never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerTicket(String);

impl ViewerTicket {
    /// Wrap a backend-issued ticket.
    pub fn new(ticket: impl Into<String>) -> Self {
        Self(ticket.into())
    }

    /// Borrow the raw token (for URL construction only).
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ViewerTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewerTicket(<redacted>)")
    }
}

/// Body returned by `POST scorm/packages/{id}/viewer-ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketResponse {
    /// Issued ticket.
    pub ticket: ViewerTicket,
}

/// Runtime tracking call kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingOp {
    /// Communication session opened.
    Initialize,
    /// Communication session closed.
    Terminate,
    /// Flush of previously written values.
    Commit,
    /// Single data-model write.
    SetValue,
}

impl TrackingOp {
    /// Trailing path segment of the tracking endpoint.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Terminate => "terminate",
            Self::Commit => "commit",
            Self::SetValue => "set-value",
        }
    }
}

impl fmt::Display for TrackingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Body of `POST scorm/runtime/{id}/set-value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValueBody {
    /// CMI data-model element name.
    pub element: String,
    /// Value written by the content.
    pub value: String,
}

/// One runtime tracking call with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingCall {
    /// `POST .../initialize`.
    Initialize,
    /// `POST .../terminate`.
    Terminate,
    /// `POST .../commit`.
    Commit,
    /// `POST .../set-value` with `{element, value}`.
    SetValue(SetValueBody),
}

impl TrackingCall {
    /// Build a data-model write.
    pub fn set_value(element: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SetValue(SetValueBody {
            element: element.into(),
            value: value.into(),
        })
    }

    /// Endpoint kind of this call.
    pub fn op(&self) -> TrackingOp {
        match self {
            Self::Initialize => TrackingOp::Initialize,
            Self::Terminate => TrackingOp::Terminate,
            Self::Commit => TrackingOp::Commit,
            Self::SetValue(_) => TrackingOp::SetValue,
        }
    }

    /// JSON body, if the endpoint takes one.
    pub fn body(&self) -> Option<&SetValueBody> {
        match self {
            Self::SetValue(body) => Some(body),
            _ => None,
        }
    }
}

/// Generic reply of every runtime tracking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReply {
    /// `"true"` or `"false"`, SCORM style.
    pub result: String,
    /// SCORM error code as a numeric string.
    #[serde(default = "no_error")]
    pub error_code: String,
}

fn no_error() -> String {
    "0".to_string()
}

impl TrackingReply {
    /// Successful reply.
    pub fn success() -> Self {
        Self {
            result: "true".to_string(),
            error_code: no_error(),
        }
    }

    /// Generic failure shape used when a call could not complete.
    pub fn failure() -> Self {
        Self {
            result: "false".to_string(),
            error_code: GENERAL_FAILURE_CODE.to_string(),
        }
    }

    /// True when the backend accepted the call.
    pub fn is_success(&self) -> bool {
        self.result == "true"
    }
}
