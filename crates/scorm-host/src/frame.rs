// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port for the sandboxed content frame and its container.
//!
//! Embedders (a webview, a wasm shim, a test double) implement this; the host
//! never touches a DOM directly.

use scorm_runtime::FrameRef;
use thiserror::Error;
use url::Url;

/// Fullscreen request failure reported by the embedder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The embedding surface has no fullscreen support.
    #[error("fullscreen is not supported by this surface")]
    Unsupported,
    /// The request was refused (no user gesture, policy, ...).
    #[error("fullscreen request denied: {0}")]
    Denied(String),
}

/// Browsing contexts the host publishes the API on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFrames {
    /// The window that owns the content frame.
    pub window: FrameRef,
    /// The top frame of the tab (equal to `window` when not nested).
    pub top: FrameRef,
}

impl HostFrames {
    /// Host page running at the top of the tab.
    pub fn top_level(frame: FrameRef) -> Self {
        Self {
            window: frame,
            top: frame,
        }
    }
}

/// Sandboxed content frame plus the container used for fullscreen.
pub trait ContentFrame: Send {
    /// Point the frame at `url` (starts a load).
    fn set_source(&mut self, url: &Url);
    /// Blank the frame.
    fn clear_source(&mut self);
    /// Ask the container to enter fullscreen; completion arrives as an event.
    fn request_fullscreen(&mut self) -> Result<(), FrameError>;
    /// Ask the container to leave fullscreen; completion arrives as an event.
    fn exit_fullscreen(&mut self) -> Result<(), FrameError>;
}
