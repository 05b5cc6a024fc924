// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content host for SCORM packages.
#![forbid(unsafe_code)]
//!
//! Embeds one package in a sandboxed frame served through the same-origin
//! proxy and owns the API object the content talks to.
//!
//! # Modules
//!
//! - [`config`] - mount inputs
//! - [`error`] - fatal host errors
//! - [`frame`] - frame/container port implemented by the embedder
//! - [`host`] - mount, reload, fullscreen, unmount

pub mod config;
pub mod error;
pub mod frame;
pub mod host;

pub use config::HostConfig;
pub use error::HostError;
pub use frame::{ContentFrame, FrameError, HostFrames};
pub use host::{ContentHost, HostPhase};
