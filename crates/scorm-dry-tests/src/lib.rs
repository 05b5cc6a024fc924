// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the SCORM bridge crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`backend`] - recording tracking backend and scripted package service
//! - [`config`] - in-memory config store fake for testing without filesystem
//! - [`frame`] - recording content frame

pub mod backend;
pub mod config;
pub mod frame;

pub use backend::{RecordingBackend, ScriptedPackages};
pub use config::InMemoryConfigStore;
pub use frame::{FrameEvent, RecordingFrame};
