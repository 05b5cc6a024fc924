// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording content frame.

use scorm_host::{ContentFrame, FrameError};
use scorm_runtime::{ApiRegistry, FrameRef};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// One call the host made on its frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Frame pointed at `url`.
    SetSource(Url),
    /// Frame blanked.
    ClearSource,
    /// Fullscreen requested.
    RequestFullscreen,
    /// Fullscreen exit requested.
    ExitFullscreen,
}

struct Probe {
    registry: ApiRegistry,
    frame: FrameRef,
    name: &'static str,
}

#[derive(Default)]
struct Log {
    events: Vec<FrameEvent>,
    api_visible_at_load: Vec<bool>,
    deny_fullscreen: bool,
    probe: Option<Probe>,
}

/// [`ContentFrame`] recording every call; clones share one log.
#[derive(Clone, Default)]
pub struct RecordingFrame {
    log: Arc<Mutex<Log>>,
}

impl RecordingFrame {
    /// Frame with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame that checks, on every `set_source`, whether `name` is already
    /// published on `frame` in `registry`.
    pub fn watching(registry: ApiRegistry, frame: FrameRef, name: &'static str) -> Self {
        let recorder = Self::new();
        recorder.lock().probe = Some(Probe {
            registry,
            frame,
            name,
        });
        recorder
    }

    /// Refuse fullscreen requests from now on.
    pub fn deny_fullscreen(&self) {
        self.lock().deny_fullscreen = true;
    }

    /// Every call so far.
    pub fn events(&self) -> Vec<FrameEvent> {
        self.lock().events.clone()
    }

    /// URLs the frame was pointed at, in order.
    pub fn sources(&self) -> Vec<Url> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                FrameEvent::SetSource(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// For each `set_source`, whether the watched binding was visible.
    pub fn api_visible_at_load(&self) -> Vec<bool> {
        self.lock().api_visible_at_load.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentFrame for RecordingFrame {
    fn set_source(&mut self, url: &Url) {
        let mut log = self.lock();
        let visible = log
            .probe
            .as_ref()
            .map(|p| p.registry.lookup(p.frame, p.name).is_some());
        if let Some(visible) = visible {
            log.api_visible_at_load.push(visible);
        }
        log.events.push(FrameEvent::SetSource(url.clone()));
    }

    fn clear_source(&mut self) {
        self.lock().events.push(FrameEvent::ClearSource);
    }

    fn request_fullscreen(&mut self) -> Result<(), FrameError> {
        let mut log = self.lock();
        if log.deny_fullscreen {
            return Err(FrameError::Denied("no user gesture".into()));
        }
        log.events.push(FrameEvent::RequestFullscreen);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), FrameError> {
        self.lock().events.push(FrameEvent::ExitFullscreen);
        Ok(())
    }
}
