// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content host lifecycle: resolve, publish, point the frame, tear down.
//!
//! A mount fetches package metadata and a viewer ticket concurrently, builds
//! the proxied launch URL and a fresh API object, publishes the API on the
//! host window and the top frame, and only then points the frame at the
//! content. Teardown mirrors it: one best-effort terminate if the session is
//! open, then withdraw the bindings.

use crate::config::HostConfig;
use crate::error::HostError;
use crate::frame::{ContentFrame, FrameError};
use scorm_proto::{proxy_url, PackageId, PackageStatus, ScormVersion};
use scorm_runtime::{
    completion_channel, ApiRegistry, CompletionSink, Dispatcher, PackageService, Publication,
    ScormApi,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

/// Where the host is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPhase {
    /// Nothing mounted.
    Idle,
    /// Resolving the package, or frame pointed at content but not loaded yet.
    Loading,
    /// Frame reported its load event.
    Ready,
    /// Mount failed; terminal until the next mount.
    Failed(HostError),
}

struct Mounted {
    launch: Url,
    publication: Publication,
}

/// Owns one content frame and the API published for it.
pub struct ContentHost<F: ContentFrame> {
    config: HostConfig,
    frame: F,
    registry: ApiRegistry,
    packages: Arc<dyn PackageService>,
    dispatcher: Dispatcher,
    completion: CompletionSink,
    phase: HostPhase,
    mounted: Option<Mounted>,
    fullscreen: bool,
}

impl<F: ContentFrame> std::fmt::Debug for ContentHost<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHost")
            .field("package_id", &self.config.package_id)
            .field("version", &self.config.version)
            .field("phase", &self.phase)
            .field("fullscreen", &self.fullscreen)
            .finish_non_exhaustive()
    }
}

impl<F: ContentFrame> ContentHost<F> {
    /// Idle host; call [`mount`](Self::mount) to start playback.
    pub fn new(
        config: HostConfig,
        frame: F,
        registry: ApiRegistry,
        packages: Arc<dyn PackageService>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            frame,
            registry,
            packages,
            dispatcher,
            completion: completion_channel().0,
            phase: HostPhase::Idle,
            mounted: None,
            fullscreen: false,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> &HostPhase {
        &self.phase
    }

    /// True while resolving or waiting for the frame's load event.
    pub fn is_loading(&self) -> bool {
        self.phase == HostPhase::Loading
    }

    /// Fatal error of the last mount, if it failed.
    pub fn error(&self) -> Option<&HostError> {
        match &self.phase {
            HostPhase::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Published API of the current session.
    pub fn api(&self) -> Option<&Arc<ScormApi>> {
        self.mounted.as_ref().map(|m| m.publication.api())
    }

    /// Proxied launch URL the frame points at.
    pub fn launch_url(&self) -> Option<&Url> {
        self.mounted.as_ref().map(|m| &m.launch)
    }

    /// Last fullscreen state reported by the container.
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Borrow the frame port.
    pub fn frame(&self) -> &F {
        &self.frame
    }

    /// Registry the host publishes into.
    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    /// Completion projection; survives reloads.
    pub fn completion(&self) -> watch::Receiver<Option<String>> {
        self.completion.subscribe()
    }

    /// Resolve the configured package and start playback.
    ///
    /// An existing mount is torn down first. On failure the host enters
    /// [`HostPhase::Failed`] with nothing published and no frame source set.
    pub async fn mount(&mut self) -> Result<(), HostError> {
        self.teardown();
        self.phase = HostPhase::Loading;
        let package_id = self.config.package_id.clone();
        info!(package_id = %package_id, version = %self.config.version, "mounting scorm content");

        let packages = Arc::clone(&self.packages);
        let (meta, ticket) = tokio::join!(
            packages.package(&package_id),
            packages.issue_ticket(&package_id)
        );

        let meta = match meta {
            Ok(meta) => meta,
            Err(err) => return Err(self.fail(HostError::PackageUnavailable(err))),
        };
        if meta.status != PackageStatus::Ready {
            return Err(self.fail(HostError::PackageNotReady {
                status: meta.status,
            }));
        }
        let Some(launch_path) = meta.launch_url.filter(|l| !l.trim().is_empty()) else {
            return Err(self.fail(HostError::MissingLaunchUrl));
        };
        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(err) => return Err(self.fail(HostError::TicketUnavailable(err))),
        };
        let launch = match proxy_url(&self.config.origin, &ticket, &package_id, &launch_path) {
            Ok(url) => url,
            Err(err) => return Err(self.fail(HostError::MalformedLaunch(err))),
        };
        if let Some(declared) = meta.version.filter(|v| *v != self.config.version) {
            warn!(
                package_id = %package_id,
                declared = %declared,
                configured = %self.config.version,
                "package declares a different scorm version; using configured version"
            );
        }

        self.start(launch);
        Ok(())
    }

    /// Switch to another package and/or version and mount it.
    pub async fn set_package(
        &mut self,
        package_id: PackageId,
        version: ScormVersion,
    ) -> Result<(), HostError> {
        self.teardown();
        self.completion.send_replace(None);
        self.config.package_id = package_id;
        self.config.version = version;
        self.mount().await
    }

    /// Frame load event: content is showing.
    pub fn on_frame_load(&mut self) {
        if self.mounted.is_some() && self.phase == HostPhase::Loading {
            self.phase = HostPhase::Ready;
            debug!(package_id = %self.config.package_id, "content frame loaded");
        }
    }

    /// Restart the content with a fresh session on the same launch URL.
    pub fn reload(&mut self) -> Result<(), HostError> {
        let Some(mounted) = self.mounted.take() else {
            return Err(HostError::NotMounted);
        };
        info!(package_id = %self.config.package_id, "reloading scorm content");
        self.release(mounted.publication);
        self.start(mounted.launch);
        Ok(())
    }

    /// Enter fullscreen, or leave it when already fullscreen.
    ///
    /// The tracked state changes only via [`on_fullscreen_change`](Self::on_fullscreen_change).
    pub fn toggle_fullscreen(&mut self) -> Result<(), FrameError> {
        let result = if self.fullscreen {
            self.frame.exit_fullscreen()
        } else {
            self.frame.request_fullscreen()
        };
        if let Err(err) = &result {
            warn!(%err, "fullscreen toggle refused");
        }
        result
    }

    /// Fullscreen-change event from the container.
    pub fn on_fullscreen_change(&mut self, active: bool) {
        self.fullscreen = active;
    }

    /// Terminate an open session, withdraw the bindings and blank the frame.
    pub fn unmount(&mut self) {
        self.teardown();
        self.phase = HostPhase::Idle;
    }

    fn start(&mut self, launch: Url) {
        let mut builder = ScormApi::builder(
            self.config.version,
            self.config.package_id.clone(),
            self.dispatcher.clone(),
        )
        .completion(Arc::clone(&self.completion));
        if let Some(learner) = &self.config.learner {
            builder = builder.learner(learner.clone());
        }
        let api = Arc::new(builder.build());
        let frames = [self.config.frames.window, self.config.frames.top];
        let publication = self.registry.publish(&frames, api);
        self.phase = HostPhase::Loading;
        self.frame.set_source(&launch);
        debug!(package_id = %self.config.package_id, "content frame pointed at proxy");
        self.mounted = Some(Mounted {
            launch,
            publication,
        });
    }

    fn teardown(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            self.release(mounted.publication);
            self.frame.clear_source();
        }
    }

    fn release(&self, publication: Publication) {
        let api = Arc::clone(publication.api());
        if api.snapshot().initialized() {
            let result = api.terminate("");
            debug!(package_id = %self.config.package_id, result, "terminated open session");
        }
        let removed = self.registry.withdraw(publication);
        if removed == 0 {
            warn!(
                package_id = %self.config.package_id,
                "api bindings were replaced by another host before teardown"
            );
        }
    }

    fn fail(&mut self, err: HostError) -> HostError {
        error!(package_id = %self.config.package_id, %err, "scorm content failed to mount");
        self.phase = HostPhase::Failed(err.clone());
        err
    }
}

impl<F: ContentFrame> Drop for ContentHost<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
