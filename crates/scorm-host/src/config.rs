// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! What one host mount needs to know.

use crate::frame::HostFrames;
use scorm_app_core::PlayerSettings;
use scorm_proto::{PackageId, ScormVersion};
use scorm_runtime::Learner;
use url::Url;

/// Inputs of a content host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Package to play.
    pub package_id: PackageId,
    /// Runtime version presented to the content.
    pub version: ScormVersion,
    /// Origin of the host page; proxy URLs are built on it.
    pub origin: Url,
    /// Frames the API is published on.
    pub frames: HostFrames,
    /// Learner identity seeded into the data model, if known.
    pub learner: Option<Learner>,
}

impl HostConfig {
    /// Config without learner identity.
    pub fn new(
        package_id: PackageId,
        version: ScormVersion,
        origin: Url,
        frames: HostFrames,
    ) -> Self {
        Self {
            package_id,
            version,
            origin,
            frames,
            learner: None,
        }
    }

    /// Config taking origin and fallback version from player settings.
    pub fn from_settings(
        settings: &PlayerSettings,
        package_id: PackageId,
        version: Option<ScormVersion>,
        frames: HostFrames,
    ) -> Self {
        Self::new(
            package_id,
            version.unwrap_or(settings.default_version),
            settings.origin.clone(),
            frames,
        )
    }

    /// Seed learner id and name.
    #[must_use]
    pub fn with_learner(mut self, learner: Learner) -> Self {
        self.learner = Some(learner);
        self
    }
}
