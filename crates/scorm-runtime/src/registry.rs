// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explicit registry of published API objects, keyed by frame and global name.
//!
//! Content discovers the API by probing its own frame, then walking up through
//! its ancestors to the top frame. The host therefore publishes on both its own
//! frame and the top frame, and withdraws both on teardown. One registry
//! stands in for one browser tab's global scope.

use crate::adapter::ScormApi;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Opaque reference to a browsing context (window or frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRef(u64);

impl FrameRef {
    /// Wrap an embedder-assigned frame identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A content frame and its ancestors, nearest first, ending at the top frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChain {
    own: FrameRef,
    ancestors: Vec<FrameRef>,
}

impl FrameChain {
    /// Chain for a top-level frame with no ancestors.
    pub fn new(own: FrameRef) -> Self {
        Self {
            own,
            ancestors: Vec::new(),
        }
    }

    /// Append the next ancestor (parent first, top last).
    pub fn with_parent(mut self, parent: FrameRef) -> Self {
        self.ancestors.push(parent);
        self
    }

    /// The content's own frame.
    pub fn own(&self) -> FrameRef {
        self.own
    }

    /// Outermost frame of the chain.
    pub fn top(&self) -> FrameRef {
        self.ancestors.last().copied().unwrap_or(self.own)
    }
}

type Key = (FrameRef, &'static str);

/// Bindings installed by one publish call; hand back to [`ApiRegistry::withdraw`].
#[derive(Debug)]
#[must_use = "a publication must be withdrawn on teardown"]
pub struct Publication {
    keys: Vec<Key>,
    api: Arc<ScormApi>,
}

impl Publication {
    /// API object this publication installed.
    pub fn api(&self) -> &Arc<ScormApi> {
        &self.api
    }

    /// Frames the API was published on (deduplicated).
    pub fn frames(&self) -> impl Iterator<Item = FrameRef> + '_ {
        self.keys.iter().map(|(frame, _)| *frame)
    }
}

/// Shared, cloneable registry of published API objects.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    bindings: Arc<Mutex<Bindings>>,
}

/// Frame → global name → API object.
type Bindings = HashMap<FrameRef, HashMap<&'static str, Arc<ScormApi>>>;

impl ApiRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `api` under its version's global name on every frame in `frames`.
    ///
    /// All bindings are installed under one lock, so no reader observes a
    /// half-published state. Existing bindings under the same name are
    /// replaced.
    pub fn publish(&self, frames: &[FrameRef], api: Arc<ScormApi>) -> Publication {
        let name = api.profile().global_name;
        let mut keys: Vec<Key> = Vec::with_capacity(frames.len());
        for frame in frames {
            let key = (*frame, name);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let mut bindings = self.lock();
        for (frame, name) in &keys {
            bindings
                .entry(*frame)
                .or_default()
                .insert(*name, Arc::clone(&api));
        }
        debug!(name, frames = keys.len(), "scorm api published");
        Publication { keys, api }
    }

    /// Remove the bindings of `publication` that still point at its API.
    ///
    /// Bindings since replaced by another publication are left alone.
    pub fn withdraw(&self, publication: Publication) -> usize {
        let mut bindings = self.lock();
        let mut removed = 0;
        for (frame, name) in &publication.keys {
            let Some(names) = bindings.get_mut(frame) else {
                continue;
            };
            let ours = names
                .get(name)
                .is_some_and(|bound| Arc::ptr_eq(bound, &publication.api));
            if ours {
                names.remove(name);
                removed += 1;
            }
            if names.is_empty() {
                bindings.remove(frame);
            }
        }
        debug!(removed, "scorm api withdrawn");
        removed
    }

    /// Binding for `name` on exactly `frame`.
    pub fn lookup(&self, frame: FrameRef, name: &str) -> Option<Arc<ScormApi>> {
        self.lock()
            .get(&frame)
            .and_then(|names| names.get(name))
            .map(Arc::clone)
    }

    /// Content-side discovery: own frame, then up to `max_hops` ancestors, then the top frame.
    pub fn discover(&self, chain: &FrameChain, name: &str, max_hops: usize) -> Option<Arc<ScormApi>> {
        std::iter::once(chain.own())
            .chain(chain.ancestors.iter().copied().take(max_hops))
            .chain(std::iter::once(chain.top()))
            .find_map(|frame| self.lookup(frame, name))
    }

    /// Number of installed bindings.
    pub fn len(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    /// True when nothing is published.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Bindings> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
