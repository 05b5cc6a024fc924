// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Last-known CMI data-model values for one session.
//!
//! Authoritative state lives server-side; this cache only answers `GetValue`
//! synchronously and enforces the element access rules of the active profile.

use crate::profile::ElementRules;
use std::collections::HashMap;

/// Why an element access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// Element name is empty.
    EmptyElement,
    /// `_children` / `_count` keywords cannot be written.
    Keyword,
    /// Element is read-only.
    ReadOnly,
    /// Element is write-only.
    WriteOnly,
    /// Value is outside the element's vocabulary.
    TypeMismatch,
}

/// Learner identity seeded into the model by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Learner {
    /// Stable learner identifier.
    pub id: String,
    /// Display name (`Last, First` by convention).
    pub name: String,
}

/// Accepted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    /// The element feeds the completion projection.
    pub completion: bool,
}

/// Element cache with per-version access rules.
#[derive(Debug, Clone)]
pub struct DataModel {
    rules: &'static ElementRules,
    values: HashMap<String, String>,
}

impl DataModel {
    /// Fresh model holding the profile defaults and, if given, the learner.
    pub fn seeded(rules: &'static ElementRules, learner: Option<&Learner>) -> Self {
        let mut values: HashMap<String, String> = rules
            .defaults
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        if let Some(learner) = learner {
            values.insert(rules.learner_id.to_string(), learner.id.clone());
            values.insert(rules.learner_name.to_string(), learner.name.clone());
        }
        Self { rules, values }
    }

    /// Read an element; unknown elements read as `""`.
    pub fn read(&self, element: &str) -> Result<String, AccessError> {
        if element.is_empty() {
            return Err(AccessError::EmptyElement);
        }
        if listed(self.rules.write_only, element) {
            return Err(AccessError::WriteOnly);
        }
        Ok(self.values.get(element).cloned().unwrap_or_default())
    }

    /// Write an element after checking access and vocabulary.
    pub fn write(&mut self, element: &str, value: &str) -> Result<Write, AccessError> {
        if element.is_empty() {
            return Err(AccessError::EmptyElement);
        }
        if is_keyword(element) {
            return Err(AccessError::Keyword);
        }
        if listed(self.rules.read_only, element) {
            return Err(AccessError::ReadOnly);
        }
        if let Some(allowed) = self.rules.vocabulary(element) {
            if !listed(allowed, value) {
                return Err(AccessError::TypeMismatch);
            }
        }
        self.values.insert(element.to_string(), value.to_string());
        Ok(Write {
            completion: self.rules.is_completion(element),
        })
    }
}

fn listed(list: &[&str], name: &str) -> bool {
    list.iter().any(|entry| *entry == name)
}

fn is_keyword(element: &str) -> bool {
    element.ends_with("._children") || element.ends_with("._count")
}
