// Copyright (c) The Drydock Authors. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ProcessorConfig;
use crate::errors::{Error, Result};

/// File names probed, in order, when looking for profiles in a directory.
pub const PROFILE_FILENAMES: [&str; 3] = ["profiles.yml", "profiles.yaml", "profiles"];

/// Profiles shipped with drydock itself.
const DEFAULT_PROFILES: &str = include_str!("../../profiles/default.yml");

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, AtomicOrdering::SeqCst)
}

/// Selects one of the three processor families carried by a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorKind {
    Enricher,
    Generator,
    Watcher,
}

/// A named bundle of enricher, generator and watcher configurations.
///
/// Profiles sort by `order`, ties going to the profile constructed last.
/// They are deliberately not `Clone`: use [`Profile::copy`] so that the copy
/// gets its own creation sequence.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_profile: Option<String>,

    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub enricher: ProcessorConfig,

    #[serde(default)]
    pub generator: ProcessorConfig,

    #[serde(default)]
    pub watcher: ProcessorConfig,

    #[serde(skip, default = "next_sequence")]
    sequence: u64,
}

impl Profile {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            parent_profile: None,
            order,
            enricher: ProcessorConfig::default(),
            generator: ProcessorConfig::default(),
            watcher: ProcessorConfig::default(),
            sequence: next_sequence(),
        }
    }

    /// Deep copy with a fresh creation sequence.
    pub fn copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            parent_profile: self.parent_profile.clone(),
            order: self.order,
            enricher: self.enricher.clone(),
            generator: self.generator.clone(),
            watcher: self.watcher.clone(),
            sequence: next_sequence(),
        }
    }

    pub fn processor_config(&self, kind: ProcessorKind) -> &ProcessorConfig {
        match kind {
            ProcessorKind::Enricher => &self.enricher,
            ProcessorKind::Generator => &self.generator,
            ProcessorKind::Watcher => &self.watcher,
        }
    }

    /// Merges two profiles of the same name. The greater profile (see
    /// [`Ord`]) wins on every conflict.
    pub fn merge(a: &Profile, b: &Profile) -> Result<Profile> {
        if a.name != b.name {
            return Err(Error::ProfileNameMismatch(a.name.clone(), b.name.clone()));
        }
        let (winner, other) = if a > b { (a, b) } else { (b, a) };

        let mut merged = Profile::overlay(winner, other);
        merged.order = winner.order;
        Ok(merged)
    }

    // `winner`'s configs take precedence over `other`'s.
    fn overlay(winner: &Profile, other: &Profile) -> Profile {
        Profile {
            name: winner.name.clone(),
            parent_profile: winner.parent_profile.clone().or_else(|| other.parent_profile.clone()),
            order: winner.order,
            enricher: ProcessorConfig::merge(&winner.enricher, &other.enricher),
            generator: ProcessorConfig::merge(&winner.generator, &other.generator),
            watcher: ProcessorConfig::merge(&winner.watcher, &other.watcher),
            sequence: next_sequence(),
        }
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Profile {}

impl PartialOrd for Profile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Profile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.cmp(&other.order).then(self.sequence.cmp(&other.sequence))
    }
}

/// Parses a YAML list of profiles.
pub fn from_yaml(content: &str) -> Result<Vec<Profile>> {
    serde_yaml::from_str(content).map_err(Error::YamlError)
}

/// Reads the built-in profiles and, when given, the first profile file found
/// in `directory`. Profiles sharing a name are merged; the directory's ones
/// are created later and so win ties.
pub fn read_all(directory: Option<&Path>) -> Result<BTreeMap<String, Profile>> {
    let mut profiles: BTreeMap<String, Profile> = BTreeMap::new();

    let mut found = from_yaml(DEFAULT_PROFILES)?;
    if let Some(directory) = directory {
        if let Some(path) = PROFILE_FILENAMES.iter().map(|f| directory.join(f)).find(|p| p.exists()) {
            debug!("Reading profiles from {}", path.display());
            let content = std::fs::read_to_string(&path).map_err(|e| Error::ReadError(path.clone(), e))?;
            found.extend(from_yaml(&content)?);
        }
    }

    for profile in found {
        let merged = match profiles.remove(&profile.name) {
            Some(existing) => Profile::merge(&existing, &profile)?,
            None => profile,
        };
        profiles.insert(merged.name.clone(), merged);
    }

    Ok(profiles)
}

/// Looks up the profile `name`, resolving its parent chain. The child's
/// settings are laid over its parent's.
pub fn find_profile(name: &str, directory: Option<&Path>) -> Result<Profile> {
    let profiles = read_all(directory)?;

    let mut resolved = profiles.get(name).ok_or_else(|| Error::ProfileNotFound(name.to_string()))?.copy();
    let mut seen = HashSet::from([name.to_string()]);

    while let Some(parent_name) = resolved.parent_profile.take() {
        if !seen.insert(parent_name.clone()) {
            return Err(Error::ProfileCycle(name.to_string()));
        }
        let parent = profiles.get(&parent_name).ok_or_else(|| Error::ProfileNotFound(parent_name.clone()))?;
        debug!("Profile {} inherits from {}", name, parent_name);

        let mut merged = Profile::overlay(&resolved, parent);
        merged.name = resolved.name.clone();
        merged.parent_profile = parent.parent_profile.clone();
        resolved = merged;
    }

    Ok(resolved)
}

/// Returns the processor configuration of the given kind from the profile
/// `profile`, or an empty configuration when no profile is selected.
pub fn extract_processor_config(
    kind: ProcessorKind,
    profile: Option<&str>,
    directory: Option<&Path>,
) -> Result<ProcessorConfig> {
    match profile {
        Some(name) => Ok(find_profile(name, directory)?.processor_config(kind).clone()),
        None => Ok(ProcessorConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn with_config(name: &str, order: i32, value: &str) -> Profile {
        let mut profile = Profile::new(name, order);
        let block = BTreeMap::from([("key".to_string(), value.to_string())]);
        profile.enricher.config.insert("dd-name".to_string(), block.clone());
        profile.generator.config.insert("dd-default-image".to_string(), block.clone());
        profile.watcher.config.insert("dd-watch".to_string(), block);
        profile
    }

    #[test]
    fn test_merge_equal_order_prefers_later_profile() {
        let a = with_config("p", 1, "a");
        let b = with_config("p", 1, "b");

        let merged = Profile::merge(&a, &b).unwrap();
        assert_eq!(merged.enricher.get_config("dd-name", "key"), Some("b"));
        assert_eq!(merged.generator.get_config("dd-default-image", "key"), Some("b"));
        assert_eq!(merged.watcher.get_config("dd-watch", "key"), Some("b"));

        let merged = Profile::merge(&b, &a).unwrap();
        assert_eq!(merged.enricher.get_config("dd-name", "key"), Some("b"));
    }

    #[test]
    fn test_merge_higher_order_wins() {
        let a = with_config("p", 10, "a");
        let b = with_config("p", 1, "b");

        let merged = Profile::merge(&a, &b).unwrap();
        assert_eq!(merged.enricher.get_config("dd-name", "key"), Some("a"));
        assert_eq!(merged.order, 10);
    }

    #[test]
    fn test_merge_different_names_fails() {
        let a = Profile::new("one", 0);
        let b = Profile::new("two", 0);

        assert!(matches!(Profile::merge(&a, &b), Err(Error::ProfileNameMismatch(_, _))));
    }

    #[test]
    fn test_copy_sorts_after_original() {
        let original = with_config("p", 1, "a");
        let copy = original.copy();

        assert!(copy > original);
        assert_eq!(copy.enricher, original.enricher);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
- name: simple
  order: 5
  enricher:
    includes:
      - dd-name
    config:
      dd-name:
        name: demo
- name: empty
"#;
        let profiles = from_yaml(yaml).unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].order, 5);
        assert_eq!(profiles[0].enricher.get_config("dd-name", "name"), Some("demo"));
        assert!(profiles[1].generator.includes.is_none());
    }

    #[test]
    fn test_find_builtin_profile() {
        let profile = find_profile("default", None).unwrap();
        assert!(profile.enricher.use_processor("dd-metadata"));
    }

    #[test]
    fn test_find_profile_from_directory_with_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("profiles.yaml"),
            r#"
- name: base
  enricher:
    includes: [dd-name]
    config:
      dd-name:
        name: base
        keep: yes
- name: child
  parentProfile: base
  enricher:
    includes: [dd-metadata]
    config:
      dd-name:
        name: child
"#,
        )
        .unwrap();

        let profile = find_profile("child", Some(dir.path())).unwrap();
        assert_eq!(profile.enricher.includes, Some(vec!["dd-metadata".to_string(), "dd-name".to_string()]));
        assert_eq!(profile.enricher.get_config("dd-name", "name"), Some("child"));
        assert_eq!(profile.enricher.get_config("dd-name", "keep"), Some("yes"));
    }

    #[test]
    fn test_find_unknown_profile_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(find_profile("nope", Some(dir.path())), Err(Error::ProfileNotFound(_))));
    }

    #[test]
    fn test_parent_cycle_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("profiles.yml"),
            "- name: a\n  parentProfile: b\n- name: b\n  parentProfile: a\n",
        )
        .unwrap();

        assert!(matches!(find_profile("a", Some(dir.path())), Err(Error::ProfileCycle(_))));
    }

    #[test]
    fn test_extract_without_profile_is_empty() {
        let config = extract_processor_config(ProcessorKind::Enricher, None, None).unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }
}
