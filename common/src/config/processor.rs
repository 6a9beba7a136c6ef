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

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Error, Result};
use crate::Named;

/// Include/exclude filter plus keyed configuration for a family of
/// processors (enrichers, generators or watchers).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Processors to use, in the order they should run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,

    /// Processors to suppress when no includes are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<BTreeSet<String>>,

    /// Configuration blocks, keyed by processor name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "stringly")]
    pub config: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProcessorConfig {
    pub fn new(
        includes: Option<Vec<String>>,
        excludes: Option<BTreeSet<String>>,
        config: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Self { includes, excludes, config }
    }

    /// Returns the configured value of `key` for the processor `name`.
    /// A missing processor block and a missing key both yield `None`.
    pub fn get_config(&self, name: &str, key: &str) -> Option<&str> {
        self.config.get(name).and_then(|block| block.get(key)).map(String::as_str)
    }

    /// Like [`get_config`](Self::get_config), falling back to `default`.
    pub fn get_config_or<'a>(&'a self, name: &str, key: &str, default: &'a str) -> &'a str {
        self.get_config(name, key).unwrap_or(default)
    }

    /// Checks whether the processor `name` is to be used.
    ///
    /// Includes always take precedence over excludes: a name listed in the
    /// includes is used even when it is excluded as well. A name found in
    /// neither list is used only when no include list exists.
    pub fn use_processor(&self, name: &str) -> bool {
        if self.includes.as_ref().is_some_and(|includes| includes.iter().any(|i| i == name)) {
            return true;
        }
        if self.excludes.as_ref().is_some_and(|excludes| excludes.contains(name)) {
            return false;
        }
        self.includes.is_none()
    }

    /// Orders `candidates` according to the include list.
    ///
    /// Without includes the candidates are returned unchanged. Otherwise the
    /// result enumerates exactly the includes, in their order, so a name
    /// included twice yields its candidate twice. Candidates not mentioned
    /// are dropped and an include naming no candidate is an error.
    pub fn order<T: Named + Clone>(&self, candidates: Vec<T>, kind: &str) -> Result<Vec<T>> {
        let includes = match &self.includes {
            Some(includes) if !includes.is_empty() => includes,
            _ => return Ok(candidates),
        };

        let lookup: HashMap<String, T> =
            candidates.into_iter().map(|candidate| (candidate.name().to_string(), candidate)).collect();

        includes
            .iter()
            .map(|include| {
                lookup
                    .get(include)
                    .cloned()
                    .ok_or_else(|| Error::UnknownProcessor { kind: kind.to_string(), name: include.clone() })
            })
            .collect()
    }

    /// Merges two configurations, `winner` taking precedence.
    ///
    /// Includes are unioned with the winner's entries first, excludes are
    /// unioned, and processor blocks are merged key by key with the winner's
    /// values overriding.
    pub fn merge(winner: &ProcessorConfig, other: &ProcessorConfig) -> ProcessorConfig {
        let includes = match (&winner.includes, &other.includes) {
            (None, None) => None,
            (first, second) => {
                let mut merged: Vec<String> = vec![];
                for name in first.iter().flatten().chain(second.iter().flatten()) {
                    if !merged.contains(name) {
                        merged.push(name.clone());
                    }
                }
                Some(merged)
            }
        };

        let excludes = match (&winner.excludes, &other.excludes) {
            (None, None) => None,
            (first, second) => Some(first.iter().flatten().chain(second.iter().flatten()).cloned().collect()),
        };

        let mut config = other.config.clone();
        for (name, block) in &winner.config {
            let target = config.entry(name.clone()).or_default();
            for (key, value) in block {
                target.insert(key.clone(), value.clone());
            }
        }

        ProcessorConfig { includes, excludes, config }
    }
}

// Processor blocks are written by hand in YAML, where `true` or `3600` come
// through as non-string scalars.
fn stringly<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<BTreeMap<String, serde_yaml::Value>>>> =
        Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, block)| {
            let block = block
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, value)| scalar(value).map(|value| (key, value)))
                .collect();
            (name, block)
        })
        .collect())
}

fn scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s),
        other => serde_yaml::to_string(&other).ok().map(|s| s.trim_end().to_string()),
    }
}
