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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Labels or annotations configured per resource group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataConfig {
    /// Applied to every resource, below the group specific entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<BTreeMap<String, String>>,

    /// ReplicaSets and ReplicationControllers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<BTreeMap<String, String>>,

    /// Deployments and DeploymentConfigs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<BTreeMap<String, String>>,
}

impl MetaDataConfig {
    /// Combines a group specific block with `all`. Keys of the specific
    /// block are never overridden by `all`.
    pub fn resolve(&self, specific: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
        let mut resolved = specific.cloned().unwrap_or_default();
        for (key, value) in self.all.iter().flatten() {
            resolved.entry(key.clone()).or_insert_with(|| value.clone());
        }
        resolved
    }
}

/// The part of the resource configuration the enrichers read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<MetaDataConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<MetaDataConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}
