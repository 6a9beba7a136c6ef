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
use std::fmt::Display;

use dd_common::config::MetaDataConfig;
use kube::core::DynamicObject;

/// Resource kinds the overlays distinguish. Everything else is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Service,
    Deployment,
    DeploymentConfig,
    ReplicaSet,
    ReplicationController,
    /// Pods as well as the pod templates of workloads.
    Pod,
    DaemonSet,
    StatefulSet,
    Job,
    ImageStream,
    BuildConfig,
    Build,
    Route,
    Other,
}

/// Where a kind keeps its pod selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorShape {
    None,
    /// A plain map at `spec.selector`.
    Map,
    /// `spec.selector.matchLabels`, created when missing.
    LabelSelector,
    /// `spec.selector.matchLabels`, merged only when a selector exists.
    ExistingLabelSelector,
}

/// Which block of a [`MetaDataConfig`] applies to a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataGroup {
    /// Only `all`.
    Other,
    Pod,
    ReplicaSet,
    Service,
    Deployment,
}

impl MetadataGroup {
    pub fn resolve(&self, config: &MetaDataConfig) -> BTreeMap<String, String> {
        let specific = match self {
            MetadataGroup::Other => None,
            MetadataGroup::Pod => config.pod.as_ref(),
            MetadataGroup::ReplicaSet => config.replica_set.as_ref(),
            MetadataGroup::Service => config.service.as_ref(),
            MetadataGroup::Deployment => config.deployment.as_ref(),
        };
        config.resolve(specific)
    }
}

/// Capabilities of a kind, as far as overlays are concerned.
#[derive(Debug)]
pub struct Descriptor {
    pub kind: Kind,
    pub name: &'static str,
    pub group: MetadataGroup,
    pub selector: SelectorShape,
    /// Carries a pod template at `spec.template`.
    pub pod_template: bool,
}

const fn descriptor(
    kind: Kind,
    name: &'static str,
    group: MetadataGroup,
    selector: SelectorShape,
    pod_template: bool,
) -> Descriptor {
    Descriptor { kind, name, group, selector, pod_template }
}

static DESCRIPTORS: [Descriptor; 14] = [
    descriptor(Kind::Service, "Service", MetadataGroup::Service, SelectorShape::Map, false),
    descriptor(Kind::Deployment, "Deployment", MetadataGroup::Deployment, SelectorShape::LabelSelector, true),
    descriptor(Kind::DeploymentConfig, "DeploymentConfig", MetadataGroup::Deployment, SelectorShape::Map, true),
    descriptor(Kind::ReplicaSet, "ReplicaSet", MetadataGroup::ReplicaSet, SelectorShape::LabelSelector, true),
    descriptor(Kind::ReplicationController, "ReplicationController", MetadataGroup::ReplicaSet, SelectorShape::Map, true),
    descriptor(Kind::Pod, "Pod", MetadataGroup::Pod, SelectorShape::None, false),
    descriptor(Kind::DaemonSet, "DaemonSet", MetadataGroup::Other, SelectorShape::LabelSelector, true),
    descriptor(Kind::StatefulSet, "StatefulSet", MetadataGroup::Other, SelectorShape::LabelSelector, true),
    descriptor(Kind::Job, "Job", MetadataGroup::Other, SelectorShape::ExistingLabelSelector, true),
    descriptor(Kind::ImageStream, "ImageStream", MetadataGroup::Other, SelectorShape::None, false),
    descriptor(Kind::BuildConfig, "BuildConfig", MetadataGroup::Other, SelectorShape::None, false),
    descriptor(Kind::Build, "Build", MetadataGroup::Other, SelectorShape::None, false),
    descriptor(Kind::Route, "Route", MetadataGroup::Other, SelectorShape::None, false),
    descriptor(Kind::Other, "", MetadataGroup::Other, SelectorShape::None, false),
];

impl Kind {
    pub fn from_name(name: &str) -> Kind {
        DESCRIPTORS.iter().find(|d| !d.name.is_empty() && d.name == name).map(|d| d.kind).unwrap_or(Kind::Other)
    }

    /// Kind of a resource, read from its type metadata.
    pub fn of(resource: &DynamicObject) -> Kind {
        resource.types.as_ref().map(|t| Kind::from_name(&t.kind)).unwrap_or(Kind::Other)
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        let position = DESCRIPTORS.iter().position(|d| d.kind == *self).unwrap_or(DESCRIPTORS.len() - 1);
        &DESCRIPTORS[position]
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Other => f.write_str("Other"),
            kind => f.write_str(kind.descriptor().name),
        }
    }
}
