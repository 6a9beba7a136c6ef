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

//! First-write-wins overlays of labels, annotations and selectors.
//!
//! Values already present on a resource are never replaced, so applying an
//! overlay a second time changes nothing.

use std::collections::BTreeMap;

use dd_common::config::{MetaDataConfig, ResourceConfig};
use kube::core::DynamicObject;
use serde_json::{Map, Value};
use tracing::debug;

use crate::kind::{Kind, SelectorShape};

/// Contributes labels, annotations and selector labels per resource kind.
pub trait Contributor {
    fn labels(&self, _kind: Kind) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn annotations(&self, _kind: Kind) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn selector(&self, _kind: Kind) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

impl<T: Contributor + ?Sized> Contributor for std::sync::Arc<T> {
    fn labels(&self, kind: Kind) -> BTreeMap<String, String> {
        (**self).labels(kind)
    }

    fn annotations(&self, kind: Kind) -> BTreeMap<String, String> {
        (**self).annotations(kind)
    }

    fn selector(&self, kind: Kind) -> BTreeMap<String, String> {
        (**self).selector(kind)
    }
}

/// Copies every entry of `source` whose key is absent from `target`.
pub fn overlay_map(target: &mut BTreeMap<String, String>, source: &BTreeMap<String, String>) {
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn overlay_json(target: &mut Map<String, Value>, source: &BTreeMap<String, String>) {
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key.clone(), Value::String(value.clone()));
        }
    }
}

/// Merges what all contributors return, earlier contributors winning.
fn collect<C, F>(contributors: &[C], extract: F) -> BTreeMap<String, String>
where
    F: Fn(&C) -> BTreeMap<String, String>,
{
    let mut merged = BTreeMap::new();
    for contributor in contributors {
        overlay_map(&mut merged, &extract(contributor));
    }
    merged
}

/// Returns the object at `key` inside `parent`, replacing a missing or
/// non-object value with an empty object.
fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = parent.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => map,
        _ => unreachable!("entry was just made an object"),
    }
}

fn root_object(resource: &mut DynamicObject) -> &mut Map<String, Value> {
    if !resource.data.is_object() {
        resource.data = Value::Object(Map::new());
    }
    match &mut resource.data {
        Value::Object(map) => map,
        _ => unreachable!("data was just made an object"),
    }
}

/// Applies configured and contributed labels and annotations.
pub struct MetadataOverlay<'a, C> {
    config: &'a ResourceConfig,
    contributors: &'a [C],
}

impl<'a, C: Contributor> MetadataOverlay<'a, C> {
    pub fn new(config: &'a ResourceConfig, contributors: &'a [C]) -> Self {
        Self { config, contributors }
    }

    pub fn apply(&self, resource: &mut DynamicObject) {
        let kind = Kind::of(resource);
        let descriptor = kind.descriptor();

        let (labels, annotations) = self.maps(kind, |config| descriptor.group.resolve(config));
        overlay_map(resource.metadata.labels.get_or_insert_with(BTreeMap::new), &labels.0);
        overlay_map(resource.metadata.labels.get_or_insert_with(BTreeMap::new), &labels.1);
        overlay_map(resource.metadata.annotations.get_or_insert_with(BTreeMap::new), &annotations.0);
        overlay_map(resource.metadata.annotations.get_or_insert_with(BTreeMap::new), &annotations.1);

        if !descriptor.pod_template {
            return;
        }
        let template = match resource.data.pointer_mut("/spec/template") {
            Some(Value::Object(template)) => template,
            _ => return,
        };
        debug!("Applying pod template metadata of {} {}", kind, resource.metadata.name.as_deref().unwrap_or_default());

        let (labels, annotations) = self.maps(Kind::Pod, |config| Kind::Pod.descriptor().group.resolve(config));
        let metadata = object_entry(template, "metadata");
        overlay_json(object_entry(metadata, "labels"), &labels.0);
        overlay_json(object_entry(metadata, "labels"), &labels.1);
        overlay_json(object_entry(metadata, "annotations"), &annotations.0);
        overlay_json(object_entry(metadata, "annotations"), &annotations.1);
    }

    // (configured, contributed) pairs for labels and annotations
    #[allow(clippy::type_complexity)]
    fn maps<F>(
        &self,
        kind: Kind,
        resolve: F,
    ) -> ((BTreeMap<String, String>, BTreeMap<String, String>), (BTreeMap<String, String>, BTreeMap<String, String>))
    where
        F: Fn(&MetaDataConfig) -> BTreeMap<String, String>,
    {
        let configured = |config: &Option<MetaDataConfig>| config.as_ref().map(&resolve).unwrap_or_default();

        let labels = (configured(&self.config.labels), collect(self.contributors, |c| c.labels(kind)));
        let annotations = (configured(&self.config.annotations), collect(self.contributors, |c| c.annotations(kind)));
        (labels, annotations)
    }
}

/// Applies contributed selector labels to workload specs.
pub struct SelectorOverlay<'a, C> {
    contributors: &'a [C],
}

impl<'a, C: Contributor> SelectorOverlay<'a, C> {
    pub fn new(contributors: &'a [C]) -> Self {
        Self { contributors }
    }

    pub fn apply(&self, resource: &mut DynamicObject) {
        let kind = Kind::of(resource);
        let shape = kind.descriptor().selector;
        if shape == SelectorShape::None {
            return;
        }

        let selector = collect(self.contributors, |c| c.selector(kind));
        if selector.is_empty() {
            return;
        }
        apply_selector(resource, shape, &selector);
    }
}

fn apply_selector(resource: &mut DynamicObject, shape: SelectorShape, labels: &BTreeMap<String, String>) {
    // Jobs get their selector generated by the cluster; only an existing one is touched.
    if shape == SelectorShape::ExistingLabelSelector {
        if let Some(Value::Object(selector)) = resource.data.pointer_mut("/spec/selector") {
            overlay_json(object_entry(selector, "matchLabels"), labels);
        }
        return;
    }

    let spec = object_entry(root_object(resource), "spec");
    match shape {
        SelectorShape::Map => overlay_json(object_entry(spec, "selector"), labels),
        SelectorShape::LabelSelector => {
            let selector = object_entry(spec, "selector");
            overlay_json(object_entry(selector, "matchLabels"), labels);
        }
        SelectorShape::None | SelectorShape::ExistingLabelSelector => {}
    }
}
