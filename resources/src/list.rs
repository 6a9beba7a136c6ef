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

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dd_common::config::profile::PROFILE_FILENAMES;
use dd_common::config::ResourceFileType;
use kube::core::DynamicObject;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::kind::Kind;

/// The mutable collection of resources the enrichers work on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceList {
    items: Vec<DynamicObject>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DynamicObject] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<DynamicObject> {
        &mut self.items
    }

    pub fn push(&mut self, resource: DynamicObject) {
        self.items.push(resource);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicObject> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DynamicObject> {
        self.items.iter_mut()
    }

    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &DynamicObject> {
        self.items.iter().filter(move |r| Kind::of(r) == kind)
    }

    /// Names of all resources of the given kind.
    pub fn names_of(&self, kind: Kind) -> BTreeSet<String> {
        self.of_kind(kind).filter_map(|r| r.metadata.name.clone()).collect()
    }

    /// Loads resources from a file, or from every `yml`, `yaml` and `json`
    /// file of a directory in name order. Profile files are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let mut list = ResourceList::new();

        let files = if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| Error::ReadError(path.to_path_buf(), e))?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && file_type(p).is_some() && !is_profile_file(p))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        for file in files {
            let file_type = file_type(&file).ok_or_else(|| Error::UnsupportedExtension(file.clone()))?;
            let content = std::fs::read_to_string(&file).map_err(|e| Error::ReadError(file.clone(), e))?;
            let resources = parse(&content, file_type)?;
            debug!("Loaded {} resources from {}", resources.len(), file.display());
            list.items.extend(resources);
        }

        Ok(list)
    }

    /// The list as a `v1/List` document with nulls and empty arrays removed.
    pub fn to_value(&self) -> Result<Value> {
        let items = self
            .items
            .iter()
            .map(|item| serde_json::to_value(item).map(prune))
            .collect::<Result<Vec<Value>, _>>()
            .map_err(Error::SerializationError)?;

        Ok(json!({ "apiVersion": "v1", "kind": "List", "items": items }))
    }

    /// Writes the list to `path`, creating parent directories.
    pub fn write(&self, path: &Path, file_type: ResourceFileType) -> Result<()> {
        let value = self.to_value()?;
        let content = match file_type {
            ResourceFileType::Yaml => serde_yaml::to_string(&value).map_err(Error::YamlError)?,
            ResourceFileType::Json => serde_json::to_string_pretty(&value).map_err(Error::SerializationError)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::WriteError(parent.to_path_buf(), e))?;
        }
        std::fs::write(path, content).map_err(|e| Error::WriteError(path.to_path_buf(), e))?;
        debug!("Wrote {} resources to {}", self.items.len(), path.display());

        Ok(())
    }
}

impl From<Vec<DynamicObject>> for ResourceList {
    fn from(items: Vec<DynamicObject>) -> Self {
        Self { items }
    }
}

fn is_profile_file(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| PROFILE_FILENAMES.contains(&n))
}

pub fn file_type(path: &Path) -> Option<ResourceFileType> {
    path.extension().and_then(|e| e.to_str()).and_then(ResourceFileType::from_extension)
}

/// Parses one or more resources. YAML input may hold several documents and
/// `List` documents are expanded into their items.
pub fn parse(content: &str, file_type: ResourceFileType) -> Result<Vec<DynamicObject>> {
    let documents: Vec<Value> = match file_type {
        ResourceFileType::Json => vec![serde_json::from_str(content).map_err(Error::SerializationError)?],
        ResourceFileType::Yaml => serde_yaml::Deserializer::from_str(content)
            .map(Value::deserialize)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(Error::YamlError)?,
    };

    let mut resources = vec![];
    for document in documents.into_iter().filter(|d| !d.is_null()) {
        if document.get("kind").and_then(Value::as_str) == Some("List") {
            let items = match document.get("items") {
                Some(Value::Array(items)) => items.clone(),
                _ => vec![],
            };
            for item in items {
                resources.push(to_resource(item)?);
            }
        } else {
            resources.push(to_resource(document)?);
        }
    }

    Ok(resources)
}

fn to_resource(value: Value) -> Result<DynamicObject> {
    if value.get("kind").and_then(Value::as_str).map_or(true, str::is_empty) {
        return Err(Error::InvalidResource(format!("resource without kind: {}", value)));
    }
    serde_json::from_value(value).map_err(Error::SerializationError)
}

/// Drops null values and empty arrays, recursively.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null() && !matches!(v, Value::Array(a) if a.is_empty()))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports:
    - port: 80
---
apiVersion: v1
kind: List
items:
  - apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: web
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: settings
---
"#;

    #[test]
    fn test_parse_multi_document_yaml() {
        let resources = parse(RESOURCES, ResourceFileType::Yaml).unwrap();

        let kinds: Vec<Kind> = resources.iter().map(Kind::of).collect();
        assert_eq!(kinds, vec![Kind::Service, Kind::Deployment, Kind::Other]);
    }

    #[test]
    fn test_parse_rejects_resource_without_kind() {
        let err = parse("metadata:\n  name: x\n", ResourceFileType::Yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidResource(_)));
    }

    #[test]
    fn test_prune() {
        let pruned = prune(json!({"a": null, "b": [], "c": {"d": null, "e": 1}, "f": [{"g": null}]}));
        assert_eq!(pruned, json!({"c": {"e": 1}, "f": [{}]}));
    }

    #[test]
    fn test_load_directory_and_write() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-svc.yml"), RESOURCES).unwrap();
        std::fs::write(
            dir.path().join("b-route.json"),
            r#"{"apiVersion":"route.openshift.io/v1","kind":"Route","metadata":{"name":"web"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();
        std::fs::write(dir.path().join("profiles.yml"), "- name: custom\n").unwrap();

        let list = ResourceList::load(dir.path()).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.names_of(Kind::Route), BTreeSet::from(["web".to_string()]));

        let target = dir.path().join("out/openshift.json");
        list.write(&target, ResourceFileType::Json).unwrap();

        let reloaded = ResourceList::load(&target).unwrap();
        assert_eq!(reloaded.len(), 4);
    }
}
