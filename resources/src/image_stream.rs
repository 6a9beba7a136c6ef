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

//! The image stream descriptor written after OpenShift builds.
//!
//! Every build adds (or replaces, by name) one ImageStream whose single tag
//! points at the image that was just pushed, so a multi-image project ends
//! up with one descriptor listing all of them.

use std::path::Path;

use dd_common::image::ImageName;
use kube::core::DynamicObject;
use serde_json::{from_value, json};
use tracing::info;

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::list::{file_type, ResourceList};

/// An ImageStream tagging `<simple name>@<sha>` in `namespace`.
pub fn new_tagged_image_stream(image: &ImageName, namespace: &str, sha: &str) -> Result<DynamicObject> {
    let name = image.simple_name();

    from_value(json!({
        "apiVersion": "image.openshift.io/v1",
        "kind": "ImageStream",
        "metadata": {
            "name": name,
        },
        "spec": {
            "tags": [{
                "name": image.tag_or_latest(),
                "from": {
                    "kind": "ImageStreamImage",
                    "name": format!("{}@{}", name, sha),
                    "namespace": namespace,
                },
            }],
        }
    }))
    .map_err(Error::SerializationError)
}

/// Adds `image_stream` to the descriptor at `target`, keeping the image
/// streams already recorded there under other names.
pub fn append_image_stream(target: &Path, image_stream: DynamicObject) -> Result<()> {
    let file_type = file_type(target).ok_or_else(|| Error::UnsupportedExtension(target.to_path_buf()))?;
    let name = image_stream.metadata.name.clone().ok_or(Error::MissingObjectKey(".metadata.name"))?;

    let mut list = if target.metadata().map(|m| m.len() > 0).unwrap_or(false) {
        ResourceList::load(target)?
    } else {
        ResourceList::new()
    };

    list.items_mut().retain(|r| Kind::of(r) == Kind::ImageStream && r.metadata.name.as_deref() != Some(name.as_str()));
    list.push(image_stream);
    list.items_mut().sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));

    list.write(target, file_type)?;
    info!("ImageStream {} written to {}", name, target.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tagged_image_stream() {
        let image: ImageName = "demo/app:1.0".parse().unwrap();
        let stream = new_tagged_image_stream(&image, "dev", "sha256:abc").unwrap();

        assert_eq!(stream.metadata.name.as_deref(), Some("app"));
        assert_eq!(
            stream.data.pointer("/spec/tags/0"),
            Some(&json!({
                "name": "1.0",
                "from": {"kind": "ImageStreamImage", "name": "app@sha256:abc", "namespace": "dev"}
            }))
        );
    }

    #[test]
    fn test_append_accumulates_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("demo-is.yml");

        let app: ImageName = "app".parse().unwrap();
        let worker: ImageName = "worker".parse().unwrap();
        append_image_stream(&target, new_tagged_image_stream(&app, "dev", "sha256:1").unwrap()).unwrap();
        append_image_stream(&target, new_tagged_image_stream(&worker, "dev", "sha256:2").unwrap()).unwrap();
        append_image_stream(&target, new_tagged_image_stream(&app, "dev", "sha256:3").unwrap()).unwrap();

        let list = ResourceList::load(&target).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.items()[0].data.pointer("/spec/tags/0/from/name"), Some(&json!("app@sha256:3")));
        assert_eq!(list.items()[1].metadata.name.as_deref(), Some("worker"));
    }
}
