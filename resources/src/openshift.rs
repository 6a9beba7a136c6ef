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

//! Constructors for the OpenShift objects drydock creates.

use std::collections::BTreeMap;

use dd_common::config::BuildStrategy;
use dd_common::image::ImageConfig;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde_json::{from_value, json, Value};

use crate::error::{Error, Result};
use crate::list::prune;

#[inline]
pub fn build_config_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("build.openshift.io", "v1", "BuildConfig"))
}

#[inline]
pub fn build_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("build.openshift.io", "v1", "Build"))
}

#[inline]
pub fn image_stream_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("image.openshift.io", "v1", "ImageStream"))
}

/// The `spec.strategy` of a BuildConfig building `image`.
///
/// S2I builds take their builder image from the image's `fromExt`
/// (`kind`, `name`, `namespace`), defaulting to the `from` image as a
/// `DockerImage`. `ImageStreamTag` references default to the `openshift`
/// namespace. A `pull_secret` is referenced from the strategy parameters.
pub fn build_strategy(image: &ImageConfig, strategy: BuildStrategy, pull_secret: Option<&str>) -> Result<Value> {
    let pull_secret = pull_secret.map(|name| json!({ "name": name }));

    match strategy {
        BuildStrategy::Docker => match pull_secret {
            Some(secret) => Ok(json!({ "type": "Docker", "dockerStrategy": { "pullSecret": secret } })),
            None => Ok(json!({ "type": "Docker" })),
        },
        BuildStrategy::S2i => {
            let build = image.build.clone().unwrap_or_default();
            let ext = |key: &str| build.from_ext.get(key).filter(|v| !v.is_empty()).cloned();

            let kind = ext("kind").unwrap_or_else(|| String::from("DockerImage"));
            let name = ext("name")
                .or_else(|| build.from.clone())
                .ok_or_else(|| Error::InvalidResource(format!("no base image configured for S2I build of {}", image.name)))?;
            let namespace = ext("namespace").or_else(|| (kind == "ImageStreamTag").then(|| String::from("openshift")));

            let mut source = json!({ "from": { "kind": kind, "name": name } });
            if let Some(namespace) = namespace {
                source["from"]["namespace"] = Value::String(namespace);
            }
            if let Some(secret) = pull_secret {
                source["pullSecret"] = secret;
            }
            Ok(json!({ "type": "Source", "sourceStrategy": source }))
        }
    }
}

/// The `spec.output` of a BuildConfig pushing to `image_stream_tag`.
pub fn build_output(image_stream_tag: &str) -> Value {
    json!({ "to": { "kind": "ImageStreamTag", "name": image_stream_tag } })
}

pub fn new_build_config(name: &str, strategy: Value, output: Value) -> Result<DynamicObject> {
    from_value(json!({
        "apiVersion": "build.openshift.io/v1",
        "kind": "BuildConfig",
        "metadata": {
            "name": name,
        },
        "spec": {
            "source": { "type": "Binary" },
            "strategy": strategy,
            "output": output,
        }
    }))
    .map_err(Error::SerializationError)
}

pub fn new_image_stream(name: &str, lookup_policy_local: bool) -> Result<DynamicObject> {
    from_value(json!({
        "apiVersion": "image.openshift.io/v1",
        "kind": "ImageStream",
        "metadata": {
            "name": name,
        },
        "spec": {
            "lookupPolicy": { "local": lookup_policy_local },
        }
    }))
    .map_err(Error::SerializationError)
}

/// A Route to the Service `service`, on the given target port.
pub fn new_route(service: &str, labels: Option<&BTreeMap<String, String>>, target_port: &Value) -> Result<DynamicObject> {
    from_value(json!({
        "apiVersion": "route.openshift.io/v1",
        "kind": "Route",
        "metadata": {
            "name": service,
            "labels": labels,
        },
        "spec": {
            "port": { "targetPort": target_port },
            "to": { "kind": "Service", "name": service },
        }
    }))
    .map_err(Error::SerializationError)
}

/// Compares two spec fragments, ignoring nulls and empty arrays the server
/// may add or drop.
pub fn same_spec(a: Option<&Value>, b: Option<&Value>) -> bool {
    let normalize = |v: Option<&Value>| v.cloned().map(prune).filter(|v| !v.is_null());
    normalize(a) == normalize(b)
}

/// `status.phase` of a Build, if reported.
pub fn build_phase(build: &DynamicObject) -> Option<&str> {
    build.data.pointer("/status/phase").and_then(Value::as_str)
}

/// Reason and message of a Build's status, for error reports.
pub fn build_status_reason(build: &DynamicObject) -> String {
    let field = |key: &str| build.data.pointer(&format!("/status/{}", key)).and_then(Value::as_str);
    match (field("reason"), field("message")) {
        (Some(reason), Some(message)) => format!("{}: {}", reason, message),
        (Some(reason), None) => reason.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => build_phase(build).unwrap_or("Unknown").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use dd_common::image::BuildImageConfig;

    use super::*;

    fn image(from_ext: &[(&str, &str)]) -> ImageConfig {
        ImageConfig {
            name: "demo/app:1.0".into(),
            build: Some(BuildImageConfig {
                from: Some("registry.access.redhat.com/ubi8/openjdk-17".into()),
                from_ext: from_ext.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_s2i_strategy_defaults_to_docker_image() {
        let strategy = build_strategy(&image(&[]), BuildStrategy::S2i, None).unwrap();

        assert_eq!(
            strategy,
            json!({"type": "Source", "sourceStrategy": {"from": {
                "kind": "DockerImage",
                "name": "registry.access.redhat.com/ubi8/openjdk-17",
            }}})
        );
    }

    #[test]
    fn test_s2i_image_stream_tag_defaults_namespace() {
        let strategy =
            build_strategy(&image(&[("kind", "ImageStreamTag"), ("name", "java:11")]), BuildStrategy::S2i, None)
                .unwrap();

        assert_eq!(strategy.pointer("/sourceStrategy/from/namespace"), Some(&json!("openshift")));
        assert_eq!(strategy.pointer("/sourceStrategy/from/name"), Some(&json!("java:11")));
    }

    #[test]
    fn test_s2i_without_base_image_fails() {
        let image = ImageConfig { name: "app".into(), ..Default::default() };
        assert!(build_strategy(&image, BuildStrategy::S2i, None).is_err());
        assert_eq!(build_strategy(&image, BuildStrategy::Docker, None).unwrap(), json!({"type": "Docker"}));
    }

    #[test]
    fn test_pull_secret_reference() {
        let docker = build_strategy(&image(&[]), BuildStrategy::Docker, Some("pullsecret-drydock")).unwrap();
        assert_eq!(docker.pointer("/dockerStrategy/pullSecret/name"), Some(&json!("pullsecret-drydock")));

        let source = build_strategy(&image(&[]), BuildStrategy::S2i, Some("pullsecret-drydock")).unwrap();
        assert_eq!(source.pointer("/sourceStrategy/pullSecret/name"), Some(&json!("pullsecret-drydock")));
    }

    #[test]
    fn test_new_build_config() {
        let bc = new_build_config("app-s2i", json!({"type": "Docker"}), build_output("app:latest")).unwrap();

        assert_eq!(bc.metadata.name.as_deref(), Some("app-s2i"));
        assert_eq!(bc.data.pointer("/spec/source/type"), Some(&json!("Binary")));
        assert_eq!(bc.data.pointer("/spec/output/to/name"), Some(&json!("app:latest")));
    }

    #[test]
    fn test_same_spec_ignores_nulls() {
        let a = json!({"type": "Docker", "dockerStrategy": null});
        let b = json!({"type": "Docker"});

        assert!(same_spec(Some(&a), Some(&b)));
        assert!(!same_spec(Some(&a), None));
    }

    #[test]
    fn test_build_status_reason() {
        let build: DynamicObject = from_value(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "Build",
            "metadata": {"name": "app-s2i-1"},
            "status": {"phase": "Failed", "reason": "DockerBuildFailed", "message": "Docker build strategy has failed."}
        }))
        .unwrap();

        assert_eq!(build_phase(&build), Some("Failed"));
        assert_eq!(build_status_reason(&build), "DockerBuildFailed: Docker build strategy has failed.");
    }
}
