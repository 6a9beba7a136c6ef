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

use std::path::Path;

use anyhow::Context as _;
use dd_common::config::{BuildServiceConfig, Credentials, ProcessorConfig, ResourceConfig};
use dd_common::image::ImageConfig;
use dd_common::project::Project;
use serde::Deserialize;

/// Everything drydock knows about the project it works on.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub project: Project,

    #[serde(default)]
    pub images: Vec<ImageConfig>,

    #[serde(default)]
    pub resources: ResourceConfig,

    /// Laid over the enricher configuration of the selected profile.
    #[serde(default)]
    pub enricher: ProcessorConfig,

    /// Laid over the generator configuration of the selected profile.
    #[serde(default)]
    pub generator: ProcessorConfig,

    #[serde(default)]
    pub build: Option<BuildServiceConfig>,

    #[serde(default)]
    pub credentials: Credentials,
}

impl ProjectDescriptor {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// The build settings, defaulting to `target` and the project name.
    pub fn build_config(&self) -> BuildServiceConfig {
        self.build.clone().unwrap_or_else(|| BuildServiceConfig::new("target", self.project.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use dd_common::config::BuildStrategy;

    use super::*;

    const DESCRIPTOR: &str = r#"
project:
  name: shop
  version: 1.0.0
images:
  - name: shop/app:1.0
    build:
      from: registry.access.redhat.com/ubi8/openjdk-17
      contextDir: target/docker
resources:
  replicas: 2
  labels:
    all:
      team: checkout
enricher:
  config:
    dd-openshift-route:
      generateRoute: false
build:
  buildDirectory: target
  artifactId: shop
  strategy: docker
"#;

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drydock.yml");
        std::fs::write(&path, DESCRIPTOR).unwrap();

        let descriptor = ProjectDescriptor::load(&path).unwrap();

        assert_eq!(descriptor.project.version.as_deref(), Some("1.0.0"));
        assert_eq!(descriptor.images.len(), 1);
        assert_eq!(descriptor.resources.replicas, Some(2));
        assert_eq!(descriptor.enricher.get_config("dd-openshift-route", "generateRoute"), Some("false"));
        assert_eq!(descriptor.build_config().strategy, BuildStrategy::Docker);
    }

    #[test]
    fn test_default_build_config() {
        let descriptor = ProjectDescriptor { project: Project::new("shop"), ..Default::default() };
        let config = descriptor.build_config();

        assert_eq!(config.artifact_id, "shop");
        assert_eq!(config.build_name_suffix, "-s2i");
    }

    #[test]
    fn test_missing_file() {
        assert!(ProjectDescriptor::load(Path::new("does-not-exist.yml")).is_err());
    }
}
