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

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// How OpenShift builds the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    #[default]
    S2i,
    Docker,
}

impl FromStr for BuildStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s2i" => Ok(BuildStrategy::S2i),
            "docker" => Ok(BuildStrategy::Docker),
            _ => Err(Error::UnknownValue("build strategy", s.to_string())),
        }
    }
}

impl Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStrategy::S2i => f.write_str("s2i"),
            BuildStrategy::Docker => f.write_str("docker"),
        }
    }
}

/// Which existing objects are deleted and recreated before a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecreateMode {
    #[default]
    None,
    BuildConfig,
    ImageStream,
    All,
}

impl RecreateMode {
    pub fn is_build_config(&self) -> bool {
        matches!(self, RecreateMode::BuildConfig | RecreateMode::All)
    }

    pub fn is_image_stream(&self) -> bool {
        matches!(self, RecreateMode::ImageStream | RecreateMode::All)
    }
}

impl FromStr for RecreateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "false" => Ok(RecreateMode::None),
            "buildconfig" | "bc" => Ok(RecreateMode::BuildConfig),
            "imagestream" | "is" => Ok(RecreateMode::ImageStream),
            "all" | "true" => Ok(RecreateMode::All),
            _ => Err(Error::UnknownValue("recreate mode", s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for RecreateMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Format of written resource descriptors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFileType {
    #[default]
    Yaml,
    Json,
}

impl ResourceFileType {
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceFileType::Yaml => "yml",
            ResourceFileType::Json => "json",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "yml" | "yaml" => Some(ResourceFileType::Yaml),
            "json" => Some(ResourceFileType::Json),
            _ => None,
        }
    }
}

impl FromStr for ResourceFileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(&s.to_lowercase()).ok_or_else(|| Error::UnknownValue("resource file type", s.to_string()))
    }
}

fn default_build_name_suffix() -> String {
    String::from("-s2i")
}

fn default_pull_secret() -> String {
    String::from("pullsecret-drydock")
}

fn default_true() -> bool {
    true
}

/// Settings of the OpenShift build service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildServiceConfig {
    /// Where build archives and the image stream descriptor are written.
    pub build_directory: PathBuf,

    pub artifact_id: String,

    #[serde(default)]
    pub strategy: BuildStrategy,

    /// Appended to the image's simple name to form the BuildConfig name.
    #[serde(default = "default_build_name_suffix")]
    pub build_name_suffix: String,

    #[serde(default)]
    pub recreate_mode: RecreateMode,

    /// `spec.lookupPolicy.local` of created image streams.
    #[serde(default = "default_true")]
    pub lookup_policy_local: bool,

    #[serde(default = "default_pull_secret")]
    pub pull_secret: String,

    #[serde(default)]
    pub resource_file_type: ResourceFileType,
}

impl BuildServiceConfig {
    pub fn new(build_directory: impl Into<PathBuf>, artifact_id: impl Into<String>) -> Self {
        Self {
            build_directory: build_directory.into(),
            artifact_id: artifact_id.into(),
            strategy: BuildStrategy::default(),
            build_name_suffix: default_build_name_suffix(),
            recreate_mode: RecreateMode::default(),
            lookup_policy_local: true,
            pull_secret: default_pull_secret(),
            resource_file_type: ResourceFileType::default(),
        }
    }

    /// `<buildDirectory>/<artifactId>-is.<ext>`
    pub fn image_stream_file(&self) -> PathBuf {
        self.build_directory.join(format!("{}-is.{}", self.artifact_id, self.resource_file_type.extension()))
    }
}
