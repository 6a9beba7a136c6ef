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
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A parsed image reference: `[registry/]repository[:tag][@digest]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageName {
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageName {
    /// Last path segment of the repository, used to name build configs and
    /// image streams.
    pub fn simple_name(&self) -> &str {
        self.repository.rsplit('/').next().unwrap_or(&self.repository)
    }

    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or("latest")
    }
}

impl FromStr for ImageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidImageName(s.to_string()));
        }

        let (rest, digest) = match s.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (s, None),
        };

        // a colon after the last slash separates the tag; before it, a port
        let (rest, tag) = match rest.rfind(':') {
            Some(pos) if pos > rest.rfind('/').unwrap_or(0) => (&rest[..pos], Some(rest[pos + 1..].to_string())),
            _ => (rest, None),
        };

        let (registry, repository) = match rest.split_once('/') {
            Some((first, remainder)) if first.contains('.') || first.contains(':') || first == "localhost" => {
                (Some(first.to_string()), remainder.to_string())
            }
            _ => (None, rest.to_string()),
        };

        if repository.is_empty() || repository.ends_with('/') || tag.as_deref() == Some("") {
            return Err(Error::InvalidImageName(s.to_string()));
        }

        Ok(ImageName { registry, repository, tag, digest })
    }
}

impl Display for ImageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Build parameters of an image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildImageConfig {
    /// Base image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Extended base image reference for S2I builds: `kind`, `name`, `namespace`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub from_ext: BTreeMap<String, String>,

    /// Build-time environment; S2I builds receive it as `.s2i/environment`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Directory packed into the binary build archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<PathBuf>,

    /// A ready-made build archive, used instead of `context_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildImageConfig>,
}

impl ImageConfig {
    pub fn image_name(&self) -> Result<ImageName> {
        self.name.parse()
    }
}
