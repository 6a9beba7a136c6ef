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
use std::str::FromStr;
use std::sync::Arc;

use dd_common::config::{ProcessorConfig, ResourceConfig};
use dd_common::project::Project;
use dd_common::Named;
use dd_resources::overlay::Contributor;
use dd_resources::ResourceList;

pub mod errors;
use errors::{Error, Result};

mod pipeline;
pub use pipeline::EnricherPipeline;

mod registry;
pub use registry::{Factory, Registry};

pub mod generator;
pub mod standard;

/// The platform the resources are generated for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlatformMode {
    #[default]
    Kubernetes,
    Openshift,
}

impl FromStr for PlatformMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(PlatformMode::Kubernetes),
            "openshift" => Ok(PlatformMode::Openshift),
            _ => Err(Error::ConfigError(dd_common::errors::Error::UnknownValue("platform mode", s.to_string()))),
        }
    }
}

impl Display for PlatformMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformMode::Kubernetes => f.write_str("kubernetes"),
            PlatformMode::Openshift => f.write_str("openshift"),
        }
    }
}

/// Everything enrichers read, handed to them when they are constructed.
#[derive(Clone, Debug, Default)]
pub struct EnricherContext {
    pub project: Project,
    pub resources: ResourceConfig,
    /// The enricher section of the selected profile.
    pub config: ProcessorConfig,
}

impl EnricherContext {
    /// Configuration value of `key` for the enricher `name`, or `default`.
    pub fn get<'a>(&'a self, name: &str, key: &str, default: &'a str) -> &'a str {
        self.config.get_config_or(name, key, default)
    }

    /// Boolean configuration value; anything but `true` (ignoring case) is false.
    pub fn get_bool(&self, name: &str, key: &str, default: bool) -> bool {
        self.config.get_config(name, key).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(default)
    }
}

/// A named transformation step over the resource list.
///
/// `create` passes of all enrichers run before any `enrich` pass. Labels,
/// annotations and selectors contributed through [`Contributor`] are
/// applied by the metadata enricher.
pub trait Enricher: Named + Contributor + Send + Sync {
    /// Adds, removes or replaces resources.
    fn create(&self, _mode: PlatformMode, _resources: &mut ResourceList) -> Result<()> {
        Ok(())
    }

    /// Mutates existing resources. `active` holds every enricher of the
    /// pipeline, in run order.
    fn enrich(&self, _mode: PlatformMode, _active: &[Arc<dyn Enricher>], _resources: &mut ResourceList) -> Result<()> {
        Ok(())
    }
}
