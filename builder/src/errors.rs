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

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),

    #[error("Watch Error: {0}")]
    WatchError(#[source] kube::runtime::watcher::Error),

    #[error("Watch of {0} closed")]
    WatchClosed(String),

    #[error("Log Error: {0}")]
    LogError(#[source] std::io::Error),

    #[error("Http Error: {0}")]
    HttpError(#[source] http::Error),

    #[error("Resource Error: {0}")]
    ResourceError(#[source] dd_resources::error::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[source] dd_common::errors::Error),

    #[error("Enricher Error: {0}")]
    EnricherError(#[source] dd_enricher::errors::Error),

    #[error("Failed to read build context {0}: {1}")]
    ArchiveError(PathBuf, #[source] std::io::Error),

    #[error("No build context configured for image {0}")]
    MissingBuildContext(String),

    #[error("Could not find a current ImageStream with name {name} in namespace {namespace}")]
    ImageStreamNotFound { name: String, namespace: String },

    #[error("Could not find a tag in the ImageStream {0}")]
    NoTagFound(String),

    #[error("OpenShift Build {name} failed: {reason}")]
    BuildFailed { name: String, reason: String },

    #[error("Binary build of {0} did not return a Build")]
    MissingBuild(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
