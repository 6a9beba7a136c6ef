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

use dd_common::config::{BuildStrategy, RecreateMode, ResourceFileType};
use dd_enricher::PlatformMode;

/// The configuration parameters for the application.
///
/// These can either be passed on the command line, or pulled from environment variables.
/// For development convenience, these can also be read from a `.env` file in the working
/// directory where the application is started.
#[derive(clap::Parser)]
#[command(name = "drydock", version, about)]
pub struct Config {
    /// The project descriptor holding the project coordinates, images,
    /// resource configuration and processor overrides.
    #[clap(long, env = "DD_PROJECT", default_value = "drydock.yml", global = true)]
    pub project: PathBuf,

    /// The directory with resource fragments and an optional `profiles.yml`.
    #[clap(long, env = "DD_RESOURCE_DIR", default_value = "src/main/drydock", global = true)]
    pub resource_dir: PathBuf,

    /// The profile selecting and configuring enrichers and generators,
    /// the default is `default`.
    #[clap(long, env = "DD_PROFILE", default_value = "default", global = true)]
    pub profile: String,

    /// Log at debug level.
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Enrich the resource fragments and write the manifest.
    Resource(ResourceArgs),

    /// Build the project images inside OpenShift.
    Build(BuildArgs),
}

#[derive(clap::Args)]
pub struct ResourceArgs {
    /// The platform to generate for, `kubernetes` or `openshift`.
    #[clap(long, env = "DD_MODE", default_value = "kubernetes")]
    pub mode: PlatformMode,

    /// The directory the manifest is written to, as `<mode>.<ext>`.
    #[clap(long, short, env = "DD_OUTPUT", default_value = "target/drydock")]
    pub output: PathBuf,

    /// The manifest format, `yaml` or `json`.
    #[clap(long, env = "DD_RESOURCE_FILE_TYPE", default_value = "yaml")]
    pub format: ResourceFileType,
}

#[derive(clap::Args)]
pub struct BuildArgs {
    /// The namespace builds run in, the default is the namespace of the
    /// current kube context.
    #[clap(long, env = "DD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Overrides the build strategy of the project descriptor.
    #[clap(long, env = "DD_BUILD_STRATEGY")]
    pub strategy: Option<BuildStrategy>,

    /// Overrides the recreate mode of the project descriptor.
    #[clap(long, env = "DD_BUILD_RECREATE")]
    pub recreate: Option<RecreateMode>,
}
