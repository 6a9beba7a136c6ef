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

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dd_builder::api::KubeOpenShiftApi;
use dd_builder::{BuildDirector, OpenShiftBuilder};
use dd_common::config::profile::extract_processor_config;
use dd_common::config::{ProcessorConfig, ProcessorKind};
use dd_common::image::ImageConfig;
use dd_enricher::generator::{GeneratorContext, GeneratorManager};
use dd_enricher::{EnricherContext, EnricherPipeline, Registry};
use dd_resources::ResourceList;
use tracing::{info, warn};

use crate::config::{BuildArgs, Command, Config, ResourceArgs};
use crate::descriptor::ProjectDescriptor;

/// The parsed command line together with the project it works on.
pub struct Context {
    pub config: Config,
    pub descriptor: ProjectDescriptor,
}

impl Context {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let descriptor = ProjectDescriptor::load(&config.project)?;
        Ok(Self { config, descriptor })
    }

    fn profile_dir(&self) -> Option<&Path> {
        Some(self.config.resource_dir.as_path()).filter(|dir| dir.is_dir())
    }

    /// The processor configuration of `kind` from the selected profile, with
    /// the project descriptor's overrides laid on top.
    fn processor_config(&self, kind: ProcessorKind) -> anyhow::Result<ProcessorConfig> {
        let profile = extract_processor_config(kind, Some(&self.config.profile), self.profile_dir())?;
        let overrides = match kind {
            ProcessorKind::Generator => &self.descriptor.generator,
            _ => &self.descriptor.enricher,
        };
        Ok(ProcessorConfig::merge(overrides, &profile))
    }

    /// The configured images, completed by the generators.
    pub fn images(&self) -> anyhow::Result<Vec<ImageConfig>> {
        let context = GeneratorContext {
            project: self.descriptor.project.clone(),
            config: self.processor_config(ProcessorKind::Generator)?,
        };
        Ok(GeneratorManager::new(Arc::new(context)).generate(self.descriptor.images.clone())?)
    }

    pub fn pipeline(&self) -> anyhow::Result<EnricherPipeline> {
        let context = EnricherContext {
            project: self.descriptor.project.clone(),
            resources: self.descriptor.resources.clone(),
            config: self.processor_config(ProcessorKind::Enricher)?,
        };
        Ok(EnricherPipeline::new(&Registry::standard(), Arc::new(context))?)
    }
}

pub async fn run(ctx: Context) -> anyhow::Result<()> {
    match &ctx.config.command {
        Command::Resource(args) => {
            resource(&ctx, args)?;
        }
        Command::Build(args) => build(&ctx, args).await?,
    }
    Ok(())
}

/// Enriches the resource fragments and writes the manifest, returning its path.
pub fn resource(ctx: &Context, args: &ResourceArgs) -> anyhow::Result<PathBuf> {
    let pipeline = ctx.pipeline()?;

    let dir = &ctx.config.resource_dir;
    let mut resources = if dir.exists() {
        ResourceList::load(dir)?
    } else {
        warn!("No resource fragments found at {}", dir.display());
        ResourceList::new()
    };

    pipeline.run(args.mode, &mut resources)?;

    let target = args.output.join(format!("{}.{}", args.mode, args.format.extension()));
    resources.write(&target, args.format)?;
    info!("Wrote {} resources to {}", resources.len(), target.display());

    Ok(target)
}

/// Builds every image of the project inside OpenShift.
pub async fn build(ctx: &Context, args: &BuildArgs) -> anyhow::Result<()> {
    let images = ctx.images()?;
    if images.is_empty() {
        warn!("No images to build");
        return Ok(());
    }

    let mut config = ctx.descriptor.build_config();
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(recreate) = args.recreate {
        config.recreate_mode = recreate;
    }

    // Create and initialize a k8s client using the inferred configuration.
    let client = kube::Client::try_default().await?;
    let api = Arc::new(KubeOpenShiftApi::new(client, args.namespace.clone()));

    let builder = OpenShiftBuilder::new(api, config, ctx.descriptor.credentials.clone())
        .with_pipeline(ctx.pipeline()?);
    BuildDirector::new(Box::new(builder)).build(&images).await?;

    Ok(())
}
