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

//! Generators derive image configurations before resources are built.
//! They are filtered and ordered by the same engine as the enrichers.

use std::sync::Arc;

use dd_common::config::ProcessorConfig;
use dd_common::image::{BuildImageConfig, ImageConfig};
use dd_common::project::Project;
use dd_common::Named;
use tracing::{debug, info};

use crate::errors::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct GeneratorContext {
    pub project: Project,
    /// The generator section of the selected profile.
    pub config: ProcessorConfig,
}

pub trait Generator: Named + Send + Sync {
    /// Whether the generator has something to add to `images`.
    fn is_applicable(&self, images: &[ImageConfig]) -> bool;

    fn customize(&self, images: Vec<ImageConfig>) -> Result<Vec<ImageConfig>>;
}

pub type GeneratorFactory = fn(Arc<GeneratorContext>) -> Arc<dyn Generator>;

/// Runs the selected generators over the image configurations.
pub struct GeneratorManager {
    context: Arc<GeneratorContext>,
    factories: Vec<GeneratorFactory>,
}

impl GeneratorManager {
    pub fn new(context: Arc<GeneratorContext>) -> Self {
        let mut manager = Self { context, factories: vec![] };
        manager.register(|ctx| Arc::new(DefaultImageGenerator::new(ctx)));
        manager
    }

    pub fn register(&mut self, factory: GeneratorFactory) -> &mut Self {
        self.factories.push(factory);
        self
    }

    pub fn generate(&self, images: Vec<ImageConfig>) -> Result<Vec<ImageConfig>> {
        let config = &self.context.config;
        let candidates: Vec<Arc<dyn Generator>> = self
            .factories
            .iter()
            .map(|factory| factory(self.context.clone()))
            .filter(|generator| config.use_processor(generator.name()))
            .collect();
        let generators = config.order(candidates, "generator").map_err(Error::ConfigError)?;

        let mut images = images;
        for generator in generators {
            if generator.is_applicable(&images) {
                debug!("Running generator {}", generator.name());
                images = generator
                    .customize(images)
                    .map_err(|e| Error::ProcessorFailed(generator.name().to_string(), Box::new(e)))?;
            }
        }
        Ok(images)
    }
}

const DEFAULT_IMAGE: &str = "dd-default-image";

/// Adds an image configuration when none is given and a base image is
/// configured.
///
/// Options:
/// - `from`: base image (required for the generator to apply)
/// - `name`: image name (default `<project>:latest`)
pub struct DefaultImageGenerator {
    context: Arc<GeneratorContext>,
}

impl DefaultImageGenerator {
    pub fn new(context: Arc<GeneratorContext>) -> Self {
        Self { context }
    }

    fn from(&self) -> Option<&str> {
        self.context.config.get_config(DEFAULT_IMAGE, "from").filter(|f| !f.trim().is_empty())
    }
}

impl Named for DefaultImageGenerator {
    fn name(&self) -> &str {
        DEFAULT_IMAGE
    }
}

impl Generator for DefaultImageGenerator {
    fn is_applicable(&self, images: &[ImageConfig]) -> bool {
        images.is_empty() && self.from().is_some() && !self.context.project.name.is_empty()
    }

    fn customize(&self, mut images: Vec<ImageConfig>) -> Result<Vec<ImageConfig>> {
        let default_name = format!("{}:latest", self.context.project.name.to_lowercase());
        let name = self.context.config.get_config_or(DEFAULT_IMAGE, "name", &default_name).to_string();

        info!("Adding image {} built from {}", name, self.from().unwrap_or_default());
        images.push(ImageConfig {
            name,
            alias: Some(self.context.project.name.clone()),
            build: Some(BuildImageConfig { from: self.from().map(str::to_string), ..Default::default() }),
        });
        Ok(images)
    }
}
