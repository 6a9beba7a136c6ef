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

use std::sync::Arc;

use dd_common::Named;
use dd_resources::ResourceList;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::{Enricher, EnricherContext, PlatformMode, Registry};

/// Runs the active enrichers, in configured order, over a resource list.
pub struct EnricherPipeline {
    enrichers: Vec<Arc<dyn Enricher>>,
}

impl EnricherPipeline {
    /// Instantiates the registry's enrichers and keeps those the context's
    /// processor configuration selects, in its order.
    pub fn new(registry: &Registry, context: Arc<EnricherContext>) -> Result<Self> {
        let candidates: Vec<Arc<dyn Enricher>> = registry
            .create_all(context.clone())
            .into_iter()
            .filter(|enricher| context.config.use_processor(enricher.name()))
            .collect();

        let enrichers = context.config.order(candidates, "enricher").map_err(Error::ConfigError)?;
        debug!("Active enrichers: {:?}", enrichers.iter().map(|e| e.name()).collect::<Vec<_>>());

        Ok(Self { enrichers })
    }

    pub fn from_enrichers(enrichers: Vec<Arc<dyn Enricher>>) -> Self {
        Self { enrichers }
    }

    pub fn enrichers(&self) -> &[Arc<dyn Enricher>] {
        &self.enrichers
    }

    /// Runs every create pass, then every enrich pass.
    ///
    /// The first failure stops the run; changes already made to `resources`
    /// are kept, so the list must not be published after an error.
    pub fn run(&self, mode: PlatformMode, resources: &mut ResourceList) -> Result<()> {
        for enricher in &self.enrichers {
            debug!("Create pass of {}", enricher.name());
            enricher
                .create(mode, resources)
                .map_err(|e| Error::ProcessorFailed(enricher.name().to_string(), Box::new(e)))?;
        }

        for enricher in &self.enrichers {
            debug!("Enrich pass of {}", enricher.name());
            enricher
                .enrich(mode, &self.enrichers, resources)
                .map_err(|e| Error::ProcessorFailed(enricher.name().to_string(), Box::new(e)))?;
        }

        info!("Enriched {} resources for {}", resources.len(), mode);
        Ok(())
    }
}
