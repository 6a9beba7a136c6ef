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

use crate::standard::{
    DefaultNameEnricher, DeploymentConfigEnricher, MetadataEnricher, ProjectLabelEnricher, ReplicaCountEnricher,
    RouteEnricher,
};
use crate::{Enricher, EnricherContext};

/// Constructs an enricher for a context.
pub type Factory = fn(Arc<EnricherContext>) -> Arc<dyn Enricher>;

/// The enrichers known to drydock, in their default order.
pub struct Registry {
    factories: Vec<Factory>,
}

impl Registry {
    pub fn empty() -> Self {
        Self { factories: vec![] }
    }

    /// The built-in enrichers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(|ctx| Arc::new(DefaultNameEnricher::new(ctx)));
        registry.register(|ctx| Arc::new(ReplicaCountEnricher::new(ctx)));
        registry.register(|ctx| Arc::new(ProjectLabelEnricher::new(ctx)));
        registry.register(|ctx| Arc::new(DeploymentConfigEnricher::new(ctx)));
        registry.register(|ctx| Arc::new(RouteEnricher::new(ctx)));
        registry.register(|ctx| Arc::new(MetadataEnricher::new(ctx)));
        registry
    }

    pub fn register(&mut self, factory: Factory) -> &mut Self {
        self.factories.push(factory);
        self
    }

    /// Instantiates every registered enricher, in registration order.
    pub fn create_all(&self, context: Arc<EnricherContext>) -> Vec<Arc<dyn Enricher>> {
        self.factories.iter().map(|factory| factory(context.clone())).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
