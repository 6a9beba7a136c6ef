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
use dd_resources::overlay::{Contributor, MetadataOverlay, SelectorOverlay};
use dd_resources::ResourceList;

use crate::errors::Result;
use crate::{Enricher, EnricherContext, PlatformMode};

const NAME: &str = "dd-metadata";

/// Applies configured labels and annotations together with everything the
/// active enrichers contribute.
pub struct MetadataEnricher {
    context: Arc<EnricherContext>,
}

impl MetadataEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }
}

impl Named for MetadataEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for MetadataEnricher {}

impl Enricher for MetadataEnricher {
    fn enrich(&self, _mode: PlatformMode, active: &[Arc<dyn Enricher>], resources: &mut ResourceList) -> Result<()> {
        let metadata = MetadataOverlay::new(&self.context.resources, active);
        let selector = SelectorOverlay::new(active);

        for resource in resources.iter_mut() {
            metadata.apply(resource);
            selector.apply(resource);
        }
        Ok(())
    }
}
