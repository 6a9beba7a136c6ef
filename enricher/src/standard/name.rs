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
use dd_resources::overlay::Contributor;
use dd_resources::ResourceList;
use tracing::debug;

use crate::errors::Result;
use crate::{Enricher, EnricherContext, PlatformMode};

const NAME: &str = "dd-name";

/// Names every resource that has no name yet. The name defaults to the
/// project name and can be set with the `name` option.
pub struct DefaultNameEnricher {
    context: Arc<EnricherContext>,
}

impl DefaultNameEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }

    fn default_name(&self) -> String {
        let name = self.context.get(NAME, "name", &self.context.project.name);
        sanitize(name)
    }
}

impl Named for DefaultNameEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for DefaultNameEnricher {}

impl Enricher for DefaultNameEnricher {
    fn create(&self, _mode: PlatformMode, resources: &mut ResourceList) -> Result<()> {
        let default_name = self.default_name();

        for resource in resources.iter_mut() {
            if resource.metadata.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                debug!("Naming unnamed resource {}", default_name);
                resource.metadata.name = Some(default_name.clone());
            }
        }
        Ok(())
    }
}

/// Lowercases `name` and replaces everything but alphanumerics, `-` and `.`
/// by `-`.
fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
