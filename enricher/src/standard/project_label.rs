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
use std::sync::Arc;

use dd_common::Named;
use dd_resources::overlay::Contributor;
use dd_resources::Kind;

use crate::{Enricher, EnricherContext};

const NAME: &str = "dd-project-label";
const PROVIDER: &str = "drydock";

/// Labels resources with the project coordinates.
///
/// Options:
/// - `useProjectLabel`: label with `project` instead of `app` (default `false`)
pub struct ProjectLabelEnricher {
    context: Arc<EnricherContext>,
}

impl ProjectLabelEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }

    fn project_labels(&self, with_version: bool) -> BTreeMap<String, String> {
        let project = &self.context.project;
        let mut labels = BTreeMap::new();

        let key = if self.context.get_bool(NAME, "useProjectLabel", false) { "project" } else { "app" };
        labels.insert(key.to_string(), project.name.clone());
        if let Some(group) = &project.group {
            labels.insert("group".to_string(), group.clone());
        }
        labels.insert("provider".to_string(), PROVIDER.to_string());
        if let Some(version) = project.version.as_ref().filter(|_| with_version) {
            labels.insert("version".to_string(), version.clone());
        }

        labels
    }
}

impl Named for ProjectLabelEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for ProjectLabelEnricher {
    fn labels(&self, _kind: Kind) -> BTreeMap<String, String> {
        self.project_labels(true)
    }

    // selectors never carry the version
    fn selector(&self, _kind: Kind) -> BTreeMap<String, String> {
        self.project_labels(false)
    }
}

impl Enricher for ProjectLabelEnricher {}
