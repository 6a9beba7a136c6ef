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
use dd_resources::{Kind, ResourceList};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::Result;
use crate::{Enricher, EnricherContext, PlatformMode};

const NAME: &str = "dd-replicas";

const REPLICATED: [Kind; 5] =
    [Kind::Deployment, Kind::DeploymentConfig, Kind::ReplicaSet, Kind::ReplicationController, Kind::StatefulSet];

/// Sets the configured replica count on controllers that declare none.
pub struct ReplicaCountEnricher {
    context: Arc<EnricherContext>,
}

impl ReplicaCountEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }
}

impl Named for ReplicaCountEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for ReplicaCountEnricher {}

impl Enricher for ReplicaCountEnricher {
    fn enrich(&self, _mode: PlatformMode, _active: &[Arc<dyn Enricher>], resources: &mut ResourceList) -> Result<()> {
        let replicas = match self.context.resources.replicas {
            Some(replicas) => replicas,
            None => return Ok(()),
        };

        for resource in resources.iter_mut() {
            if !REPLICATED.contains(&Kind::of(resource)) {
                continue;
            }
            if !resource.data.get("spec").is_some_and(Value::is_object) {
                resource.data["spec"] = json!({});
            }
            let spec = &mut resource.data["spec"];
            if spec.get("replicas").map_or(true, Value::is_null) {
                debug!("Setting {} replicas on {}", replicas, resource.metadata.name.as_deref().unwrap_or_default());
                spec["replicas"] = json!(replicas);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dd_common::config::ResourceConfig;

    use super::*;
    use crate::standard::testing::resource;

    fn enricher(replicas: Option<i32>) -> ReplicaCountEnricher {
        let resources = ResourceConfig { replicas, ..Default::default() };
        ReplicaCountEnricher::new(Arc::new(EnricherContext { resources, ..Default::default() }))
    }

    fn resources() -> ResourceList {
        ResourceList::from(vec![
            resource(json!({"apiVersion": "apps/v1", "kind": "Deployment", "metadata": {"name": "web"}})),
            resource(json!({"apiVersion": "apps/v1", "kind": "StatefulSet", "metadata": {"name": "db"}, "spec": {"replicas": 1}})),
            resource(json!({"apiVersion": "v1", "kind": "Service", "metadata": {"name": "web"}, "spec": {}})),
        ])
    }

    #[test]
    fn test_fills_in_missing_replicas() {
        let mut list = resources();
        enricher(Some(3)).enrich(PlatformMode::Kubernetes, &[], &mut list).unwrap();

        assert_eq!(list.items()[0].data["spec"]["replicas"], json!(3));
        assert_eq!(list.items()[1].data["spec"]["replicas"], json!(1));
        assert!(list.items()[2].data["spec"].get("replicas").is_none());
    }

    #[test]
    fn test_without_configured_replicas_nothing_changes() {
        let mut list = resources();
        enricher(None).enrich(PlatformMode::Kubernetes, &[], &mut list).unwrap();

        assert!(list.items()[0].data.get("spec").is_none());
    }
}
