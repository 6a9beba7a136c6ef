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
use kube::core::{DynamicObject, TypeMeta};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::errors::{Error, Result};
use crate::{Enricher, EnricherContext, PlatformMode};

const NAME: &str = "dd-openshift-deploymentconfig";
const DEFAULT_TIMEOUT_SECONDS: &str = "3600";

/// Replaces Deployments by DeploymentConfigs when targeting OpenShift.
///
/// Options:
/// - `openshiftDeployTimeoutSeconds`: rollout timeout, `0` to leave the
///   strategy parameters unset (default `3600`)
/// - `enableAutomaticTrigger`: add a `ConfigChange` trigger (default `true`)
pub struct DeploymentConfigEnricher {
    context: Arc<EnricherContext>,
}

impl DeploymentConfigEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }

    fn timeout_seconds(&self) -> Result<i64> {
        let value = self.context.get(NAME, "openshiftDeployTimeoutSeconds", DEFAULT_TIMEOUT_SECONDS);
        value.trim().parse().map_err(|_| Error::InvalidConfig {
            processor: NAME.to_string(),
            key: "openshiftDeployTimeoutSeconds",
            value: value.to_string(),
        })
    }

    fn convert(&self, deployment: &DynamicObject, timeout: i64, automatic_trigger: bool) -> Result<DynamicObject> {
        let mut config = DynamicObject {
            types: Some(TypeMeta { api_version: "apps.openshift.io/v1".into(), kind: "DeploymentConfig".into() }),
            metadata: deployment.metadata.clone(),
            data: json!({}),
        };

        let spec = match deployment.data.get("spec") {
            Some(Value::Object(spec)) => spec,
            _ => return Ok(config),
        };
        let mut target = Map::new();

        for key in ["replicas", "revisionHistoryLimit"] {
            if let Some(value) = spec.get(key).filter(|v| !v.is_null()) {
                target.insert(key.to_string(), value.clone());
            }
        }

        if let Some(Value::Object(labels)) = spec.get("selector").and_then(|s| s.get("matchLabels")) {
            if !labels.is_empty() {
                target.insert("selector".to_string(), Value::Object(labels.clone()));
            }
        }

        if let Some(template) = spec.get("template").filter(|t| !t.is_null()) {
            validate_containers(template)?;
            target.insert("template".to_string(), template.clone());
        }

        let strategy_type = spec
            .get("strategy")
            .and_then(|s| s.get("type"))
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty());
        let strategy = match strategy_type {
            None | Some("Rolling") | Some("RollingUpdate") if timeout > 0 => {
                Some(json!({ "type": "Rolling", "rollingParams": { "timeoutSeconds": timeout } }))
            }
            Some("Recreate") if timeout > 0 => {
                Some(json!({ "type": "Recreate", "recreateParams": { "timeoutSeconds": timeout } }))
            }
            Some("RollingUpdate") => Some(json!({ "type": "Rolling" })),
            Some(other) => Some(json!({ "type": other })),
            None => None,
        };
        if let Some(strategy) = strategy {
            target.insert("strategy".to_string(), strategy);
        }

        if automatic_trigger {
            target.insert("triggers".to_string(), json!([{ "type": "ConfigChange" }]));
        }

        config.data = json!({ "spec": target });
        Ok(config)
    }
}

fn validate_containers(template: &Value) -> Result<()> {
    let containers = template.pointer("/spec/containers").and_then(Value::as_array).cloned().unwrap_or_default();

    for container in containers {
        let has_image = container.get("image").and_then(Value::as_str).is_some_and(|i| !i.trim().is_empty());
        if !has_image {
            let name = container.get("name").and_then(Value::as_str).unwrap_or_default();
            return Err(Error::ContainerWithoutImage(name.to_string()));
        }
    }
    Ok(())
}

impl Named for DeploymentConfigEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for DeploymentConfigEnricher {}

impl Enricher for DeploymentConfigEnricher {
    fn create(&self, mode: PlatformMode, resources: &mut ResourceList) -> Result<()> {
        if mode != PlatformMode::Openshift {
            return Ok(());
        }

        let timeout = self.timeout_seconds()?;
        let automatic_trigger = self.context.get_bool(NAME, "enableAutomaticTrigger", true);

        for item in resources.iter_mut() {
            if Kind::of(item) == Kind::Deployment {
                *item = self.convert(item, timeout, automatic_trigger)?;
                info!("Converted Deployment {} into a DeploymentConfig", item.metadata.name.as_deref().unwrap_or_default());
            }
        }
        Ok(())
    }
}
