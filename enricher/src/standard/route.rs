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
use dd_resources::openshift::new_route;
use dd_resources::overlay::Contributor;
use dd_resources::{Kind, ResourceList};
use kube::core::DynamicObject;
use serde_json::Value;
use tracing::info;

use crate::errors::{Error, Result};
use crate::{Enricher, EnricherContext, PlatformMode};

const NAME: &str = "dd-openshift-route";
const EXPOSE_LABEL: &str = "expose";

/// Adds a Route for every exposed Service when targeting OpenShift.
///
/// A Service is exposed when labelled `expose=true`; its first port must
/// carry a target port. Services sharing their name with an existing Route
/// are skipped.
///
/// Options:
/// - `generateRoute`: set to `false` to add no routes at all (default `true`)
pub struct RouteEnricher {
    context: Arc<EnricherContext>,
}

impl RouteEnricher {
    pub fn new(context: Arc<EnricherContext>) -> Self {
        Self { context }
    }
}

fn is_exposed(service: &DynamicObject) -> bool {
    service.metadata.labels.as_ref().and_then(|l| l.get(EXPOSE_LABEL)).is_some_and(|v| v == "true")
}

fn ports(service: &DynamicObject) -> Vec<Value> {
    service.data.pointer("/spec/ports").and_then(Value::as_array).cloned().unwrap_or_default()
}

impl Named for RouteEnricher {
    fn name(&self) -> &str {
        NAME
    }
}

impl Contributor for RouteEnricher {}

impl Enricher for RouteEnricher {
    fn create(&self, mode: PlatformMode, resources: &mut ResourceList) -> Result<()> {
        if mode != PlatformMode::Openshift || !self.context.get_bool(NAME, "generateRoute", true) {
            return Ok(());
        }

        let mut taken = resources.names_of(Kind::Route);
        let mut routes = vec![];

        for service in resources.of_kind(Kind::Service) {
            let name = match service.metadata.name.as_deref() {
                Some(name) if !taken.contains(name) => name,
                _ => continue,
            };
            if !is_exposed(service) {
                continue;
            }
            // one port per route; the first one wins
            let target_port = match ports(service).first().and_then(|p| p.get("targetPort").cloned()) {
                Some(port) if !port.is_null() => port,
                _ => continue,
            };

            let route = new_route(name, service.metadata.labels.as_ref(), &target_port).map_err(Error::ResourceError)?;
            info!("Adding Route for Service {}", name);
            taken.insert(name.to_string());
            routes.push(route);
        }

        for route in routes {
            resources.push(route);
        }
        Ok(())
    }
}
