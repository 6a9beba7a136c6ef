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

use serde::{Deserialize, Serialize};
use url::Url;

/// The registry images without an explicit registry are pulled from.
pub const DEFAULT_REGISTRY: &str = "docker.io";

const DOCKER_HUB_ALIASES: [&str; 4] = ["docker.io", "index.docker.io", "registry-1.docker.io", "registry.hub.docker.com"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredential {
    /// Registry host, optionally given as URL, e.g. `https://quay.io/v1/`.
    pub server: String,
    pub username: String,
    pub password: String,
}

impl RegistryCredential {
    pub fn host(&self) -> String {
        normalize_host(&self.server)
    }
}

/// Registry credentials known to the build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub registries: Vec<RegistryCredential>,
}

impl Credentials {
    /// Finds the credential for `registry`, or for Docker Hub when no
    /// registry is given.
    pub fn find(&self, registry: Option<&str>) -> Option<&RegistryCredential> {
        let wanted = normalize_host(registry.unwrap_or(DEFAULT_REGISTRY));
        self.registries.iter().find(|c| c.host() == wanted)
    }
}

/// Reduces a registry address to its host (and port), mapping the Docker
/// Hub aliases onto `docker.io`.
pub fn normalize_host(server: &str) -> String {
    let candidate = if server.contains("://") { server.to_string() } else { format!("https://{}", server) };

    let host = match Url::parse(&candidate) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => server.to_string(),
        },
        Err(_) => server.to_string(),
    };

    if DOCKER_HUB_ALIASES.contains(&host.as_str()) {
        DEFAULT_REGISTRY.to_string()
    } else {
        host
    }
}
