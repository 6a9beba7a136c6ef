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

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::RegistryCredential;

/// AuthConfig contains authorization information for connecting to a Registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth: Option<String>,
}

/// Content of a `kubernetes.io/dockerconfigjson` secret.
///
/// Entries are kept sorted so that equal credentials always encode to equal
/// bytes, which is what decides whether an existing secret needs an update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    pub auths: BTreeMap<String, AuthConfig>,
}

impl DockerConfig {
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

pub fn build_docker_config<'a>(credentials: impl IntoIterator<Item = &'a RegistryCredential>) -> DockerConfig {
    let mut auths = BTreeMap::new();

    for credential in credentials {
        let auth = BASE64.encode(format!("{}:{}", credential.username, credential.password));
        auths.insert(
            credential.host(),
            AuthConfig {
                username: Some(credential.username.clone()),
                password: Some(credential.password.clone()),
                auth: Some(auth),
            },
        );
    }

    DockerConfig { auths }
}
