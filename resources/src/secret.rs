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

use dd_common::docker::DockerConfig;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::core::ObjectMeta;
use tracing::debug;

use crate::error::{Error, Result};

pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// A `kubernetes.io/dockerconfigjson` secret holding `config`.
pub fn new_pull_secret(name: &str, config: &DockerConfig) -> Result<Secret> {
    let resource = Secret {
        metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
        type_: Some(DOCKER_CONFIG_JSON_TYPE.to_string()),
        data: Some(BTreeMap::from([(
            DOCKER_CONFIG_JSON_KEY.to_string(),
            ByteString(config.to_vec().map_err(Error::SerializationError)?),
        )])),
        ..Default::default()
    };
    debug!("The pull secret resource:\n {:?}\n", resource.metadata);

    Ok(resource)
}

/// Merges the data of `desired` into `existing`. Returns `false`, leaving
/// `existing` untouched, when it already holds the same data.
pub fn merge_pull_secret(existing: &mut Secret, desired: &Secret) -> bool {
    let current = existing.data.get_or_insert_with(BTreeMap::new);
    let mut changed = false;

    for (key, value) in desired.data.iter().flatten() {
        if current.get(key) != Some(value) {
            current.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    if changed && existing.type_.is_none() {
        existing.type_ = desired.type_.clone();
    }

    changed
}

#[cfg(test)]
mod tests {
    use dd_common::config::RegistryCredential;
    use dd_common::docker::build_docker_config;

    use super::*;

    fn secret(password: &str) -> Secret {
        let credential =
            RegistryCredential { server: "quay.io".into(), username: "user".into(), password: password.into() };
        new_pull_secret("pullsecret-drydock", &build_docker_config([&credential])).unwrap()
    }

    #[test]
    fn test_new_pull_secret() {
        let secret = secret("one");

        assert_eq!(secret.type_.as_deref(), Some(DOCKER_CONFIG_JSON_TYPE));
        assert!(secret.data.unwrap().contains_key(DOCKER_CONFIG_JSON_KEY));
    }

    #[test]
    fn test_merge_only_when_different() {
        let mut existing = secret("one");

        assert!(!merge_pull_secret(&mut existing, &secret("one")));
        assert!(merge_pull_secret(&mut existing, &secret("two")));
        assert_eq!(existing.data, secret("two").data);
    }
}
