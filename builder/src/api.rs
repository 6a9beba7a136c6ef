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

//! The cluster calls a build needs, behind a trait so the orchestration can
//! run against an in-memory cluster in tests.

use async_trait::async_trait;
use dd_resources::openshift::{build_config_resource, build_resource, image_stream_resource};
use futures::stream::BoxStream;
use futures::{AsyncBufReadExt, StreamExt, TryStreamExt};
use http::{header, Request};
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{DeleteParams, ListParams, LogParams, PostParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, ResourceExt};
use tracing::{debug, info};

use crate::errors::{Error, Result};

#[async_trait]
pub trait OpenShiftApi: Send + Sync {
    /// The namespace builds run in.
    fn namespace(&self) -> &str;

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>>;
    async fn create_secret(&self, secret: &Secret) -> Result<Secret>;
    async fn replace_secret(&self, secret: &Secret) -> Result<Secret>;

    async fn get_build_config(&self, name: &str) -> Result<Option<DynamicObject>>;
    async fn replace_build_config(&self, build_config: &DynamicObject) -> Result<DynamicObject>;
    async fn delete_build_config(&self, name: &str) -> Result<()>;

    async fn get_image_stream(&self, name: &str) -> Result<Option<DynamicObject>>;
    async fn delete_image_stream(&self, name: &str) -> Result<()>;

    /// Creates any resource, picking the endpoint from its type meta.
    async fn create(&self, resource: &DynamicObject) -> Result<DynamicObject>;

    /// Uploads `archive` to the BuildConfig's `instantiatebinary` endpoint
    /// and returns the started Build.
    async fn instantiate_binary(&self, build_config: &str, archive: Vec<u8>) -> Result<DynamicObject>;

    async fn get_build(&self, name: &str) -> Result<Option<DynamicObject>>;
    async fn list_builds(&self) -> Result<Vec<DynamicObject>>;

    /// Every observed state of the Build, until the watch closes.
    async fn watch_build(&self, name: &str) -> Result<BoxStream<'static, Result<DynamicObject>>>;

    /// Resolves once the pod reports the `Ready` condition.
    async fn wait_pod_ready(&self, pod: &str) -> Result<()>;

    /// Follows the pod's log and writes every line to the log output until
    /// the stream ends.
    async fn tail_log(&self, pod: &str) -> Result<()>;
}

/// [`OpenShiftApi`] backed by a kube client.
pub struct KubeOpenShiftApi {
    client: kube::Client,
    namespace: String,
}

impl KubeOpenShiftApi {
    /// Uses `namespace`, or the client's default namespace when absent.
    pub fn new(client: kube::Client, namespace: Option<String>) -> Self {
        let namespace = namespace.unwrap_or_else(|| client.default_namespace().to_string());
        Self { client, namespace }
    }

    fn dynamic(&self, resource: &ApiResource) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), &self.namespace, resource)
    }

    fn build_configs(&self) -> Api<DynamicObject> {
        self.dynamic(&build_config_resource())
    }

    fn builds(&self) -> Api<DynamicObject> {
        self.dynamic(&build_resource())
    }

    fn image_streams(&self) -> Api<DynamicObject> {
        self.dynamic(&image_stream_resource())
    }

    fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

/// The ApiResource of an arbitrary object, derived from its `apiVersion` and `kind`.
fn api_resource(resource: &DynamicObject) -> Result<ApiResource> {
    let types = resource
        .types
        .as_ref()
        .ok_or_else(|| Error::ResourceError(dd_resources::error::Error::MissingObjectKey("kind")))?;
    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };
    Ok(ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, &types.kind)))
}

fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| conditions.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
}

#[async_trait]
impl OpenShiftApi for KubeOpenShiftApi {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>> {
        self.secrets().get_opt(name).await.map_err(Error::KubeError)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        let secret = self.secrets().create(&PostParams::default(), secret).await.map_err(Error::KubeError)?;
        info!("Created Secret: {}", secret.name_any());
        Ok(secret)
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        let name = secret.name_any();
        let secret = self.secrets().replace(&name, &PostParams::default(), secret).await.map_err(Error::KubeError)?;
        info!("Updated Secret: {}", name);
        Ok(secret)
    }

    async fn get_build_config(&self, name: &str) -> Result<Option<DynamicObject>> {
        self.build_configs().get_opt(name).await.map_err(Error::KubeError)
    }

    async fn replace_build_config(&self, build_config: &DynamicObject) -> Result<DynamicObject> {
        let name = build_config.name_any();
        let resource = self
            .build_configs()
            .replace(&name, &PostParams::default(), build_config)
            .await
            .map_err(Error::KubeError)?;
        info!("Updated BuildConfig: {}", name);
        Ok(resource)
    }

    async fn delete_build_config(&self, name: &str) -> Result<()> {
        self.build_configs().delete(name, &DeleteParams::default()).await.map_err(Error::KubeError)?;
        info!("Deleted BuildConfig: {}", name);
        Ok(())
    }

    async fn get_image_stream(&self, name: &str) -> Result<Option<DynamicObject>> {
        self.image_streams().get_opt(name).await.map_err(Error::KubeError)
    }

    async fn delete_image_stream(&self, name: &str) -> Result<()> {
        self.image_streams().delete(name, &DeleteParams::default()).await.map_err(Error::KubeError)?;
        info!("Deleted ImageStream: {}", name);
        Ok(())
    }

    async fn create(&self, resource: &DynamicObject) -> Result<DynamicObject> {
        let api = self.dynamic(&api_resource(resource)?);
        let created = api.create(&PostParams::default(), resource).await.map_err(Error::KubeError)?;
        info!("Created {}: {}", api_resource(resource)?.kind, created.name_any());
        Ok(created)
    }

    async fn instantiate_binary(&self, build_config: &str, archive: Vec<u8>) -> Result<DynamicObject> {
        let uri = format!(
            "/apis/build.openshift.io/v1/namespaces/{}/buildconfigs/{}/instantiatebinary",
            self.namespace, build_config
        );
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(archive)
            .map_err(Error::HttpError)?;

        debug!("Uploading binary build archive for {}", build_config);
        self.client.request::<DynamicObject>(request).await.map_err(Error::KubeError)
    }

    async fn get_build(&self, name: &str) -> Result<Option<DynamicObject>> {
        self.builds().get_opt(name).await.map_err(Error::KubeError)
    }

    async fn list_builds(&self) -> Result<Vec<DynamicObject>> {
        let builds = self.builds().list(&ListParams::default()).await.map_err(Error::KubeError)?;
        Ok(builds.items)
    }

    async fn watch_build(&self, name: &str) -> Result<BoxStream<'static, Result<DynamicObject>>> {
        let config = watcher::Config::default().fields(&format!("metadata.name={}", name));
        let stream = watcher(self.builds(), config).applied_objects().map_err(Error::WatchError).boxed();
        Ok(stream)
    }

    async fn wait_pod_ready(&self, pod: &str) -> Result<()> {
        let config = watcher::Config::default().fields(&format!("metadata.name={}", pod));
        let mut stream = watcher(self.pods(), config).applied_objects().boxed();

        while let Some(object) = stream.try_next().await.map_err(Error::WatchError)? {
            if is_pod_ready(&object) {
                debug!("Pod {} is ready", pod);
                return Ok(());
            }
        }
        Err(Error::WatchClosed(format!("Pod {}", pod)))
    }

    async fn tail_log(&self, pod: &str) -> Result<()> {
        let params = LogParams { follow: true, ..Default::default() };
        let mut lines = self.pods().log_stream(pod, &params).await.map_err(Error::KubeError)?.lines();

        while let Some(line) = lines.try_next().await.map_err(Error::LogError)? {
            info!("[{}] {}", pod, line);
        }
        Ok(())
    }
}
