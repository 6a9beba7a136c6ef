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

//! An in-memory cluster for the build tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::core::DynamicObject;
use kube::ResourceExt;
use serde_json::json;

use crate::api::OpenShiftApi;
use crate::errors::{Error, Result};

pub const NAMESPACE: &str = "drydock";

#[derive(Default)]
struct State {
    secrets: BTreeMap<String, Secret>,
    build_configs: BTreeMap<String, DynamicObject>,
    image_streams: BTreeMap<String, DynamicObject>,
    builds: BTreeMap<String, DynamicObject>,
    build_events: Vec<DynamicObject>,
    calls: Vec<String>,
    image_stream_gets: usize,
    socket_failures: usize,
    instantiate_failure: Option<String>,
    list_fails: bool,
    pod_never_ready: bool,
}

#[derive(Default)]
pub struct FakeOpenShift {
    state: Mutex<State>,
}

pub fn object(value: serde_json::Value) -> DynamicObject {
    serde_json::from_value(value).unwrap()
}

pub fn build(name: &str, phase: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "build.openshift.io/v1",
        "kind": "Build",
        "metadata": {"name": name},
        "status": {"phase": phase},
    }))
}

pub fn transport_error(message: &str) -> Error {
    let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, message.to_string());
    Error::KubeError(kube::Error::Service(Box::new(cause)))
}

pub fn socket_closed() -> Error {
    transport_error("Socket closed")
}

impl FakeOpenShift {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: impl Into<String>) {
        self.state().calls.push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// How often a call starting with `prefix` was made.
    pub fn count(&self, prefix: &str) -> usize {
        self.state().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn image_stream_gets(&self) -> usize {
        self.state().image_stream_gets
    }

    pub fn put_secret(&self, secret: Secret) {
        self.state().secrets.insert(secret.name_any(), secret);
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.state().secrets.get(name).cloned()
    }

    pub fn put_build_config(&self, build_config: DynamicObject) {
        self.state().build_configs.insert(build_config.name_any(), build_config);
    }

    pub fn build_config(&self, name: &str) -> Option<DynamicObject> {
        self.state().build_configs.get(name).cloned()
    }

    pub fn put_image_stream(&self, image_stream: DynamicObject) {
        self.state().image_streams.insert(image_stream.name_any(), image_stream);
    }

    pub fn put_build(&self, build: DynamicObject) {
        self.state().builds.insert(build.name_any(), build);
    }

    /// States delivered by the next build watch before it closes. The last
    /// one becomes the current state of the Build.
    pub fn set_build_events(&self, events: Vec<DynamicObject>) {
        self.state().build_events = events;
    }

    /// Fails the next `count` creations with a closed socket.
    pub fn fail_creates(&self, count: usize) {
        self.state().socket_failures = count;
    }

    /// Fails every binary build upload with a transport error carrying `message`.
    pub fn fail_instantiate(&self, message: &str) {
        self.state().instantiate_failure = Some(message.to_string());
    }

    pub fn fail_list_builds(&self) {
        self.state().list_fails = true;
    }

    pub fn set_pod_never_ready(&self) {
        self.state().pod_never_ready = true;
    }
}

#[async_trait]
impl OpenShiftApi for FakeOpenShift {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>> {
        Ok(self.state().secrets.get(name).cloned())
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        self.record(format!("create_secret {}", secret.name_any()));
        self.put_secret(secret.clone());
        Ok(secret.clone())
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        self.record(format!("replace_secret {}", secret.name_any()));
        self.put_secret(secret.clone());
        Ok(secret.clone())
    }

    async fn get_build_config(&self, name: &str) -> Result<Option<DynamicObject>> {
        self.record(format!("get_build_config {}", name));
        Ok(self.state().build_configs.get(name).cloned())
    }

    async fn replace_build_config(&self, build_config: &DynamicObject) -> Result<DynamicObject> {
        self.record(format!("replace_build_config {}", build_config.name_any()));
        self.put_build_config(build_config.clone());
        Ok(build_config.clone())
    }

    async fn delete_build_config(&self, name: &str) -> Result<()> {
        self.record(format!("delete_build_config {}", name));
        self.state().build_configs.remove(name);
        Ok(())
    }

    async fn get_image_stream(&self, name: &str) -> Result<Option<DynamicObject>> {
        let mut state = self.state();
        state.image_stream_gets += 1;
        Ok(state.image_streams.get(name).cloned())
    }

    async fn delete_image_stream(&self, name: &str) -> Result<()> {
        self.record(format!("delete_image_stream {}", name));
        self.state().image_streams.remove(name);
        Ok(())
    }

    async fn create(&self, resource: &DynamicObject) -> Result<DynamicObject> {
        let kind = resource.types.as_ref().map(|t| t.kind.clone()).unwrap_or_default();
        {
            let mut state = self.state();
            if state.socket_failures > 0 {
                state.socket_failures -= 1;
                state.calls.push(format!("create {} failed", kind));
                return Err(socket_closed());
            }
        }

        self.record(format!("create {} {}", kind, resource.name_any()));
        match kind.as_str() {
            "BuildConfig" => self.put_build_config(resource.clone()),
            "ImageStream" => self.put_image_stream(resource.clone()),
            _ => {}
        }
        Ok(resource.clone())
    }

    async fn instantiate_binary(&self, build_config: &str, archive: Vec<u8>) -> Result<DynamicObject> {
        self.record(format!("instantiate_binary {} {}", build_config, archive.len()));
        if let Some(message) = self.state().instantiate_failure.clone() {
            return Err(transport_error(&message));
        }
        let name = format!("{}-1", build_config);
        let mut state = self.state();
        let started = state.builds.entry(name.clone()).or_insert_with(|| build(&name, "New"));
        Ok(started.clone())
    }

    async fn get_build(&self, name: &str) -> Result<Option<DynamicObject>> {
        Ok(self.state().builds.get(name).cloned())
    }

    async fn list_builds(&self) -> Result<Vec<DynamicObject>> {
        self.record("list_builds");
        if self.state().list_fails {
            return Err(socket_closed());
        }
        Ok(self.state().builds.values().cloned().collect())
    }

    async fn watch_build(&self, name: &str) -> Result<BoxStream<'static, Result<DynamicObject>>> {
        self.record(format!("watch_build {}", name));
        let mut state = self.state();
        let events = std::mem::take(&mut state.build_events);
        // the cluster ends up in the last delivered state
        if let Some(last) = events.last() {
            state.builds.insert(name.to_string(), last.clone());
        }
        Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn wait_pod_ready(&self, pod: &str) -> Result<()> {
        self.record(format!("wait_pod_ready {}", pod));
        let never = self.state().pod_never_ready;
        if never {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn tail_log(&self, pod: &str) -> Result<()> {
        self.record(format!("tail_log {}", pod));
        Ok(())
    }
}
