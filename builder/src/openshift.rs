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
use std::time::Duration;

use async_trait::async_trait;
use dd_common::config::{BuildServiceConfig, Credentials};
use dd_common::docker::build_docker_config;
use dd_common::image::{ImageConfig, ImageName};
use dd_enricher::{EnricherPipeline, PlatformMode};
use dd_resources::image_stream::{append_image_stream, new_tagged_image_stream};
use dd_resources::openshift::{
    build_output, build_phase, build_status_reason, build_strategy, new_build_config, new_image_stream, same_spec,
};
use dd_resources::secret::{merge_pull_secret, new_pull_secret};
use dd_resources::ResourceList;
use futures::StreamExt;
use kube::core::DynamicObject;
use kube::ResourceExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::OpenShiftApi;
use crate::errors::{Error, Result};
use crate::resolver::ImageStreamTagResolver;
use crate::{archive, ImageBuilder};

pub const POD_READY_TIMEOUT: Duration = Duration::from_secs(120);
pub const APPLY_ATTEMPTS: usize = 5;
pub const APPLY_INTERVAL: Duration = Duration::from_millis(1000);

const FAILED_PHASES: [&str; 3] = ["Failed", "Cancelled", "Error"];

fn is_finished(phase: Option<&str>) -> bool {
    matches!(phase, Some("Complete")) || phase.is_some_and(|p| FAILED_PHASES.contains(&p))
}

fn is_socket_closed(err: &Error) -> bool {
    err.to_string().contains("Socket closed")
}

fn is_already_exists(err: &Error) -> bool {
    matches!(err, Error::KubeError(kube::Error::Api(response)) if response.code == 409)
}

/// Builds images inside OpenShift by uploading a binary archive to a
/// BuildConfig and waiting for the resulting Build.
pub struct OpenShiftBuilder {
    api: Arc<dyn OpenShiftApi>,
    config: BuildServiceConfig,
    credentials: Credentials,
    pipeline: Option<EnricherPipeline>,
}

impl OpenShiftBuilder {
    pub fn new(api: Arc<dyn OpenShiftApi>, config: BuildServiceConfig, credentials: Credentials) -> Self {
        Self { api, config, credentials, pipeline: None }
    }

    /// Enriches the BuildConfig and ImageStream before they are created.
    pub fn with_pipeline(mut self, pipeline: EnricherPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Creates or refreshes the pull secret for the base image registry,
    /// returning its name when credentials are known for that registry.
    pub async fn ensure_pull_secret(&self, image: &ImageConfig) -> Result<Option<String>> {
        let from = match image.build.as_ref().and_then(|b| b.from.as_deref()) {
            Some(from) => from.parse::<ImageName>().map_err(Error::ConfigError)?,
            None => return Ok(None),
        };
        let credential = match self.credentials.find(from.registry.as_deref()) {
            Some(credential) => credential,
            None => {
                debug!("No credentials for the registry of {}", from);
                return Ok(None);
            }
        };

        let name = &self.config.pull_secret;
        let desired = new_pull_secret(name, &build_docker_config([credential])).map_err(Error::ResourceError)?;

        match self.api.get_secret(name).await? {
            None => {
                self.api.create_secret(&desired).await?;
            }
            Some(mut existing) => {
                if merge_pull_secret(&mut existing, &desired) {
                    self.api.replace_secret(&existing).await?;
                } else {
                    debug!("Pull secret {} is up to date", name);
                }
            }
        }

        Ok(Some(name.clone()))
    }

    /// Makes sure the BuildConfig `name` builds `image` into `image_stream_tag`.
    ///
    /// A missing BuildConfig is added to `resources` for creation. An
    /// existing one is recreated under the recreate mode, or updated when its
    /// strategy or output differ.
    pub async fn ensure_build_config(
        &self,
        name: &str,
        image: &ImageConfig,
        image_stream_tag: &str,
        pull_secret: Option<&str>,
        resources: &mut ResourceList,
    ) -> Result<()> {
        let strategy = build_strategy(image, self.config.strategy, pull_secret).map_err(Error::ResourceError)?;
        let output = build_output(image_stream_tag);

        let mut existing = match self.api.get_build_config(name).await? {
            Some(existing) => existing,
            None => return self.add_build_config(name, strategy, output, resources),
        };

        let source_type = existing.data.pointer("/spec/source/type").and_then(Value::as_str);
        if source_type.is_some_and(|t| t != "Binary") {
            warn!("BuildConfig {} is not of type 'Binary' but is '{}'", name, source_type.unwrap_or_default());
        }

        if self.config.recreate_mode.is_build_config() {
            self.api.delete_build_config(name).await?;
            return self.add_build_config(name, strategy, output, resources);
        }

        let strategy_type = strategy["type"].as_str().unwrap_or_default().to_string();
        if same_spec(existing.data.pointer("/spec/strategy"), Some(&strategy))
            && same_spec(existing.data.pointer("/spec/output"), Some(&output))
        {
            info!("Using BuildConfig {} for {} strategy", name, strategy_type);
            return Ok(());
        }

        match existing.data.pointer_mut("/spec") {
            Some(Value::Object(spec)) => {
                spec.insert(String::from("strategy"), strategy);
                spec.insert(String::from("output"), output);
            }
            _ => existing.data["spec"] = serde_json::json!({ "strategy": strategy, "output": output }),
        }
        self.api.replace_build_config(&existing).await?;
        info!("Updating BuildConfig {} for {} strategy", name, strategy_type);

        Ok(())
    }

    fn add_build_config(&self, name: &str, strategy: Value, output: Value, resources: &mut ResourceList) -> Result<()> {
        info!("Creating BuildConfig {} for {} build", name, strategy["type"].as_str().unwrap_or_default());
        resources.push(new_build_config(name, strategy, output).map_err(Error::ResourceError)?);
        Ok(())
    }

    /// Adds the ImageStream `name` to `resources` unless it already exists.
    pub async fn ensure_image_stream(&self, name: &str, resources: &mut ResourceList) -> Result<()> {
        let mut exists = self.api.get_image_stream(name).await?.is_some();
        if exists && self.config.recreate_mode.is_image_stream() {
            self.api.delete_image_stream(name).await?;
            exists = false;
        }

        if exists {
            info!("Adding to ImageStream {}", name);
        } else {
            info!("Creating ImageStream {}", name);
            resources.push(new_image_stream(name, self.config.lookup_policy_local).map_err(Error::ResourceError)?);
        }
        Ok(())
    }

    /// Enriches and creates `resources`, retrying when the connection drops.
    pub async fn apply_resources(&self, mut resources: ResourceList) -> Result<()> {
        if let Some(pipeline) = &self.pipeline {
            pipeline.run(PlatformMode::Openshift, &mut resources).map_err(Error::EnricherError)?;
        }

        let mut attempt = 1;
        loop {
            match self.create_all(&resources).await {
                Ok(()) => return Ok(()),
                Err(err) if is_socket_closed(&err) && attempt < APPLY_ATTEMPTS => {
                    warn!("Problem encountered while applying resource objects, retrying..");
                    attempt += 1;
                    tokio::time::sleep(APPLY_INTERVAL).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn create_all(&self, resources: &ResourceList) -> Result<()> {
        for resource in resources.iter() {
            match self.api.create(resource).await {
                Ok(_) => {}
                // created by an earlier attempt
                Err(err) if is_already_exists(&err) => debug!("{} already exists", resource.name_any()),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Starts a binary build of `build_config` and returns the Build name.
    pub async fn submit_build(&self, build_config: &str, archive: Vec<u8>) -> Result<String> {
        info!("Starting Build {}", build_config);

        match self.api.instantiate_binary(build_config, archive).await {
            Ok(build) => build.metadata.name.ok_or_else(|| Error::MissingBuild(build_config.to_string())),
            Err(err) => {
                if let Error::KubeError(kube::Error::Api(status)) = &err {
                    error!("OpenShift Error: [{} {}] [{}] {}", status.code, status.status, status.reason, status.message);
                }
                if err.to_string().to_lowercase().contains("stream closed") {
                    error!("Build for {} failed: {}", build_config, err);
                    self.log_build_config_details(build_config).await;
                }
                Err(err)
            }
        }
    }

    async fn log_build_config_details(&self, name: &str) {
        let build_config = match self.api.get_build_config(name).await {
            Ok(Some(build_config)) => build_config,
            Ok(None) => return,
            Err(err) => {
                error!("Unable to get detailed information from the BuildConfig: {}", err);
                return;
            }
        };

        if let Some(hint) = source_image_hint(&build_config) {
            error!("{}", hint);
        }
    }

    /// Waits until the Build reaches a terminal phase while its pod log is
    /// tailed in the background.
    pub async fn wait_for_build(&self, build_config: &str, build: &str) -> Result<()> {
        let pod = format!("{}-build", build);
        info!("Waiting for build {} to complete...", build);

        match tokio::time::timeout(POD_READY_TIMEOUT, self.api.wait_pod_ready(&pod)).await {
            Ok(Ok(())) => debug!("Build pod {} is ready", pod),
            Ok(Err(err)) => warn!("Error while waiting for build pod {}: {}", pod, err),
            Err(_) => warn!("Timeout after {:?} waiting for build pod {} to become ready", POD_READY_TIMEOUT, pod),
        }

        let api = self.api.clone();
        let tail = tokio::spawn(async move {
            if let Err(err) = api.tail_log(&pod).await {
                warn!("Failed to tail build log: {}", err);
            }
        });

        let result = self.await_terminal_phase(build).await;
        tail.abort();

        let last = result?;
        let phase = last.as_ref().and_then(build_phase);
        match phase {
            Some("Complete") => {
                info!("Build {} Complete", build);
                Ok(())
            }
            Some(p) if FAILED_PHASES.contains(&p) => {
                let reason = last.as_ref().map(build_status_reason).unwrap_or_default();
                self.report_failure(build_config).await;
                Err(Error::BuildFailed { name: build.to_string(), reason })
            }
            _ => {
                warn!("Could not confirm completion of build {}, status: {}", build, phase.unwrap_or("Unknown"));
                Ok(())
            }
        }
    }

    async fn await_terminal_phase(&self, name: &str) -> Result<Option<DynamicObject>> {
        let current = self.api.get_build(name).await?;
        if is_finished(current.as_ref().and_then(build_phase)) {
            debug!("Build {} is already finished", name);
            return Ok(current);
        }

        let mut last_status = String::new();
        let mut events = self.api.watch_build(name).await?;
        while let Some(event) = events.next().await {
            match event {
                Ok(build) => {
                    let phase = build_phase(&build).unwrap_or_default();
                    if phase != last_status {
                        info!("Build {} status: {}", name, phase);
                        last_status = phase.to_string();
                    }
                    if is_finished(Some(phase)) {
                        break;
                    }
                }
                Err(err) => {
                    error!("Error while watching for build to finish: {}", err);
                    break;
                }
            }
        }

        // closed or finished, either way the current state decides
        self.api.get_build(name).await
    }

    /// Logs every build related to `build_config`. Never fails.
    async fn report_failure(&self, build_config: &str) {
        match self.api.list_builds().await {
            Ok(builds) => {
                for build in builds.iter().filter(|b| b.name_any().contains(build_config)) {
                    error!(
                        "Build {} {}: {}",
                        build.name_any(),
                        build_phase(build).unwrap_or("Unknown"),
                        build_status_reason(build)
                    );
                }
            }
            Err(err) => error!("Unable to list builds of {}: {}", build_config, err),
        }
    }

    /// Resolves the pushed image and records it in the image-stream file.
    async fn record_image_stream(&self, image: &ImageName) -> Result<()> {
        let sha = ImageStreamTagResolver::new(self.api.clone()).resolve(image.simple_name()).await?;
        let image_stream = new_tagged_image_stream(image, self.api.namespace(), &sha).map_err(Error::ResourceError)?;

        append_image_stream(&self.config.image_stream_file(), image_stream).map_err(Error::ResourceError)
    }
}

/// Points at the S2I source image of `build_config`, the usual suspect when
/// the upload stream is closed by the cluster.
fn source_image_hint(build_config: &DynamicObject) -> Option<String> {
    let from = |key: &str| {
        build_config
            .data
            .pointer(&format!("/spec/strategy/sourceStrategy/from/{}", key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    match from("kind").as_str() {
        "DockerImage" => {
            Some(format!("Please, ensure that the Docker image '{}' exists and is accessible by OpenShift", from("name")))
        }
        "ImageStreamTag" => {
            let namespace = from("namespace");
            let (info, params) = match namespace.is_empty() {
                true => (String::from("current"), String::new()),
                false => (format!("'{}'", namespace), format!(" -n {}", namespace)),
            };
            Some(format!(
                "Please, ensure that the ImageStream Tag '{}' exists in the {} namespace (with 'oc get is{}')",
                from("name"),
                info,
                params
            ))
        }
        _ => None,
    }
}

#[async_trait]
impl ImageBuilder for OpenShiftBuilder {
    async fn build(&self, image: &ImageConfig) -> Result<()> {
        let name = image.image_name().map_err(Error::ConfigError)?;
        let archive = archive::create(image, self.config.strategy)?;

        let build_config = format!("{}{}", name.simple_name(), self.config.build_name_suffix);
        let image_stream = name.simple_name().to_string();
        let image_stream_tag = format!("{}:{}", image_stream, name.tag_or_latest());

        let mut resources = ResourceList::new();
        let pull_secret = self.ensure_pull_secret(image).await?;
        self.ensure_build_config(&build_config, image, &image_stream_tag, pull_secret.as_deref(), &mut resources)
            .await?;
        self.ensure_image_stream(&image_stream, &mut resources).await?;
        self.apply_resources(resources).await?;

        let build = self.submit_build(&build_config, archive).await?;
        self.wait_for_build(&build_config, &build).await?;

        self.record_image_stream(&name).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dd_common::config::{BuildStrategy, RecreateMode, RegistryCredential};
    use dd_common::image::BuildImageConfig;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::testing::{build, object, FakeOpenShift};

    fn failed_build(name: &str, phase: &str, reason: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "Build",
            "metadata": {"name": name},
            "status": {"phase": phase, "reason": reason},
        }))
    }

    fn image(dir: &std::path::Path) -> ImageConfig {
        ImageConfig {
            name: "quay.io/shop/app:1.0".into(),
            build: Some(BuildImageConfig {
                from: Some("registry.example.com/ubi8/openjdk-17".into()),
                context_dir: Some(dir.to_path_buf()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn builder(fake: &Arc<FakeOpenShift>, dir: &std::path::Path) -> OpenShiftBuilder {
        OpenShiftBuilder::new(fake.clone(), BuildServiceConfig::new(dir, "shop"), Credentials::default())
    }

    #[tokio::test]
    async fn test_build_config_rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        let builder = builder(&fake, dir.path());
        let image = image(dir.path());

        let mut resources = ResourceList::new();
        builder.ensure_build_config("app-s2i", &image, "app:1.0", None, &mut resources).await.unwrap();
        assert_eq!(resources.len(), 1);
        builder.apply_resources(resources).await.unwrap();

        let mut resources = ResourceList::new();
        builder.ensure_build_config("app-s2i", &image, "app:1.0", None, &mut resources).await.unwrap();

        assert!(resources.is_empty());
        assert_eq!(fake.count("replace_build_config"), 0);
        assert_eq!(fake.count("create BuildConfig"), 1);
    }

    #[tokio::test]
    async fn test_build_config_updated_when_output_changes() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        let builder = builder(&fake, dir.path());
        let image = image(dir.path());

        let strategy = build_strategy(&image, BuildStrategy::S2i, None).unwrap();
        fake.put_build_config(new_build_config("app-s2i", strategy, build_output("app:0.9")).unwrap());

        let mut resources = ResourceList::new();
        builder.ensure_build_config("app-s2i", &image, "app:1.0", None, &mut resources).await.unwrap();

        assert!(resources.is_empty());
        assert_eq!(fake.count("replace_build_config"), 1);
        let updated = fake.build_config("app-s2i").unwrap();
        assert_eq!(updated.data.pointer("/spec/output/to/name"), Some(&json!("app:1.0")));
    }

    #[tokio::test]
    async fn test_build_config_recreated_under_recreate_mode() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        let mut config = BuildServiceConfig::new(dir.path(), "shop");
        config.recreate_mode = RecreateMode::All;
        let builder = OpenShiftBuilder::new(fake.clone(), config, Credentials::default());
        fake.put_build_config(new_build_config("app-s2i", json!({"type": "Docker"}), build_output("app:1.0")).unwrap());
        fake.put_image_stream(new_image_stream("app", true).unwrap());

        let mut resources = ResourceList::new();
        builder.ensure_build_config("app-s2i", &image(dir.path()), "app:1.0", None, &mut resources).await.unwrap();
        builder.ensure_image_stream("app", &mut resources).await.unwrap();

        assert_eq!(fake.count("delete_build_config"), 1);
        assert_eq!(fake.count("delete_image_stream"), 1);
        assert_eq!(resources.len(), 2);
    }

    #[tokio::test]
    async fn test_pull_secret_created_then_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        let credentials = Credentials {
            registries: vec![RegistryCredential {
                server: "registry.example.com".into(),
                username: "user".into(),
                password: "secret".into(),
            }],
        };
        let builder = OpenShiftBuilder::new(fake.clone(), BuildServiceConfig::new(dir.path(), "shop"), credentials);
        let image = image(dir.path());

        let name = builder.ensure_pull_secret(&image).await.unwrap();
        assert_eq!(name.as_deref(), Some("pullsecret-drydock"));
        assert!(fake.secret("pullsecret-drydock").is_some());

        builder.ensure_pull_secret(&image).await.unwrap();
        assert_eq!(fake.count("create_secret"), 1);
        assert_eq!(fake.count("replace_secret"), 0);
    }

    #[tokio::test]
    async fn test_no_pull_secret_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());

        let name = builder(&fake, dir.path()).ensure_pull_secret(&image(dir.path())).await.unwrap();

        assert_eq!(name, None);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_retries_on_socket_closed() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.fail_creates(2);

        let resources = ResourceList::from(vec![new_image_stream("app", true).unwrap()]);
        let start = Instant::now();
        builder(&fake, dir.path()).apply_resources(resources).await.unwrap();

        assert_eq!(fake.count("create ImageStream failed"), 2);
        assert_eq!(fake.count("create ImageStream app"), 1);
        assert_eq!(start.elapsed(), APPLY_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_gives_up_after_five_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.fail_creates(10);

        let resources = ResourceList::from(vec![new_image_stream("app", true).unwrap()]);
        let err = builder(&fake, dir.path()).apply_resources(resources).await.unwrap_err();

        assert!(is_socket_closed(&err));
        assert_eq!(fake.count("create ImageStream failed"), APPLY_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_complete_build_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(build("app-s2i-1", "Running"));
        fake.set_build_events(vec![build("app-s2i-1", "Running"), build("app-s2i-1", "Complete")]);

        builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap();
        assert_eq!(fake.count("watch_build"), 1);
        assert_eq!(fake.count("list_builds"), 0);
    }

    #[tokio::test]
    async fn test_failed_build_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "Build",
            "metadata": {"name": "app-s2i-1"},
            "status": {"phase": "Failed", "reason": "DockerBuildFailed", "message": "Docker build strategy has failed."},
        })));

        let err = builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap_err();

        assert!(err.to_string().contains("DockerBuildFailed"), "{}", err);
        assert!(err.to_string().contains("app-s2i-1"), "{}", err);
        // already finished, no watch needed
        assert_eq!(fake.count("watch_build"), 0);
        assert_eq!(fake.count("list_builds"), 1);
    }

    #[tokio::test]
    async fn test_failure_observed_through_watch() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(build("app-s2i-1", "Running"));
        fake.set_build_events(vec![
            build("app-s2i-1", "Running"),
            failed_build("app-s2i-1", "Failed", "OutOfMemoryKilled"),
        ]);

        let err = builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap_err();

        assert!(matches!(err, Error::BuildFailed { ref reason, .. } if reason.contains("OutOfMemoryKilled")), "{}", err);
        assert_eq!(fake.count("watch_build"), 1);
        assert_eq!(fake.count("list_builds"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_and_error_phases_fail() {
        for phase in ["Cancelled", "Error"] {
            let dir = tempfile::tempdir().unwrap();
            let fake = Arc::new(FakeOpenShift::default());
            fake.put_build(build("app-s2i-1", "Pending"));
            fake.set_build_events(vec![failed_build("app-s2i-1", phase, "CancelledBuild")]);

            let err = builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap_err();
            assert!(matches!(err, Error::BuildFailed { .. }), "{}: {}", phase, err);
        }
    }

    #[tokio::test]
    async fn test_listing_failure_keeps_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(failed_build("app-s2i-1", "Failed", "DockerBuildFailed"));
        fake.fail_list_builds();

        let err = builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap_err();

        assert!(matches!(err, Error::BuildFailed { ref reason, .. } if reason.contains("DockerBuildFailed")), "{}", err);
        assert_eq!(fake.count("list_builds"), 1);
    }

    #[tokio::test]
    async fn test_stream_closed_upload_looks_up_source_image() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        let image = image(dir.path());
        let strategy = build_strategy(&image, BuildStrategy::S2i, None).unwrap();
        fake.put_build_config(new_build_config("app-s2i", strategy, build_output("app:1.0")).unwrap());
        fake.fail_instantiate("stream closed by peer");

        let err = builder(&fake, dir.path()).submit_build("app-s2i", vec![1, 2, 3]).await.unwrap_err();

        assert!(err.to_string().contains("stream closed"), "{}", err);
        assert_eq!(fake.count("get_build_config app-s2i"), 1);
    }

    #[tokio::test]
    async fn test_other_upload_errors_skip_source_image_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.fail_instantiate("connection refused");

        assert!(builder(&fake, dir.path()).submit_build("app-s2i", vec![]).await.is_err());
        assert_eq!(fake.count("get_build_config"), 0);
    }

    #[test]
    fn test_source_image_hint() {
        let docker = object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "BuildConfig",
            "metadata": {"name": "app-s2i"},
            "spec": {"strategy": {"sourceStrategy": {"from": {"kind": "DockerImage", "name": "ubi8/openjdk-17"}}}},
        }));
        let hint = source_image_hint(&docker).unwrap();
        assert!(hint.contains("Docker image 'ubi8/openjdk-17'"), "{}", hint);

        let tag = object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "BuildConfig",
            "metadata": {"name": "app-s2i"},
            "spec": {"strategy": {"sourceStrategy": {"from": {"kind": "ImageStreamTag", "name": "java:11", "namespace": "openshift"}}}},
        }));
        let hint = source_image_hint(&tag).unwrap();
        assert!(hint.contains("'java:11' exists in the 'openshift' namespace (with 'oc get is -n openshift')"), "{}", hint);

        let docker_strategy = object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "BuildConfig",
            "metadata": {"name": "app-s2i"},
            "spec": {"strategy": {"dockerStrategy": {}}},
        }));
        assert_eq!(source_image_hint(&docker_strategy), None);
    }

    #[tokio::test]
    async fn test_watch_closed_while_running_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(build("app-s2i-1", "Running"));
        fake.set_build_events(vec![build("app-s2i-1", "Running")]);

        builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap();
        assert_eq!(fake.count("watch_build"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pod_readiness_timeout_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeOpenShift::default());
        fake.set_pod_never_ready();
        fake.put_build(build("app-s2i-1", "Complete"));

        let start = Instant::now();
        builder(&fake, dir.path()).wait_for_build("app-s2i", "app-s2i-1").await.unwrap();

        assert!(start.elapsed() >= POD_READY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_full_build_records_image_stream() {
        let dir = tempfile::tempdir().unwrap();
        let context = dir.path().join("context");
        std::fs::create_dir_all(&context).unwrap();
        std::fs::write(context.join("app.jar"), "jar").unwrap();

        let fake = Arc::new(FakeOpenShift::default());
        fake.put_build(build("app-s2i-1", "Complete"));
        fake.put_image_stream(object(json!({
            "apiVersion": "image.openshift.io/v1",
            "kind": "ImageStream",
            "metadata": {"name": "app"},
            "status": {"tags": [{"tag": "1.0", "items": [{"image": "sha256:abc"}]}]},
        })));

        let mut image = image(&context);
        image.build.as_mut().unwrap().env = BTreeMap::from([("A".to_string(), "1".to_string())]);
        builder(&fake, dir.path()).build(&image).await.unwrap();

        let calls = fake.calls();
        assert!(calls.contains(&"create BuildConfig app-s2i".to_string()), "{:?}", calls);
        assert!(calls.iter().any(|c| c.starts_with("instantiate_binary app-s2i ")), "{:?}", calls);
        assert_eq!(fake.count("create ImageStream"), 0);

        let written = ResourceList::load(&dir.path().join("shop-is.yml")).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written.items()[0].data.pointer("/spec/tags/0/from/name"),
            Some(&json!("app@sha256:abc"))
        );
    }
}
