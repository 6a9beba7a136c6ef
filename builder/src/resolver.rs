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

use kube::core::DynamicObject;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::OpenShiftApi;
use crate::errors::{Error, Result};

pub const RESOLVE_ATTEMPTS: usize = 15;
pub const RESOLVE_INTERVAL: Duration = Duration::from_millis(1000);

/// Finds the image digest of the latest tag of an ImageStream.
///
/// The image registry updates the stream status after the build completed,
/// so the stream is polled a fixed number of times at a fixed interval.
pub struct ImageStreamTagResolver {
    api: Arc<dyn OpenShiftApi>,
    attempts: usize,
    interval: Duration,
}

impl ImageStreamTagResolver {
    pub fn new(api: Arc<dyn OpenShiftApi>) -> Self {
        Self { api, attempts: RESOLVE_ATTEMPTS, interval: RESOLVE_INTERVAL }
    }

    pub async fn resolve(&self, name: &str) -> Result<String> {
        let mut found = false;

        for attempt in 0..self.attempts {
            if attempt > 0 {
                debug!("Retrying to find tag on ImageStream {}", name);
                tokio::time::sleep(self.interval).await;
            }

            let stream = match self.api.get_image_stream(name).await? {
                Some(stream) => stream,
                None => continue,
            };
            found = true;

            if let Some(image) = latest_image(&stream) {
                info!("Found tag on ImageStream {} tag: {}", name, image);
                return Ok(image.to_string());
            }
        }

        match found {
            true => Err(Error::NoTagFound(name.to_string())),
            false => Err(Error::ImageStreamNotFound {
                name: name.to_string(),
                namespace: self.api.namespace().to_string(),
            }),
        }
    }
}

/// The image of the first event of the first tag, when it is not blank.
fn latest_image(stream: &DynamicObject) -> Option<&str> {
    let tag = stream.data.pointer("/status/tags")?.as_array()?.first()?;
    let event = tag.get("items")?.as_array()?.first()?;
    event.get("image").and_then(Value::as_str).filter(|image| !image.trim().is_empty())
}
