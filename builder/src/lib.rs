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

pub mod api;
pub mod archive;

mod openshift;
pub use openshift::OpenShiftBuilder;

mod resolver;
pub use resolver::ImageStreamTagResolver;

pub mod errors;
use errors::Result;

#[cfg(test)]
mod testing;

use async_trait::async_trait;
use dd_common::image::ImageConfig;

/// Builder trait
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Builds one image.
    async fn build(&self, image: &ImageConfig) -> Result<()>;

    /// Runs once after every image was built.
    async fn post_process(&self) -> Result<()> {
        Ok(())
    }
}

/// Build director, it's a strategy pattern implementation
pub struct BuildDirector {
    builder: Box<dyn ImageBuilder>,
}

impl BuildDirector {
    /// Constructor, receive a builder implementation
    pub fn new(builder: Box<dyn ImageBuilder>) -> Self {
        BuildDirector { builder }
    }

    /// Change the builder
    pub fn set_builder(&mut self, builder: Box<dyn ImageBuilder>) {
        self.builder = builder;
    }

    /// Builds the images in order, stopping at the first failure.
    pub async fn build(&self, images: &[ImageConfig]) -> Result<()> {
        for image in images {
            self.builder.build(image).await?;
        }
        self.builder.post_process().await
    }
}
