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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config Error: {0}")]
    ConfigError(#[source] dd_common::errors::Error),

    #[error("Resource Error: {0}")]
    ResourceError(#[source] dd_resources::error::Error),

    #[error("Invalid value '{value}' for {key} of {processor}")]
    InvalidConfig { processor: String, key: &'static str, value: String },

    #[error(
        "Container {0} has no image configured. Please check your image configuration \
         (including the generators which are supposed to run)"
    )]
    ContainerWithoutImage(String),

    #[error("{0} failed: {1}")]
    ProcessorFailed(String, #[source] Box<Error>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
