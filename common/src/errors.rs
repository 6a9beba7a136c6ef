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

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No {kind} with name '{name}' found to include. Please check spelling and your project dependencies")]
    UnknownProcessor { kind: String, name: String },

    #[error("Cannot merge profiles with different names ({0} vs. {1})")]
    ProfileNameMismatch(String, String),

    #[error("No profile {0} defined")]
    ProfileNotFound(String),

    #[error("Parent profile chain of {0} is cyclic")]
    ProfileCycle(String),

    #[error("Error while reading {0}: {1}")]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("YamlError: {0}")]
    YamlError(#[source] serde_yaml::Error),

    #[error("InvalidImageName: {0}")]
    InvalidImageName(String),

    #[error("Unknown {0}: {1}")]
    UnknownValue(&'static str, String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
