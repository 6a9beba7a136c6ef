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
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("YamlError: {0}")]
    YamlError(#[source] serde_yaml::Error),

    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),

    #[error("Cannot read {0}: {1}")]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("Cannot write {0}: {1}")]
    WriteError(PathBuf, #[source] std::io::Error),

    #[error("Invalid extension of {0}. Allowed extensions: yml, yaml, json")]
    UnsupportedExtension(PathBuf),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
