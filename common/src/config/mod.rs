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

mod build;
pub use build::{BuildServiceConfig, BuildStrategy, RecreateMode, ResourceFileType};

mod credential;
pub use credential::{Credentials, RegistryCredential};

mod metadata;
pub use metadata::{MetaDataConfig, ResourceConfig};

mod processor;
pub use processor::ProcessorConfig;

pub mod profile;
pub use profile::{Profile, ProcessorKind};
