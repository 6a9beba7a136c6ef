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

//! Enrichers shipped with drydock.

mod deployment_config;
pub use deployment_config::DeploymentConfigEnricher;

mod metadata;
pub use metadata::MetadataEnricher;

mod name;
pub use name::DefaultNameEnricher;

mod project_label;
pub use project_label::ProjectLabelEnricher;

mod replicas;
pub use replicas::ReplicaCountEnricher;

mod route;
pub use route::RouteEnricher;
