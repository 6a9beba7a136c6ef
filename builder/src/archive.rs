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

//! Tarballs uploaded to binary builds.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use dd_common::config::BuildStrategy;
use dd_common::image::ImageConfig;
use tracing::debug;

use crate::errors::{Error, Result};

pub const S2I_ENVIRONMENT: &str = ".s2i/environment";

/// Builds the archive for `image`.
///
/// A supplied archive is used as is, otherwise the context directory is
/// packed. S2I builds with build environment variables get them as
/// `.s2i/environment` inside the archive.
pub fn create(image: &ImageConfig, strategy: BuildStrategy) -> Result<Vec<u8>> {
    let build = image.build.clone().unwrap_or_default();
    let environment = match strategy {
        BuildStrategy::S2i if !build.env.is_empty() => Some(s2i_environment(&build.env)),
        _ => None,
    };

    if let Some(path) = build.archive.as_deref() {
        debug!("Using build archive {}", path.display());
        let content = std::fs::read(path).map_err(|e| Error::ArchiveError(path.to_path_buf(), e))?;
        return match environment {
            Some(environment) => repack(path, &content, &environment),
            None => Ok(content),
        };
    }

    let context = build.context_dir.as_deref().ok_or_else(|| Error::MissingBuildContext(image.name.clone()))?;
    pack(context, environment.as_deref())
}

fn s2i_environment(env: &BTreeMap<String, String>) -> String {
    env.iter().map(|(key, value)| format!("{}={}\n", key, value)).collect()
}

fn pack(context: &Path, environment: Option<&str>) -> Result<Vec<u8>> {
    let io_error = |e| Error::ArchiveError(context.to_path_buf(), e);

    let mut builder = tar::Builder::new(Vec::new());
    builder.append_dir_all(".", context).map_err(io_error)?;
    if let Some(environment) = environment {
        append_file(&mut builder, S2I_ENVIRONMENT, environment).map_err(io_error)?;
    }
    debug!("Packed build context {}", context.display());

    builder.into_inner().map_err(io_error)
}

/// Copies every entry of `content` into a new archive, then adds the S2I
/// environment file.
fn repack(path: &Path, content: &[u8], environment: &str) -> Result<Vec<u8>> {
    let io_error = |e| Error::ArchiveError(path.to_path_buf(), e);

    let mut builder = tar::Builder::new(Vec::new());
    let mut archive = tar::Archive::new(content);
    for entry in archive.entries().map_err(io_error)? {
        let mut entry = entry.map_err(io_error)?;
        if entry.path().map_err(io_error)?.ends_with(S2I_ENVIRONMENT) {
            continue;
        }
        let mut header = entry.header().clone();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(io_error)?;
        builder.append_data(&mut header, entry.path().map_err(io_error)?, data.as_slice()).map_err(io_error)?;
    }
    append_file(&mut builder, S2I_ENVIRONMENT, environment).map_err(io_error)?;

    builder.into_inner().map_err(io_error)
}

fn append_file(builder: &mut tar::Builder<Vec<u8>>, path: &str, content: &str) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, content.as_bytes())
}
