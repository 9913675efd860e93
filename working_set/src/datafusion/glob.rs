//! Expansion of glob patterns in input locations.
//!
//! `DataFusion` only understands globs in local paths, and skips `key=value` directories
//! when matching them. Locations here are expanded up front by listing the store beneath the
//! fixed part of the pattern, so `year=201[678]/month=*` works the same locally and in S3.
/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use datafusion::{
    common::{exec_err, plan_datafusion_err},
    error::DataFusionError,
};
use futures::TryStreamExt;
use log::debug;
use num_format::{Locale, ToFormattedString};
use object_store::{ObjectStore, path::Path};
use url::Url;
use wax::{CandidatePath, Glob, Pattern};

const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// Does this location contain a glob pattern?
#[must_use]
pub fn has_glob(location: &str) -> bool {
    location.contains(GLOB_CHARS)
}

/// The part of a location before the object key, e.g. `/` or `s3://bucket/`.
fn store_root(store_url: &Url) -> String {
    if store_url.scheme() == "file" {
        "/".to_owned()
    } else {
        format!(
            "{}://{}/",
            store_url.scheme(),
            store_url.host_str().unwrap_or_default()
        )
    }
}

/// Lists every object in `store` matching the glob `location`.
///
/// `store_url` is the root of the store: `file:///` for local paths, `s3://bucket` for S3.
/// The results are in the same form as `location` and sorted.
///
/// # Errors
/// If the glob is invalid, listing fails or nothing matches.
pub async fn expand_glob(
    store: &dyn ObjectStore,
    store_url: &Url,
    location: &str,
) -> Result<Vec<String>, DataFusionError> {
    let root = store_root(store_url);
    let key_pattern = location.strip_prefix(root.as_str()).unwrap_or(location);
    let (prefix, glob) = Glob::new(key_pattern)
        .map_err(|e| plan_datafusion_err!("Invalid glob {location}: {e}"))?
        .partition();
    let prefix = prefix
        .to_str()
        .ok_or_else(|| plan_datafusion_err!("Invalid glob {location}"))?
        .to_owned();
    let prefix_path =
        Path::parse(&prefix).map_err(|e| DataFusionError::External(Box::new(e)))?;

    let mut matched = store
        .list(Some(&prefix_path))
        .try_filter_map(|meta| {
            let key = meta.location.to_string();
            let relative = key
                .strip_prefix(prefix.as_str())
                .unwrap_or(&key)
                .trim_start_matches('/');
            let is_match = glob.is_match(CandidatePath::from(std::path::Path::new(relative)));
            futures::future::ready(Ok(is_match.then(|| format!("{root}{key}"))))
        })
        .try_collect::<Vec<_>>()
        .await?;
    if matched.is_empty() {
        return exec_err!("No files match {location}");
    }
    matched.sort();
    debug!(
        "{} files match {location}",
        matched.len().to_formatted_string(&Locale::en)
    );
    Ok(matched)
}
