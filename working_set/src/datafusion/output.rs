//! Parquet output options and checks on the output location.
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
use datafusion::{common::exec_err, error::DataFusionError};
use futures::StreamExt;
use log::debug;
use object_store::{ObjectStore, path::Path};
use url::Url;

/// Options for writing the output Parquet files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputParquetOptions {
    pub max_row_group_size: usize,
    pub max_page_size: usize,
    /// One of `uncompressed`, `snappy`, `lzo`, `lz4`, `gzip`, `brotli` or `zstd`.
    pub compression: String,
    /// `v1` or `v2`.
    pub writer_version: String,
    pub column_truncate_length: usize,
    pub stats_truncate_length: usize,
    /// Dictionary encode the string columns the output is grouped by.
    pub dict_enc_group_keys: bool,
    /// Dictionary encode all other columns.
    pub dict_enc_values: bool,
}

impl Default for OutputParquetOptions {
    fn default() -> Self {
        Self {
            max_row_group_size: 1_000_000,
            max_page_size: 65535,
            compression: "zstd".into(),
            writer_version: "v2".into(),
            column_truncate_length: 128,
            stats_truncate_length: 2_147_483_647,
            dict_enc_group_keys: true,
            dict_enc_values: false,
        }
    }
}

/// Object store path addressed by a URL.
///
/// # Errors
/// If the URL path can't be decoded into a valid store path.
pub fn store_path(url: &Url) -> Result<Path, DataFusionError> {
    Path::from_url_path(url.path()).map_err(|e| DataFusionError::External(Box::new(e)))
}

/// Output URL as a directory, so the result is written as one or more part files beneath it.
#[must_use]
pub fn output_directory(url: &Url) -> String {
    let s = url.as_str();
    if s.ends_with('/') {
        s.to_owned()
    } else {
        format!("{s}/")
    }
}

/// Checks nothing exists at the output location.
///
/// The location may be absent or an empty directory.
///
/// # Errors
/// If an object exists at the location, anything is listed beneath it, or the store
/// can't be queried.
pub async fn check_output_location(
    store: &dyn ObjectStore,
    output: &Url,
) -> Result<(), DataFusionError> {
    let path = store_path(output)?;
    match store.head(&path).await {
        Ok(_) => return exec_err!("Output location {output} already exists"),
        Err(object_store::Error::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }
    if let Some(first) = store.list(Some(&path)).next().await {
        let meta = first?;
        debug!("Found {} under output location", meta.location);
        return exec_err!("Output location {output} is not empty");
    }
    Ok(())
}
