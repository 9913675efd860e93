//! `DataFusion` configuration facilities. Used to configure Parquet writing options.
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
use crate::{datafusion::output::OutputParquetOptions, schemas::GROUP_COLUMNS};
use arrow::datatypes::DataType;
use datafusion::{
    common::{DFSchema, plan_err},
    config::TableParquetOptions,
    error::DataFusionError,
    execution::config::SessionConfig,
    parquet::basic::{BrotliLevel, GzipLevel, ZstdLevel},
};

/// Names of accepted compression codecs.
pub const COMPRESSION_CODECS: [&str; 7] =
    ["uncompressed", "snappy", "lzo", "lz4", "gzip", "brotli", "zstd"];

/// Names of accepted Parquet writer versions.
pub const WRITER_VERSIONS: [&str; 2] = ["v1", "v2"];

/// Applies [`OutputParquetOptions`] to a [`SessionConfig`] and [`TableParquetOptions`].
#[derive(Debug)]
pub struct ParquetWriterConfigurer<'a> {
    pub parquet_options: &'a OutputParquetOptions,
}

impl ParquetWriterConfigurer<'_> {
    /// Configure the session's Parquet writer.
    ///
    /// # Errors
    /// If the compression codec or writer version is not recognised.
    pub fn apply_parquet_config(
        &self,
        mut cfg: SessionConfig,
    ) -> Result<SessionConfig, DataFusionError> {
        let compression = self.get_compression()?;
        let writer_version = self.get_parquet_writer_version()?;
        let parquet = &mut cfg.options_mut().execution.parquet;
        parquet.max_row_group_size = self.parquet_options.max_row_group_size;
        parquet.data_pagesize_limit = self.parquet_options.max_page_size;
        parquet.compression = Some(compression);
        parquet.writer_version = writer_version;
        parquet.column_index_truncate_length = Some(self.parquet_options.column_truncate_length);
        parquet.statistics_truncate_length = Some(self.parquet_options.stats_truncate_length);
        Ok(cfg)
    }

    /// Enable dictionary encoding per column.
    ///
    /// Grouping columns holding strings follow `dict_enc_group_keys`, every other column
    /// follows `dict_enc_values`.
    #[must_use]
    pub fn apply_dictionary_encoding(
        &self,
        mut opts: TableParquetOptions,
        schema: &DFSchema,
    ) -> TableParquetOptions {
        for field in schema.fields() {
            let is_string_key = GROUP_COLUMNS.contains(&field.name().as_str())
                && matches!(
                    field.data_type(),
                    DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
                );
            let dict_encode = if is_string_key {
                self.parquet_options.dict_enc_group_keys
            } else {
                self.parquet_options.dict_enc_values
            };
            opts.column_specific_options
                .entry(field.name().clone())
                .or_default()
                .dictionary_enabled = Some(dict_encode);
        }
        opts
    }

    /// Convert a codec name to one `DataFusion` understands.
    fn get_compression(&self) -> Result<String, DataFusionError> {
        match self.parquet_options.compression.to_lowercase().as_str() {
            x @ ("uncompressed" | "snappy" | "lzo" | "lz4") => Ok(x.into()),
            "gzip" => Ok(format!(
                "gzip({})",
                GzipLevel::default().compression_level()
            )),
            "brotli" => Ok(format!(
                "brotli({})",
                BrotliLevel::default().compression_level()
            )),
            "zstd" => Ok(format!(
                "zstd({})",
                ZstdLevel::default().compression_level()
            )),
            x => plan_err!(
                "Unknown compression {x}, valid values: {}",
                COMPRESSION_CODECS.join(", ")
            ),
        }
    }

    /// Convert a writer version name to one `DataFusion` understands.
    fn get_parquet_writer_version(&self) -> Result<String, DataFusionError> {
        match self.parquet_options.writer_version.to_lowercase().as_str() {
            "v1" => Ok("1.0".into()),
            "v2" => Ok("2.0".into()),
            x => plan_err!(
                "Parquet writer version invalid {x}, valid values: {}",
                WRITER_VERSIONS.join(", ")
            ),
        }
    }
}
