//! Reading of the job reports and catalogue tables into [`DataFrame`]s.
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
use crate::{
    JobReportFormat, WorkingSetConfig,
    datafusion::{
        glob::{expand_glob, has_glob},
        util::location_url,
    },
    plan::SourceTable,
    schemas::{blocks_schema, datasets_schema, files_schema},
};
use arrow::datatypes::Schema;
use datafusion::{
    dataframe::DataFrame,
    datasource::listing::ListingTableUrl,
    error::DataFusionError,
    execution::{
        context::SessionContext,
        options::{AvroReadOptions, CsvReadOptions, ParquetReadOptions},
    },
};
use log::info;
use std::collections::HashMap;

/// Catalogue fields that read as null: empty or the literal `null`.
pub const NULL_FIELD_PATTERN: &str = "^(null)?$";

/// The files to read for a location: the location itself, or every match of its glob.
async fn resolve_location(
    ctx: &SessionContext,
    location: &str,
) -> Result<Vec<String>, DataFusionError> {
    if !has_glob(location) {
        return Ok(vec![location.to_owned()]);
    }
    let store_url = location_url(location)?;
    let store = ctx
        .runtime_env()
        .object_store(ListingTableUrl::parse(store_url.as_str())?)?;
    expand_glob(store.as_ref(), &store_url, location).await
}

/// Reads a header-less comma separated catalogue dump with a fixed layout.
///
/// Rows with the wrong number of fields or values that don't parse as their column
/// type fail the query when it executes.
async fn read_catalogue(
    ctx: &SessionContext,
    location: &str,
    schema: &Schema,
) -> Result<DataFrame, DataFusionError> {
    let options = CsvReadOptions::new()
        .has_header(false)
        .delimiter(b',')
        .schema(schema)
        // Dumps are named like part-m-00000
        .file_extension("")
        .null_regex(Some(NULL_FIELD_PATTERN.to_owned()));
    ctx.read_csv(resolve_location(ctx, location).await?, options)
        .await
}

async fn read_job_reports(
    ctx: &SessionContext,
    location: &str,
    format: JobReportFormat,
) -> Result<DataFrame, DataFusionError> {
    let paths = resolve_location(ctx, location).await?;
    match format {
        JobReportFormat::Avro => ctx.read_avro(paths, AvroReadOptions::default()).await,
        JobReportFormat::Parquet => ctx.read_parquet(paths, ParquetReadOptions::default()).await,
    }
}

/// Opens every source table named in the configuration.
///
/// # Errors
/// If a location can't be listed or its schema can't be read.
pub async fn read_sources(
    ctx: &SessionContext,
    config: &WorkingSetConfig,
) -> Result<HashMap<SourceTable, DataFrame>, DataFusionError> {
    info!(
        "Reading {} job reports from {}",
        config.job_report_format(),
        config.job_reports()
    );
    let job_reports =
        read_job_reports(ctx, config.job_reports(), config.job_report_format()).await?;
    let files = read_catalogue(ctx, config.files(), &files_schema()).await?;
    let blocks = read_catalogue(ctx, config.blocks(), &blocks_schema()).await?;
    let datasets = read_catalogue(ctx, config.datasets(), &datasets_schema()).await?;
    Ok(HashMap::from([
        (SourceTable::JobReports, job_reports),
        (SourceTable::Files, files),
        (SourceTable::Blocks, blocks),
        (SourceTable::Datasets, datasets),
    ]))
}
