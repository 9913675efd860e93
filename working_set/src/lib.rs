//! The `working_set` crate computes the daily working set of a physics data processing
//! system: for each day, submission tool, input campaign, data tier and site, the distinct
//! storage blocks read by successful jobs, with total CPU and wall clock time and the
//! number of jobs.
//!
//! The query is built as an engine independent [`plan::PlanNode`] and executed with
//! Apache `DataFusion`. All the public API should be in this module.
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
use color_eyre::eyre::Result;

mod common_config;
pub mod datafusion;
pub mod plan;
pub mod query;
mod s3;
pub mod schemas;
mod working_set_context;

pub use common_config::{
    AwsConfig, ConfigError, DEFAULT_BLOCKS, DEFAULT_DATASETS, DEFAULT_FILES, DEFAULT_JOB_REPORTS,
    JobReportFormat, WorkingSetConfig, WorkingSetConfigBuilder,
};
pub use datafusion::{OutputParquetOptions, WorkingSetResult};
pub use s3::ObjectStoreFactory;
pub use working_set_context::WorkingSetContext;

/// Default output location of the command line application.
///
/// A local stand-in for the cluster's HDFS working set directory.
pub const DEFAULT_OUTPUT: &str = "/user/cms/working_set_day";

/// Computes the working set described by `config` and writes it as Parquet.
///
/// AWS credentials are only needed if a location is in S3. They come from
/// [`WorkingSetConfig::aws_config`] if set, otherwise the default provider chain.
///
/// # Examples
/// ```no_run
/// # use url::Url;
/// # use working_set::{run_working_set, WorkingSetConfigBuilder, WorkingSetContext};
/// # fn main() -> Result<(), color_eyre::eyre::Report> {
/// let config = WorkingSetConfigBuilder::new()
///     .output(Url::parse("file:///data/working_set_day")?)
///     .build()?;
/// let context = WorkingSetContext::new();
/// # tokio_test::block_on(async {
/// let result = run_working_set(&config, &context).await;
/// # });
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// If the output location is not empty, an input can't be read or contains a malformed
/// row, or writing the output fails.
pub async fn run_working_set(
    config: &WorkingSetConfig,
    context: &WorkingSetContext,
) -> Result<WorkingSetResult> {
    let store_factory = config.create_object_store_factory().await;
    crate::datafusion::compute_working_set(&store_factory, config, context)
        .await
        .map_err(Into::into)
}
