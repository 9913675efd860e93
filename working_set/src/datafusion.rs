//! `DataFusion` contains the implementation for running the working set query
//! using Apache `DataFusion`.
//!
//! This allows for multi-threaded data processing and optimised Avro, CSV and Parquet reading.
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
    WorkingSetConfig,
    datafusion::{
        output::output_directory,
        util::{location_url, register_store},
    },
    s3::ObjectStoreFactory,
};
use datafusion::{
    dataframe::DataFrame,
    datasource::file_format::{format_as_file_type, parquet::ParquetFormatFactory},
    error::DataFusionError,
    execution::{config::SessionConfig, context::SessionContext},
    logical_expr::LogicalPlanBuilder,
    physical_plan::ExecutionPlan,
};
use std::{collections::HashMap, sync::Arc};

mod compute;
pub(crate) mod config;
pub mod glob;
pub mod lower;
mod metrics;
pub mod output;
pub mod regexp_extract;
mod sources;
mod util;

pub use compute::compute_working_set;
pub use config::ParquetWriterConfigurer;
pub use metrics::WorkingSetResult;
pub use output::OutputParquetOptions;

/// Drives common operations in processing of `DataFusion` for the working set.
#[derive(Debug)]
pub struct WorkingSetOperations<'a> {
    config: &'a WorkingSetConfig,
}

impl<'a> WorkingSetOperations<'a> {
    /// Create a new `DataFusion` operations processor.
    #[must_use]
    pub fn new(config: &'a WorkingSetConfig) -> Self {
        Self { config }
    }

    /// Sets session options for reading the sources and writing the output.
    ///
    /// # Errors
    /// If the Parquet output options are invalid.
    pub fn apply_config(&self, mut cfg: SessionConfig) -> Result<SessionConfig, DataFusionError> {
        // Catalogue strings are plain Utf8, so read Parquet strings the same way to keep join keys alike
        cfg.options_mut().execution.parquet.schema_force_view_types = false;
        cfg.options_mut().optimizer.expand_views_at_output = true;
        let configurer = ParquetWriterConfigurer {
            parquet_options: self.config.parquet_options(),
        };
        configurer.apply_parquet_config(cfg)
    }

    /// Register object stores for every input and the output with a [`SessionContext`].
    ///
    /// # Errors
    /// If a location has no usable object store.
    pub fn configure_context(
        &self,
        ctx: SessionContext,
        store_factory: &ObjectStoreFactory,
    ) -> Result<SessionContext, DataFusionError> {
        let mut urls = self
            .config
            .input_locations()
            .iter()
            .map(|l| location_url(l))
            .collect::<Result<Vec<_>, _>>()?;
        urls.push(self.config.output().clone());
        register_store(store_factory, &urls, &ctx)?;
        Ok(ctx)
    }

    /// Add a Parquet output stage on to a frame.
    ///
    /// # Errors
    /// If the result logical plan could not be built.
    pub fn plan_with_parquet_output(
        &self,
        frame: DataFrame,
        configurer: &ParquetWriterConfigurer<'_>,
    ) -> Result<DataFrame, DataFusionError> {
        let (session_state, logical_plan) = frame.into_parts();
        let pqo = configurer.apply_dictionary_encoding(
            session_state.default_table_options().parquet,
            logical_plan.schema(),
        );
        let logical_plan = LogicalPlanBuilder::copy_to(
            logical_plan,
            output_directory(self.config.output()),
            format_as_file_type(Arc::new(ParquetFormatFactory::new_with_options(pqo))),
            HashMap::default(),
            Vec::new(),
        )?
        .build()?;
        Ok(DataFrame::new(session_state, logical_plan))
    }

    /// Convert a frame to an optimised physical plan.
    ///
    /// # Errors
    /// If optimisation or physical planning fails.
    pub async fn to_physical_plan(
        &self,
        frame: DataFrame,
    ) -> Result<Arc<dyn ExecutionPlan>, DataFusionError> {
        frame.create_physical_plan().await
    }
}

impl std::fmt::Display for WorkingSetOperations<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config)
    }
}
