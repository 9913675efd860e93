//! Running the working set query end to end.
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
    WorkingSetConfig, WorkingSetContext,
    datafusion::{
        ParquetWriterConfigurer, WorkingSetOperations,
        lower::lower_plan,
        metrics::{RowCounts, WorkingSetResult, rows_copied},
        output::check_output_location,
        sources::read_sources,
        util::explain_plan,
    },
    query::working_set_plan,
    s3::ObjectStoreFactory,
};
use datafusion::{
    error::DataFusionError,
    physical_plan::{accept, collect, displayable},
    prelude::{DataFrame, SessionContext},
};
use log::info;
use std::sync::Arc;

/// Computes the working set and writes it to the configured output.
///
/// The object store factory must be able to produce an [`object_store::ObjectStore`] capable of
/// reading every input location and writing to the output location.
///
/// # Errors
/// If the output location is not empty, an input can't be read or parsed, or the
/// output can't be written.
pub async fn compute_working_set(
    store_factory: &ObjectStoreFactory,
    config: &WorkingSetConfig,
    context: &WorkingSetContext,
) -> Result<WorkingSetResult, DataFusionError> {
    let ops = WorkingSetOperations::new(config);
    info!("DataFusion working set: {ops}");

    let output_store = store_factory
        .get_object_store(config.output())
        .map_err(|e| DataFusionError::External(e.into()))?;
    check_output_location(output_store.as_ref(), config.output()).await?;

    let frame = build_working_set_dataframe(&ops, config, context, store_factory).await?;

    if config.explain_plans() {
        explain_plan(&frame).await?;
    }

    let result = execute_working_set_plan(&ops, frame).await?;
    result.log_metrics();
    Ok(result)
}

/// Creates the dataframe that reads the sources, runs the query and writes the output.
async fn build_working_set_dataframe(
    ops: &WorkingSetOperations<'_>,
    config: &WorkingSetConfig,
    context: &WorkingSetContext,
    store_factory: &ObjectStoreFactory,
) -> Result<DataFrame, DataFusionError> {
    let sf = ops.apply_config(context.session_config())?;
    let ctx = ops.configure_context(
        SessionContext::new_with_config_rt(sf, context.runtime()),
        store_factory,
    )?;
    let plan = working_set_plan();
    info!("Working set plan:\n{plan}");
    let sources = read_sources(&ctx, config).await?;
    let frame = lower_plan(&plan, &sources)?;
    let configurer = ParquetWriterConfigurer {
        parquet_options: config.parquet_options(),
    };
    ops.plan_with_parquet_output(frame, &configurer)
}

/// Runs the plan in the frame, then collects row counts from the executed plan.
async fn execute_working_set_plan(
    ops: &WorkingSetOperations<'_>,
    frame: DataFrame,
) -> Result<WorkingSetResult, DataFusionError> {
    let task_ctx = Arc::new(frame.task_ctx());
    let physical_plan = ops.to_physical_plan(frame).await?;
    info!(
        "Physical plan\n{}",
        displayable(&*physical_plan).indent(true)
    );
    let batches = collect(physical_plan.clone(), task_ctx).await?;
    let mut counts = RowCounts::default();
    accept(physical_plan.as_ref(), &mut counts)?;
    Ok(WorkingSetResult::from((&counts, rows_copied(&batches))))
}
