//! Working set `DataFusion` utility functions.
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
use crate::s3::ObjectStoreFactory;
use arrow::util::pretty::pretty_format_batches;
use datafusion::{
    dataframe::DataFrame, error::DataFusionError, execution::SessionStateBuilder,
    prelude::SessionContext,
};
use log::{debug, info};
use url::Url;

/// Write explanation of logical query plan to log output.
///
/// # Errors
/// If explanation fails.
pub async fn explain_plan(frame: &DataFrame) -> Result<(), DataFusionError> {
    let mut config = frame.task_ctx().session_config().clone();
    // Ensure physical plan output is disabled
    config.options_mut().explain.logical_plan_only = true;
    let explained = DataFrame::new(
        SessionStateBuilder::new_with_default_features()
            .with_config(config)
            .build(),
        frame.logical_plan().clone(),
    )
    .explain(false, false)?
    .collect()
    .await?;
    info!("DataFusion plan:\n{}", pretty_format_batches(&explained)?);
    Ok(())
}

/// The URL naming the store that holds a location.
///
/// Locations that aren't URLs are local paths, held by the `file` store.
///
/// # Errors
/// If a location looks like a URL but can't be parsed.
pub fn location_url(location: &str) -> Result<Url, DataFusionError> {
    if std::path::Path::new(location).is_absolute() {
        return Url::parse("file:///").map_err(|e| DataFusionError::External(Box::new(e)));
    }
    Url::parse(location).map_err(|e| DataFusionError::External(Box::new(e)))
}

/// Registers the appropriate [`object_store::ObjectStore`] for each location with the
/// context's runtime.
///
/// # Errors
/// If we can't create an [`object_store::ObjectStore`] for a location.
pub fn register_store<'a>(
    store_factory: &ObjectStoreFactory,
    locations: impl IntoIterator<Item = &'a Url>,
    ctx: &SessionContext,
) -> Result<(), DataFusionError> {
    for location in locations {
        let store = store_factory
            .get_object_store(location)
            .map_err(|e| DataFusionError::External(e.into()))?;
        debug!("Registering object store for {location}");
        ctx.runtime_env().register_object_store(location, store);
    }
    Ok(())
}
