//! The working set query.
//!
//! Successful jobs are joined through the file and block catalogue to their dataset, then
//! grouped by day, submission tool, campaign, data tier and site. Each group records the
//! distinct blocks read, total CPU and wall clock time, and the number of jobs.
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
    plan::{
        PlanBuilder, PlanNode, SourceTable,
        expr::{Expr, collect_set, column, count_rows, lit_int, sum},
    },
    schemas::{
        B_BLOCK_ID, D_DATA_TIER_ID, D_DATASET, D_DATASET_ID, DAY, EXIT_CODE, EXIT_TIMESTAMP,
        F_BLOCK_ID, F_DATASET_ID, F_LOGICAL_FILE_NAME, FILE_NAME, GROUP_COLUMNS, INPUT_CAMPAIGN,
        JOB_REPORT_COLUMNS, NJOBS, SUM_WRAP_CPU, SUM_WRAP_WC, WORKING_SET_BLOCKS, WRAP_CPU,
        WRAP_WC,
    },
};

/// Milliseconds in a UTC day.
pub const DAY_MILLIS: i64 = 86_400_000;

/// Matches the campaign token of a dataset name, e.g. `RunIISummer20` in
/// `/Primary/RunIISummer20-v1/AODSIM`. Word characters are ASCII only.
pub const CAMPAIGN_PATTERN: &str = r"^/[^/]*/((?-u:\w)+)-";

/// Jobs that finished with a recorded exit time and a zero exit code.
#[must_use]
pub fn successful_job() -> Expr {
    column(EXIT_TIMESTAMP)
        .gt(lit_int(0))
        .and(column(EXIT_CODE).equals(lit_int(0)))
}

/// File name with each `//` replaced by `/` in a single left to right pass.
#[must_use]
pub fn normalised_file_name() -> Expr {
    column(FILE_NAME).replace("//", "/")
}

/// Exit timestamp truncated to the start of its UTC day, in seconds.
#[must_use]
pub fn day_of_exit() -> Expr {
    (column(EXIT_TIMESTAMP) - column(EXIT_TIMESTAMP) % lit_int(DAY_MILLIS)) / lit_int(1000)
}

/// Campaign token of the dataset name, or an empty string if there isn't one.
#[must_use]
pub fn input_campaign() -> Expr {
    column(D_DATASET).regexp_extract(CAMPAIGN_PATTERN, 1)
}

/// Builds the complete working set plan over the four source tables.
#[must_use]
pub fn working_set_plan() -> PlanNode {
    let files = PlanBuilder::scan(SourceTable::Files).select([
        F_LOGICAL_FILE_NAME,
        F_BLOCK_ID,
        F_DATASET_ID,
    ]);
    let blocks = PlanBuilder::scan(SourceTable::Blocks).select([B_BLOCK_ID]);
    let datasets =
        PlanBuilder::scan(SourceTable::Datasets).select([D_DATASET_ID, D_DATASET, D_DATA_TIER_ID]);

    PlanBuilder::scan(SourceTable::JobReports)
        .select(JOB_REPORT_COLUMNS)
        .filter(successful_job())
        .with_column(FILE_NAME, normalised_file_name())
        .join(files, FILE_NAME, F_LOGICAL_FILE_NAME)
        .join(blocks, F_BLOCK_ID, B_BLOCK_ID)
        .join(datasets, F_DATASET_ID, D_DATASET_ID)
        .with_column(DAY, day_of_exit())
        .with_column(INPUT_CAMPAIGN, input_campaign())
        .aggregate(
            GROUP_COLUMNS,
            vec![
                collect_set(B_BLOCK_ID).alias(WORKING_SET_BLOCKS),
                sum(WRAP_CPU).alias(SUM_WRAP_CPU),
                sum(WRAP_WC).alias(SUM_WRAP_WC),
                count_rows().alias(NJOBS),
            ],
        )
        .build()
}
