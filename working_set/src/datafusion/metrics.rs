//! Module for collecting and logging row counts from an executed physical plan.
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
use arrow::{array::AsArray, datatypes::UInt64Type, record_batch::RecordBatch};
use datafusion::{
    error::DataFusionError,
    physical_plan::{
        ExecutionPlan, ExecutionPlanVisitor,
        filter::FilterExec,
        joins::{HashJoinExec, SortMergeJoinExec},
    },
};
use log::{info, warn};
use num_format::{Locale, ToFormattedString};

/// Row counts of a completed working set run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkingSetResult {
    /// Job reports passing the success filter.
    pub qualifying_jobs: usize,
    /// Rows leaving the last join, i.e. qualifying jobs with a known file, block and dataset.
    pub joined_jobs: usize,
    /// Groups written to the output.
    pub rows_written: usize,
}

impl WorkingSetResult {
    /// Qualifying jobs removed by the join chain.
    #[must_use]
    pub fn dropped_jobs(&self) -> usize {
        self.qualifying_jobs.saturating_sub(self.joined_jobs)
    }

    /// Log the counts, warning if any qualifying jobs were dropped.
    pub fn log_metrics(&self) {
        info!(
            "Working set: {} qualifying jobs, {} joined, {} rows written",
            self.qualifying_jobs.to_formatted_string(&Locale::en),
            self.joined_jobs.to_formatted_string(&Locale::en),
            self.rows_written.to_formatted_string(&Locale::en)
        );
        if self.dropped_jobs() > 0 {
            warn!(
                "{} qualifying jobs had no matching file, block or dataset and were excluded",
                self.dropped_jobs().to_formatted_string(&Locale::en)
            );
        }
    }
}

/// Visits an executed plan recording the rows leaving the filter and the outermost join.
#[derive(Debug, Default)]
pub struct RowCounts {
    pub filtered_rows: Option<usize>,
    pub joined_rows: Option<usize>,
}

impl ExecutionPlanVisitor for RowCounts {
    type Error = DataFusionError;

    fn pre_visit(&mut self, plan: &dyn ExecutionPlan) -> Result<bool, Self::Error> {
        let any = plan.as_any();
        // Pre-order visiting finds the outermost join first
        if self.joined_rows.is_none()
            && (any.downcast_ref::<HashJoinExec>().is_some()
                || any.downcast_ref::<SortMergeJoinExec>().is_some())
        {
            self.joined_rows = plan.metrics().and_then(|m| m.output_rows());
        }
        if self.filtered_rows.is_none() && any.downcast_ref::<FilterExec>().is_some() {
            self.filtered_rows = plan.metrics().and_then(|m| m.output_rows());
        }
        Ok(true)
    }
}

/// Sum the `count` column of the batches returned by a `COPY` plan.
#[must_use]
pub fn rows_copied(batches: &[RecordBatch]) -> usize {
    batches
        .iter()
        .filter_map(|b| b.column_by_name("count"))
        .filter_map(|c| c.as_primitive_opt::<UInt64Type>())
        .flat_map(|c| c.iter().flatten())
        .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
        .sum()
}

impl From<(&RowCounts, usize)> for WorkingSetResult {
    fn from((counts, rows_written): (&RowCounts, usize)) -> Self {
        Self {
            qualifying_jobs: counts.filtered_rows.unwrap_or_default(),
            joined_jobs: counts.joined_rows.unwrap_or_default(),
            rows_written,
        }
    }
}
