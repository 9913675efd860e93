//! Fixed layouts of the input tables.
//!
//! The reference tables are header-less dumps of the data bookkeeping catalogue, so the
//! column order here must match the order of fields in each dump line exactly.
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
use arrow::datatypes::{DataType, Field, Schema};

// Job report fields
pub const FILE_NAME: &str = "FileName";
pub const EXIT_TIMESTAMP: &str = "JobExecExitTimeStamp";
pub const EXIT_CODE: &str = "JobExecExitCode";
pub const SUBMISSION_TOOL: &str = "SubmissionTool";
pub const SITE_NAME: &str = "SiteName";
pub const WRAP_CPU: &str = "WrapCPU";
pub const WRAP_WC: &str = "WrapWC";

/// Job report fields read by the working set query. All others are ignored.
pub const JOB_REPORT_COLUMNS: [&str; 7] = [
    FILE_NAME,
    EXIT_TIMESTAMP,
    EXIT_CODE,
    SUBMISSION_TOOL,
    SITE_NAME,
    WRAP_CPU,
    WRAP_WC,
];

// Reference table fields
pub const F_LOGICAL_FILE_NAME: &str = "f_logical_file_name";
pub const F_BLOCK_ID: &str = "f_block_id";
pub const F_DATASET_ID: &str = "f_dataset_id";
pub const B_BLOCK_ID: &str = "b_block_id";
pub const D_DATASET_ID: &str = "d_dataset_id";
pub const D_DATASET: &str = "d_dataset";
pub const D_DATA_TIER_ID: &str = "d_data_tier_id";

// Derived and output fields
pub const DAY: &str = "day";
pub const INPUT_CAMPAIGN: &str = "input_campaign";
pub const WORKING_SET_BLOCKS: &str = "working_set_blocks";
pub const SUM_WRAP_CPU: &str = "sum_WrapCPU";
pub const SUM_WRAP_WC: &str = "sum_WrapWC";
pub const NJOBS: &str = "njobs";

/// Columns the output is grouped by, in output order.
pub const GROUP_COLUMNS: [&str; 5] = [DAY, SUBMISSION_TOOL, INPUT_CAMPAIGN, D_DATA_TIER_ID, SITE_NAME];

fn nullable(fields: &[(&str, DataType)]) -> Schema {
    Schema::new(
        fields
            .iter()
            .map(|(name, data_type)| Field::new(*name, data_type.clone(), true))
            .collect::<Vec<_>>(),
    )
}

/// Layout of the catalogue `FILES` dump.
#[must_use]
pub fn files_schema() -> Schema {
    nullable(&[
        ("f_file_id", DataType::Int64),
        (F_LOGICAL_FILE_NAME, DataType::Utf8),
        ("f_is_file_valid", DataType::Int32),
        (F_DATASET_ID, DataType::Int64),
        (F_BLOCK_ID, DataType::Int64),
        ("f_file_type_id", DataType::Int32),
        ("f_check_sum", DataType::Utf8),
        ("f_event_count", DataType::Int64),
        ("f_file_size", DataType::Int64),
        ("f_branch_hash_id", DataType::Int32),
        ("f_adler32", DataType::Utf8),
        ("f_md5", DataType::Utf8),
        ("f_auto_cross_section", DataType::Float64),
        ("f_creation_date", DataType::Float64),
        ("f_create_by", DataType::Utf8),
        ("f_last_modification_date", DataType::Float64),
        ("f_last_modified_by", DataType::Utf8),
    ])
}

/// Layout of the catalogue `BLOCKS` dump.
#[must_use]
pub fn blocks_schema() -> Schema {
    nullable(&[
        (B_BLOCK_ID, DataType::Int64),
        ("b_block_name", DataType::Utf8),
        ("b_dataset_id", DataType::Int64),
        ("b_open_for_writing", DataType::Int32),
        ("b_origin_site_name", DataType::Utf8),
        ("b_block_size", DataType::Int64),
        ("b_file_count", DataType::Int32),
        ("b_creation_date", DataType::Float64),
        ("b_create_by", DataType::Utf8),
        ("b_last_modification_date", DataType::Float64),
        ("b_last_modified_by", DataType::Utf8),
    ])
}

/// Layout of the catalogue `DATASETS` dump.
#[must_use]
pub fn datasets_schema() -> Schema {
    nullable(&[
        (D_DATASET_ID, DataType::Int64),
        (D_DATASET, DataType::Utf8),
        ("d_is_dataset_valid", DataType::Int32),
        ("d_primary_ds_id", DataType::Int32),
        ("d_processed_ds_id", DataType::Int32),
        (D_DATA_TIER_ID, DataType::Int32),
        ("d_dataset_access_type_id", DataType::Int32),
        ("d_acquisition_era_id", DataType::Int32),
        ("d_processing_era_id", DataType::Int32),
        ("d_physics_group_id", DataType::Int32),
        ("d_xtcrosssection", DataType::Float64),
        ("d_prep_id", DataType::Utf8),
        ("d_creation_date", DataType::Float64),
        ("d_create_by", DataType::Utf8),
        ("d_last_modification_date", DataType::Float64),
        ("d_last_modified_by", DataType::Utf8),
    ])
}
