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
    datafusion::{
        OutputParquetOptions,
        config::{COMPRESSION_CODECS, WRITER_VERSIONS},
    },
    s3::{ObjectStoreFactory, config_for_s3_module, default_creds_store},
};
use aws_config::Region;
use aws_credential_types::Credentials;
use log::debug;
use object_store::aws::AmazonS3Builder;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use url::Url;

/// Default location of the job reports, one directory per day.
pub const DEFAULT_JOB_REPORTS: &str =
    "/project/awg/cms/jm-data-popularity/avro-snappy/year=201[678]/month=*/day=*/*.avro";
/// Default location of the catalogue `FILES` dump.
pub const DEFAULT_FILES: &str = "/project/awg/cms/CMS_DBS3_PROD_GLOBAL/current/FILES/part-m-00000";
/// Default location of the catalogue `BLOCKS` dump.
pub const DEFAULT_BLOCKS: &str =
    "/project/awg/cms/CMS_DBS3_PROD_GLOBAL/current/BLOCKS/part-m-00000";
/// Default location of the catalogue `DATASETS` dump.
pub const DEFAULT_DATASETS: &str =
    "/project/awg/cms/CMS_DBS3_PROD_GLOBAL/current/DATASETS/part-m-00000";

/// Invalid working set configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No output location supplied")]
    NoOutput,
    #[error("No {0} location supplied")]
    EmptyLocation(&'static str),
    #[error("{table} location {location} is neither a URL nor an absolute path")]
    RelativeLocation {
        table: &'static str,
        location: String,
    },
    #[error("Unknown compression {0}, valid values: {valid}", valid = COMPRESSION_CODECS.join(", "))]
    UnknownCompression(String),
    #[error("Parquet writer version invalid {0}, valid values: {valid}", valid = WRITER_VERSIONS.join(", "))]
    UnknownWriterVersion(String),
}

/// Storage format of the job reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum JobReportFormat {
    #[default]
    Avro,
    Parquet,
}

impl Display for JobReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Avro => write!(f, "Avro"),
            Self::Parquet => write!(f, "Parquet"),
        }
    }
}

/// Everything needed to run one working set computation.
///
/// Input locations are URLs or absolute paths. Paths may contain glob patterns.
#[derive(Debug)]
pub struct WorkingSetConfig {
    /// Aws credentials configuration
    aws_config: Option<AwsConfig>,
    job_reports: String,
    job_report_format: JobReportFormat,
    files: String,
    blocks: String,
    datasets: String,
    output: Url,
    parquet_options: OutputParquetOptions,
    /// Log the `DataFusion` logical plan before running
    explain_plans: bool,
}

impl WorkingSetConfig {
    #[must_use]
    pub fn aws_config(&self) -> Option<&AwsConfig> {
        self.aws_config.as_ref()
    }

    #[must_use]
    pub fn job_reports(&self) -> &str {
        &self.job_reports
    }

    #[must_use]
    pub fn job_report_format(&self) -> JobReportFormat {
        self.job_report_format
    }

    #[must_use]
    pub fn files(&self) -> &str {
        &self.files
    }

    #[must_use]
    pub fn blocks(&self) -> &str {
        &self.blocks
    }

    #[must_use]
    pub fn datasets(&self) -> &str {
        &self.datasets
    }

    #[must_use]
    pub fn output(&self) -> &Url {
        &self.output
    }

    #[must_use]
    pub fn parquet_options(&self) -> &OutputParquetOptions {
        &self.parquet_options
    }

    #[must_use]
    pub fn explain_plans(&self) -> bool {
        self.explain_plans
    }

    /// All input locations.
    #[must_use]
    pub fn input_locations(&self) -> [&str; 4] {
        [&self.job_reports, &self.files, &self.blocks, &self.datasets]
    }

    fn uses_s3(&self) -> bool {
        self.output.scheme() == "s3" || self.input_locations().iter().any(|l| l.starts_with("s3://"))
    }

    /// Create a store factory able to reach every configured location.
    ///
    /// AWS credentials are only loaded if a location is in S3. Without an explicit
    /// [`AwsConfig`] the default provider chain is used.
    pub(crate) async fn create_object_store_factory(&self) -> ObjectStoreFactory {
        let s3_config = if self.uses_s3() {
            match &self.aws_config {
                Some(aws_config) => Some(aws_config.to_s3_config()),
                None => default_creds_store().await.ok(),
            }
        } else {
            None
        };
        ObjectStoreFactory::new(s3_config)
    }
}

impl Display for WorkingSetConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "job reports {:?} ({}), files {:?}, blocks {:?}, datasets {:?}, output {:?}",
            self.job_reports,
            self.job_report_format,
            self.files,
            self.blocks,
            self.datasets,
            self.output.as_str()
        )
    }
}

/// Builder for [`WorkingSetConfig`].
///
/// Input locations start at the production defaults. An output location must be given.
pub struct WorkingSetConfigBuilder {
    aws_config: Option<AwsConfig>,
    job_reports: String,
    job_report_format: JobReportFormat,
    files: String,
    blocks: String,
    datasets: String,
    output: Option<Url>,
    parquet_options: OutputParquetOptions,
    explain_plans: bool,
}

impl Default for WorkingSetConfigBuilder {
    fn default() -> Self {
        Self {
            aws_config: None,
            job_reports: DEFAULT_JOB_REPORTS.into(),
            job_report_format: JobReportFormat::default(),
            files: DEFAULT_FILES.into(),
            blocks: DEFAULT_BLOCKS.into(),
            datasets: DEFAULT_DATASETS.into(),
            output: None,
            parquet_options: OutputParquetOptions::default(),
            explain_plans: false,
        }
    }
}

impl WorkingSetConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn aws_config(mut self, aws_config: Option<AwsConfig>) -> Self {
        self.aws_config = aws_config;
        self
    }

    #[must_use]
    pub fn job_reports(mut self, job_reports: impl Into<String>) -> Self {
        self.job_reports = job_reports.into();
        self
    }

    #[must_use]
    pub fn job_report_format(mut self, job_report_format: JobReportFormat) -> Self {
        self.job_report_format = job_report_format;
        self
    }

    #[must_use]
    pub fn files(mut self, files: impl Into<String>) -> Self {
        self.files = files.into();
        self
    }

    #[must_use]
    pub fn blocks(mut self, blocks: impl Into<String>) -> Self {
        self.blocks = blocks.into();
        self
    }

    #[must_use]
    pub fn datasets(mut self, datasets: impl Into<String>) -> Self {
        self.datasets = datasets.into();
        self
    }

    #[must_use]
    pub fn output(mut self, output: Url) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn parquet_options(mut self, parquet_options: OutputParquetOptions) -> Self {
        self.parquet_options = parquet_options;
        self
    }

    #[must_use]
    pub fn explain_plans(mut self, explain_plans: bool) -> Self {
        self.explain_plans = explain_plans;
        self
    }

    /// Build the [`WorkingSetConfig`], consuming the builder and validating it.
    ///
    /// # Errors
    /// An output location is required. Input locations must be non-empty URLs or
    /// absolute paths. Parquet compression and writer version must be recognised.
    pub fn build(mut self) -> Result<WorkingSetConfig, ConfigError> {
        self.validate()?;
        self.normalise_s3a_urls();
        let output = self.output.ok_or(ConfigError::NoOutput)?;
        debug!("Parquet output options {:?}", self.parquet_options);

        Ok(WorkingSetConfig {
            aws_config: self.aws_config,
            job_reports: self.job_reports,
            job_report_format: self.job_report_format,
            files: self.files,
            blocks: self.blocks,
            datasets: self.datasets,
            output,
            parquet_options: self.parquet_options,
            explain_plans: self.explain_plans,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.output.is_none() {
            return Err(ConfigError::NoOutput);
        }
        for (table, location) in [
            ("job reports", &self.job_reports),
            ("files", &self.files),
            ("blocks", &self.blocks),
            ("datasets", &self.datasets),
        ] {
            if location.is_empty() {
                return Err(ConfigError::EmptyLocation(table));
            }
            if !std::path::Path::new(location).is_absolute() && Url::parse(location).is_err() {
                return Err(ConfigError::RelativeLocation {
                    table,
                    location: location.clone(),
                });
            }
        }
        let compression = self.parquet_options.compression.to_lowercase();
        if !COMPRESSION_CODECS.contains(&compression.as_str()) {
            return Err(ConfigError::UnknownCompression(
                self.parquet_options.compression.clone(),
            ));
        }
        let version = self.parquet_options.writer_version.to_lowercase();
        if !WRITER_VERSIONS.contains(&version.as_str()) {
            return Err(ConfigError::UnknownWriterVersion(
                self.parquet_options.writer_version.clone(),
            ));
        }
        Ok(())
    }

    /// Change all input and output locations from s3a to s3 scheme.
    fn normalise_s3a_urls(&mut self) {
        for location in [
            &mut self.job_reports,
            &mut self.files,
            &mut self.blocks,
            &mut self.datasets,
        ] {
            if let Some(rest) = location.strip_prefix("s3a://") {
                *location = format!("s3://{rest}");
            }
        }
        if let Some(output) = &mut self.output
            && output.scheme() == "s3a"
        {
            let _ = output.set_scheme("s3");
        }
    }
}

#[derive(Debug)]
pub struct AwsConfig {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    pub allow_http: bool,
}

impl AwsConfig {
    /// Create an [`AmazonS3Builder`] from the given configuration object.
    #[must_use]
    fn to_s3_config(&self) -> AmazonS3Builder {
        let creds = Credentials::from_keys(
            &self.access_key,
            &self.secret_key,
            self.session_token.clone(),
        );
        let region = Region::new(String::from(&self.region));
        let mut builder = config_for_s3_module(&creds, &region);
        if !self.endpoint.is_empty() {
            builder = builder.with_endpoint(&self.endpoint);
        }
        builder.with_allow_http(self.allow_http)
    }
}
