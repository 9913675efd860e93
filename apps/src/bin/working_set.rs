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
use apps::location_to_url;
use chrono::Local;
use clap::Parser;
use env_logger::Env;
use human_panic::setup_panic;
use log::info;
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::Write;
use working_set::{DEFAULT_OUTPUT, WorkingSetConfigBuilder, WorkingSetContext, run_working_set};

/// Computes the daily working set of successful jobs.
///
/// Job reports are joined with the file, block and dataset catalogue dumps and grouped by day,
/// submission tool, input campaign, data tier and site. Each group lists the distinct blocks
/// read, with total CPU and wall clock time and the number of jobs. The result is written as a
/// Parquet table, and the output location must be empty or absent.
#[derive(Parser, Debug)]
#[command(author, version)]
struct CmdLineArgs {
    /// Output location for the Parquet table, as a URL or filesystem path.
    ///
    /// The default is a local path standing in for the cluster's HDFS location
    /// `hdfs://analytix/user/ncsmith/working_set_day`; HDFS is not supported directly.
    #[arg(long = "out", value_name = "OUTPUT", default_value = DEFAULT_OUTPUT)]
    out: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> color_eyre::Result<()> {
    // Install coloured errors
    color_eyre::install()?;

    // Install human readable panics
    setup_panic!();

    // Install and configure environment logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}:{} - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.file().unwrap_or("??"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(false)
        .init();

    let args = CmdLineArgs::parse();

    let output = location_to_url(&args.out)?;
    let config = WorkingSetConfigBuilder::new().output(output).build()?;
    info!("Writing working set to {}", config.output());

    let result = run_working_set(&config, &WorkingSetContext::new()).await?;
    println!(
        "{} {} groups from {} jobs to {}",
        "Wrote".green().bold(),
        result.rows_written.to_formatted_string(&Locale::en),
        result.joined_jobs.to_formatted_string(&Locale::en),
        config.output()
    );
    if result.dropped_jobs() > 0 {
        println!(
            "{} {} successful jobs had no catalogue match",
            "Skipped".yellow().bold(),
            result.dropped_jobs().to_formatted_string(&Locale::en)
        );
    }

    Ok(())
}
