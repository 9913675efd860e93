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
use color_eyre::eyre::Error;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::fs;
use test_log::test;

use working_set_helpers::*;

const FILE_A: &str = "/store/data/Run2017/a.root";
const FILE_B: &str = "/store/data/Run2017/b.root";
const FILE_C: &str = "/store/mc/Summer17/c.root";

/// Three files: A in block 10, B in block 30, both of dataset 1; C in block 20 of dataset 2.
fn catalogue() -> Catalogue {
    Catalogue::default()
        .file(1, FILE_A, 1, 10)
        .file(2, FILE_B, 1, 30)
        .file(3, FILE_C, 2, 20)
        .block(10, 1)
        .block(20, 2)
        .block(30, 1)
        .dataset(1, "/SingleMuon/Run2017B-PromptReco-v1/AOD", 3)
        .dataset(2, "/TTJets/Summer17-v1/MINIAODSIM", 7)
}

fn fixture_with(jobs: &[JobReport]) -> Result<Fixture, Error> {
    let fixture = Fixture::new()?;
    fixture.write_catalogue(&catalogue())?;
    fixture.write_jobs("part-0.parquet", jobs)?;
    Ok(fixture)
}

fn row(campaign: &str, tier: i32, blocks: Vec<i64>, cpu: f64, wc: f64, njobs: i64) -> OutputRow {
    OutputRow {
        day: EXIT_DAY,
        submission_tool: Some("crab3".to_owned()),
        input_campaign: Some(campaign.to_owned()),
        data_tier_id: Some(tier),
        site_name: Some("T2_CH_CERN".to_owned()),
        blocks,
        sum_wrap_cpu: cpu,
        sum_wrap_wc: wc,
        njobs,
    }
}

#[test(tokio::test)]
async fn should_aggregate_single_job() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[job(FILE_A, EXIT_TIME)])?;

    // When
    let result = fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10], 10.0, 20.0, 1)]
    );
    assert_eq!(result.rows_written, 1);
    Ok(())
}

#[test(tokio::test)]
async fn should_exclude_failed_and_unfinished_jobs() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[
        job(FILE_A, EXIT_TIME),
        job(FILE_A, EXIT_TIME).exit_code(8021),
        job(FILE_A, 0),
        job(FILE_A, -1),
    ])?;

    // When
    let result = fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10], 10.0, 20.0, 1)]
    );
    assert_eq!(result.qualifying_jobs, 1);
    Ok(())
}

#[test(tokio::test)]
async fn should_collapse_double_separators_before_joining() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[job("/store//data/Run2017//a.root", EXIT_TIME)])?;

    // When
    fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10], 10.0, 20.0, 1)]
    );
    Ok(())
}

#[test(tokio::test)]
async fn should_replace_separators_in_single_pass() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[
        job("/store///data/Run2017/a.root", EXIT_TIME),
        job(FILE_B, EXIT_TIME),
    ])?;

    // When
    let result = fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![30], 10.0, 20.0, 1)]
    );
    assert_eq!(result.qualifying_jobs, 2);
    assert_eq!(result.joined_jobs, 1);
    Ok(())
}

#[test(tokio::test)]
async fn should_drop_jobs_without_catalogue_entries() -> Result<(), Error> {
    // Given
    let fixture = Fixture::new()?;
    fixture.write_catalogue(
        &catalogue()
            // Block missing from the blocks dump
            .file(4, "/store/data/orphan_block.root", 1, 99)
            // Dataset missing from the datasets dump
            .file(5, "/store/data/orphan_dataset.root", 98, 10),
    )?;
    fixture.write_jobs(
        "part-0.parquet",
        &[
            job(FILE_A, EXIT_TIME),
            job("/store/unknown.root", EXIT_TIME),
            job("/store/data/orphan_block.root", EXIT_TIME),
            job("/store/data/orphan_dataset.root", EXIT_TIME),
        ],
    )?;

    // When
    let result = fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10], 10.0, 20.0, 1)]
    );
    assert_eq!(result.qualifying_jobs, 4);
    assert_eq!(result.joined_jobs, 1);
    assert_eq!(result.dropped_jobs(), 3);
    Ok(())
}

#[test(tokio::test)]
async fn should_collect_distinct_blocks_and_sum_times() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[
        job(FILE_B, EXIT_TIME).times(1.0, 2.0),
        job(FILE_A, EXIT_TIME + 1000).times(3.0, 4.0),
        job(FILE_B, EXIT_TIME + 2000).times(5.0, 6.0),
    ])?;

    // When
    fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10, 30], 9.0, 12.0, 3)]
    );
    Ok(())
}

#[test(tokio::test)]
async fn should_split_groups_by_every_key_column() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[
        job(FILE_A, EXIT_TIME),
        job(FILE_A, EXIT_TIME).site("T1_US_FNAL"),
        job(FILE_A, EXIT_TIME).tool("wmagent"),
        job(FILE_C, EXIT_TIME),
    ])?;

    // When
    fixture.run("out").await?;

    // Then
    let rows = fixture.read_output("out")?;
    let mut fnal = row("Run2017B", 3, vec![10], 10.0, 20.0, 1);
    fnal.site_name = Some("T1_US_FNAL".to_owned());
    let mut wmagent = row("Run2017B", 3, vec![10], 10.0, 20.0, 1);
    wmagent.submission_tool = Some("wmagent".to_owned());
    assert_eq!(
        rows,
        vec![
            fnal,
            row("Run2017B", 3, vec![10], 10.0, 20.0, 1),
            row("Summer17", 7, vec![20], 10.0, 20.0, 1),
            wmagent,
        ]
    );
    Ok(())
}

#[test(tokio::test)]
async fn should_truncate_exit_time_to_utc_day() -> Result<(), Error> {
    // Given
    let start_of_day = EXIT_DAY * 1000;
    let fixture = fixture_with(&[
        job(FILE_A, start_of_day),
        job(FILE_A, start_of_day + 86_399_999),
        job(FILE_A, start_of_day + 86_400_000),
    ])?;

    // When
    fixture.run("out").await?;

    // Then
    let mut next_day = row("Run2017B", 3, vec![10], 10.0, 20.0, 1);
    next_day.day = EXIT_DAY + 86_400;
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10], 20.0, 40.0, 2), next_day]
    );
    Ok(())
}

#[test(tokio::test)]
async fn should_use_empty_campaign_when_dataset_name_does_not_match() -> Result<(), Error> {
    // Given
    let fixture = Fixture::new()?;
    fixture.write_catalogue(
        &Catalogue::default()
            .file(1, FILE_A, 1, 10)
            .block(10, 1)
            .dataset(1, "/NoCampaignHere/AOD", 3),
    )?;
    fixture.write_jobs("part-0.parquet", &[job(FILE_A, EXIT_TIME)])?;

    // When
    fixture.run("out").await?;

    // Then
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("", 3, vec![10], 10.0, 20.0, 1)]
    );
    Ok(())
}

#[test(tokio::test)]
async fn should_read_literal_null_as_null() -> Result<(), Error> {
    // Given
    let fixture = Fixture::new()?;
    fixture.write_catalogue(
        &Catalogue::default()
            .file(1, FILE_A, 1, 10)
            .block(10, 1)
            .raw_dataset_line(
                "1,/SingleMuon/Run2017B-PromptReco-v1/AOD,1,11,12,null,1,3,4,null,null,null,\
                 1483900000,/DC=ch/CN=user,1483900000,/DC=ch/CN=user",
            ),
    )?;
    fixture.write_jobs("part-0.parquet", &[job(FILE_A, EXIT_TIME)])?;

    // When
    fixture.run("out").await?;

    // Then
    let mut expected = row("Run2017B", 3, vec![10], 10.0, 20.0, 1);
    expected.data_tier_id = None;
    assert_eq!(fixture.read_output("out")?, vec![expected]);
    Ok(())
}

#[test(tokio::test)]
async fn should_not_depend_on_input_order() -> Result<(), Error> {
    // Given
    let mut jobs = Vec::new();
    for i in 0..60_u32 {
        let file = [FILE_A, FILE_B, FILE_C][i as usize % 3];
        let site = ["T2_CH_CERN", "T1_US_FNAL"][i as usize % 2];
        jobs.push(
            job(file, EXIT_TIME + i64::from(i) * 3_600_000)
                .site(site)
                .times(f64::from(i), f64::from(2 * i)),
        );
    }
    let mut shuffled = jobs.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(7));
    let fixture = Fixture::new()?;
    fixture.write_catalogue(&catalogue())?;
    fixture.write_jobs("part-0.parquet", &jobs[..30])?;
    fixture.write_jobs("part-1.parquet", &jobs[30..])?;
    let shuffled_fixture = Fixture::new()?;
    shuffled_fixture.write_catalogue(&catalogue())?;
    shuffled_fixture.write_jobs("part-0.parquet", &shuffled)?;

    // When
    fixture.run("out").await?;
    shuffled_fixture.run("out").await?;

    // Then
    let rows = fixture.read_output("out")?;
    assert!(!rows.is_empty());
    assert_eq!(rows, shuffled_fixture.read_output("out")?);
    assert_eq!(rows.iter().map(|r| r.njobs).sum::<i64>(), 60);
    Ok(())
}

#[test(tokio::test)]
async fn should_give_same_output_on_rerun() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[
        job(FILE_A, EXIT_TIME),
        job(FILE_B, EXIT_TIME).times(2.0, 3.0),
        job(FILE_C, EXIT_TIME + 86_400_000),
    ])?;

    // When
    fixture.run("first").await?;
    fixture.run("second").await?;

    // Then
    assert_eq!(fixture.read_output("first")?, fixture.read_output("second")?);
    Ok(())
}

#[test(tokio::test)]
async fn should_refuse_non_empty_output() -> Result<(), Error> {
    // Given
    let fixture = fixture_with(&[job(FILE_A, EXIT_TIME)])?;
    fs::create_dir_all(fixture.path("out"))?;
    fs::write(fixture.path("out").join("previous.parquet"), b"old")?;

    // When
    let result = fixture.run("out").await;

    // Then
    let message = result.expect_err("Run should fail").to_string();
    assert!(message.contains("is not empty"), "{message}");
    assert_eq!(fs::read(fixture.path("out").join("previous.parquet"))?, b"old");
    Ok(())
}

#[test(tokio::test)]
async fn should_fail_on_malformed_catalogue_row() -> Result<(), Error> {
    // Given
    let fixture = Fixture::new()?;
    fixture.write_catalogue(
        &catalogue().raw_file_line("not_a_number,/store/bad.root,1"),
    )?;
    fixture.write_jobs("part-0.parquet", &[job(FILE_A, EXIT_TIME)])?;

    // When
    let result = fixture.run("out").await;

    // Then
    assert!(result.is_err());
    Ok(())
}

#[test(tokio::test)]
async fn should_read_partitioned_avro_job_reports() -> Result<(), Error> {
    // Given
    let fixture = Fixture::new()?;
    fixture.write_catalogue(&catalogue())?;
    fixture.write_avro_jobs(
        "year=2017/month=1/day=2",
        &[
            job(FILE_A, EXIT_TIME),
            job(FILE_B, EXIT_TIME),
            job(FILE_A, EXIT_TIME).exit_code(1),
        ],
        2,
    )?;
    fixture.write_avro_jobs(
        "year=2017/month=1/day=3",
        &[job(FILE_C, EXIT_TIME + 86_400_000)],
        0,
    )?;
    fixture.write_avro_jobs("year=2015/month=1/day=2", &[job(FILE_A, EXIT_TIME)], 0)?;

    // When
    let result = fixture.run_with(fixture.avro_config("out")).await?;

    // Then
    let next_day = OutputRow {
        day: EXIT_DAY + 86_400,
        ..row("Summer17", 7, vec![20], 10.0, 20.0, 1)
    };
    assert_eq!(
        fixture.read_output("out")?,
        vec![row("Run2017B", 3, vec![10, 30], 20.0, 40.0, 2), next_day]
    );
    assert_eq!(result.qualifying_jobs, 3);
    assert_eq!(result.joined_jobs, 3);
    assert_eq!(result.rows_written, 2);
    Ok(())
}
