use anyhow::Result;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

use kiddos_pipeline::constants::*;
use kiddos_pipeline::pipeline::JoinStrategy;
use kiddos_pipeline::query::rank_for_issue;
use kiddos_pipeline::{materialize, Axis, Pipeline, PipelineConfig};

const CATALOG: &str = "imdb_id\ttitle\tshort_desc\trelease_year\thbogo_url\tmovie_trailer_url\tage_child\tposter\tscores\n\
tt0100000\tThe Iron Giant\tA boy befriends a robot\t1999\t\t\tage 13+\tgiant.jpg\t{'Positive Messages': '4', 'Violence': '2'}\n\
tt0100001\tPaddington\tA bear in London\t2014.0\thttps://hbo.example/p\t\t\tpaddington.jpg\t{'Educational Value': 3, 'Consumerism': 9}\n\
tt0100002\t{title}\tScraper placeholder\t2001\t\t\t\tx.jpg\t{}\n\
tt0100003\tNo Poster\tMissing art\t2005\t\t\tage 5+\t\t{}\n";

fn write_inputs(root: &Path) -> Result<()> {
    fs::write(root.join(CATALOG_FILE), CATALOG)?;
    let scores = root.join(SCORE_DIR);
    fs::create_dir_all(&scores)?;
    fs::write(
        scores.join("Immigration.csv"),
        "imdb_id,inf_dist_summary\ntt0100001,0.25\n",
    )?;
    Ok(())
}

fn touch(path: &Path, secs_after_epoch: u64) -> Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))?;
    Ok(())
}

#[test]
fn test_second_run_is_served_from_cache() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;

    let first = materialize(dir.path(), DEFAULT_STEM, true)?;
    assert!(!first.from_cache);
    let bytes_after_first = fs::read(&first.location)?;

    let second = materialize(dir.path(), DEFAULT_STEM, true)?;
    assert!(second.from_cache);
    assert_eq!(second.key, first.key);
    assert_eq!(second.location, first.location);
    assert_eq!(second.table, first.table);
    assert_eq!(fs::read(&second.location)?, bytes_after_first);
    Ok(())
}

#[test]
fn test_input_change_forces_recompute() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    let score_file = dir.path().join(SCORE_DIR).join("Immigration.csv");
    touch(&score_file, 1_600_000_000)?;

    let first = materialize(dir.path(), DEFAULT_STEM, true)?;
    fs::write(&score_file, "imdb_id,inf_dist_summary\ntt0100000,0.5\n")?;
    touch(&score_file, 1_600_000_100)?;

    let second = materialize(dir.path(), DEFAULT_STEM, true)?;
    assert_ne!(second.key, first.key);
    assert!(!second.from_cache);
    assert_eq!(second.table.get(100000).unwrap().issue_score("score_Immigration"), Some(0.5));
    Ok(())
}

#[test]
fn test_disallowing_cache_rebuilds_same_table() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    let cached = materialize(dir.path(), DEFAULT_STEM, true)?;
    let rebuilt = materialize(dir.path(), DEFAULT_STEM, false)?;
    assert!(!rebuilt.from_cache);
    assert_eq!(rebuilt.table, cached.table);
    Ok(())
}

#[test]
fn test_derived_rows() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    let table = materialize(dir.path(), DEFAULT_STEM, true)?.table;

    // placeholder title and missing poster are dropped
    assert_eq!(table.len(), 2);
    assert!(table.get(100002).is_none());
    assert!(table.get(100003).is_none());
    assert_eq!(table.issue_columns, vec!["score_Immigration".to_string()]);

    let giant = table.get(100000).unwrap();
    assert_eq!(giant.age_number, 13);
    assert_eq!(giant.age_child, "age 13+");
    assert_eq!(giant.scores.get(Axis::Violence), 2);
    assert_eq!(giant.inverted_score(Axis::Violence), Some(4));
    assert_eq!(giant.non_zero_scores, 3);
    assert_eq!(giant.avg_score, 2.7);
    // absent from the score table
    assert_eq!(giant.issue_score("score_Immigration"), Some(0.0));
    assert_eq!(giant.hbo_url, DEFAULT_LINK_URL);

    let paddington = table.get(100001).unwrap();
    assert_eq!(paddington.original_release_year, 2014);
    assert_eq!(paddington.age_number, 0);
    assert_eq!(paddington.age_child, DEFAULT_AGE_LABEL);
    assert_eq!(paddington.scores.get(Axis::Consumerism), 0);
    assert_eq!(paddington.issue_score("score_Immigration"), Some(0.25));
    assert_eq!(paddington.hbo_url, "https://hbo.example/p");
    Ok(())
}

#[test]
fn test_colliding_topic_names_keep_first_file() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    let scores = dir.path().join(SCORE_DIR);
    fs::write(scores.join("Gun Control.csv"), "imdb_id,inf_dist_summary\ntt0100000,0.1\n")?;
    fs::write(scores.join("Gun-Control!!.csv"), "imdb_id,inf_dist_summary\ntt0100000,0.9\n")?;

    let table = materialize(dir.path(), DEFAULT_STEM, true)?.table;
    assert_eq!(
        table.issue_columns.iter().filter(|c| *c == "score_Gun_Control").count(),
        1
    );
    assert_eq!(table.get(100000).unwrap().issue_score("score_Gun_Control"), Some(0.1));
    Ok(())
}

#[test]
fn test_legacy_artifacts_are_evicted_on_rebuild() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    let legacy = dir.path().join(format!("{}.0badc0de.feather", DEFAULT_STEM));
    fs::write(&legacy, b"old")?;

    let fresh = materialize(dir.path(), DEFAULT_STEM, true)?;
    assert!(!legacy.exists());
    assert!(fresh.location.exists());

    // a cache hit leaves the directory alone
    fs::write(&legacy, b"old")?;
    let hit = materialize(dir.path(), DEFAULT_STEM, true)?;
    assert!(hit.from_cache);
    assert!(legacy.exists());
    Ok(())
}

#[test]
fn test_issue_matching_never_grows_the_catalog() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    fs::write(
        dir.path().join(ISSUE_MATCHING_FILE),
        "imdb_id,social_issue,match_score\n\
         tt0100000,Bullying,0.8\n\
         tt0100000,Immigration,0.2\n\
         tt0100001,Immigration,0.6\n\
         tt0999999,Immigration,0.6\n",
    )?;

    let config = PipelineConfig::new(dir.path()).with_join_strategy(JoinStrategy::IssueMatching);
    let materialized = Pipeline::new(config).materialize(DEFAULT_STEM, true)?;
    let table = materialized.table;
    assert!(table.len() <= 4);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(100000).unwrap().social_issue.as_deref(), Some("Bullying"));
    assert_eq!(table.get(100001).unwrap().match_score, Some(0.6));
    Ok(())
}

#[test]
fn test_missing_data_root_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(materialize(&missing, DEFAULT_STEM, true).is_err());
}

#[test]
fn test_join_strategies_keep_separate_caches() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    fs::write(
        dir.path().join(ISSUE_MATCHING_FILE),
        "imdb_id,social_issue,match_score\ntt0100000,Bullying,0.8\n",
    )?;
    let per_issue = PipelineConfig::new(dir.path());
    let matching = per_issue.clone().with_join_strategy(JoinStrategy::IssueMatching);

    let first = Pipeline::new(per_issue.clone()).materialize(DEFAULT_STEM, true)?;
    assert_eq!(first.table.len(), 2);

    let switched = Pipeline::new(matching.clone()).materialize(DEFAULT_STEM, true)?;
    assert!(!switched.from_cache);
    assert_ne!(switched.location, first.location);
    assert_eq!(switched.table, Pipeline::new(matching.clone()).build()?);
    assert_eq!(switched.table.len(), 1);
    assert_eq!(switched.table.rows[0].social_issue.as_deref(), Some("Bullying"));

    // both entries now live side by side
    let again = Pipeline::new(matching).materialize(DEFAULT_STEM, true)?;
    assert!(again.from_cache);
    assert_eq!(again.table, switched.table);
    let back = Pipeline::new(per_issue).materialize(DEFAULT_STEM, true)?;
    assert!(back.from_cache);
    assert_eq!(back.table, first.table);
    Ok(())
}

#[test]
fn test_exact_issue_match_ranks_first() -> Result<()> {
    let dir = tempdir()?;
    write_inputs(dir.path())?;
    fs::write(
        dir.path().join(SCORE_DIR).join("Bullying.csv"),
        "imdb_id,inf_dist_summary\ntt0100000,0.5\ntt0100001,0.0\n",
    )?;

    let table = materialize(dir.path(), DEFAULT_STEM, true)?.table;
    let ids: Vec<u64> = rank_for_issue(&table, "Bullying", 10)
        .iter()
        .map(|r| r.imdb_id)
        .collect();
    assert_eq!(ids, vec![100001, 100000]);

    // Immigration only scores tt0100001, so tt0100000 trails it
    let ids: Vec<u64> = rank_for_issue(&table, "Immigration", 10)
        .iter()
        .map(|r| r.imdb_id)
        .collect();
    assert_eq!(ids, vec![100001, 100000]);
    Ok(())
}
