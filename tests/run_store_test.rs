//! Tests for run artifact naming, discovery and sampling

use athome_scrape::run_store::{
    ArtifactError, RunId, latest_url_artifact, list_url_artifacts, read_url_artifact,
    sample_url_artifact, url_artifact_path, write_url_artifact,
};
use std::collections::HashSet;
use tempfile::TempDir;

mod common;
use common::url;

fn run(raw: &str) -> RunId {
    RunId::parse(raw).expect("valid run id")
}

#[tokio::test]
async fn latest_ignores_files_outside_the_naming_pattern() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let one = [url("https://www.athome.lu/en/buy/flat/a/id-1.html")];

    write_url_artifact(&dir, &run("20230126155023"), &one)
        .await
        .expect("write");
    write_url_artifact(&dir, &run("20230126156000"), &one)
        .await
        .expect("write");
    std::fs::write(dir.join("URLs_99999999999999.txt.bak"), "x").expect("write stray");
    std::fs::write(dir.join("notes.txt"), "x").expect("write stray");
    std::fs::write(dir.join("URLs_latest.txt"), "x").expect("write stray");

    assert_eq!(
        list_url_artifacts(&dir).await.expect("list"),
        vec![run("20230126155023"), run("20230126156000")]
    );
    assert_eq!(
        latest_url_artifact(&dir).await.expect("latest"),
        run("20230126156000")
    );
}

#[tokio::test]
async fn missing_directory_has_no_runs() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("never-created");

    assert!(list_url_artifacts(&dir).await.expect("list").is_empty());
    assert!(matches!(
        latest_url_artifact(&dir).await,
        Err(ArtifactError::NoArtifacts { .. })
    ));
}

#[tokio::test]
async fn artifact_is_newline_delimited_and_skips_junk_on_read() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let id = run("20240101010101");

    let path = write_url_artifact(
        &dir,
        &id,
        &[
            url("https://www.athome.lu/en/buy/flat/a/id-1.html"),
            url("https://www.athome.lu/en/buy/flat/b/id-2.html"),
        ],
    )
    .await
    .expect("write");
    assert_eq!(path, url_artifact_path(&dir, &id));
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "https://www.athome.lu/en/buy/flat/a/id-1.html\nhttps://www.athome.lu/en/buy/flat/b/id-2.html\n"
    );
    // No temporary file left behind
    assert_eq!(std::fs::read_dir(&dir).expect("list").count(), 1);

    std::fs::write(
        &path,
        "https://www.athome.lu/en/buy/flat/a/id-1.html\n\nnot a url\n  https://www.athome.lu/en/buy/flat/c/id-3.html  \n",
    )
    .expect("rewrite");
    let urls = read_url_artifact(&dir, &id).await.expect("read");
    assert_eq!(
        urls,
        vec![
            url("https://www.athome.lu/en/buy/flat/a/id-1.html"),
            url("https://www.athome.lu/en/buy/flat/c/id-3.html"),
        ]
    );
}

#[tokio::test]
async fn reading_an_unknown_run_is_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let err = read_url_artifact(temp.path(), &run("20240101010101"))
        .await
        .expect_err("no such artifact");
    assert!(matches!(err, ArtifactError::NotFound { .. }));
}

#[tokio::test]
async fn sample_draws_distinct_subset_in_source_order() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let source = run("20230126155023");
    let target = run("20230126160000");

    let mut urls: Vec<_> = (0..50)
        .map(|i| url(&format!("https://www.athome.lu/en/buy/flat/x/id-{i}.html")))
        .collect();
    // Duplicates in the source do not count twice
    urls.extend(urls[..10].to_vec());
    write_url_artifact(&dir, &source, &urls).await.expect("write");

    let outcome = sample_url_artifact(&dir, &source, &target, 20)
        .await
        .expect("sample");
    assert_eq!(outcome.source_urls, 50);
    assert_eq!(outcome.sampled, 20);
    assert_eq!(outcome.run_id, target);

    let sampled = read_url_artifact(&dir, &target).await.expect("read sample");
    let distinct: HashSet<_> = sampled.iter().collect();
    assert_eq!(distinct.len(), 20);
    let positions: Vec<_> = sampled
        .iter()
        .map(|u| urls.iter().position(|s| s == u).expect("sampled from source"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn sample_larger_than_source_takes_everything() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let source = run("20230126155023");
    let urls = [
        url("https://www.athome.lu/en/buy/flat/a/id-1.html"),
        url("https://www.athome.lu/en/buy/flat/b/id-2.html"),
    ];
    write_url_artifact(&dir, &source, &urls).await.expect("write");

    let outcome = sample_url_artifact(&dir, &source, &run("20230126160000"), 1000)
        .await
        .expect("sample");
    assert_eq!(outcome.sampled, 2);
}

#[tokio::test]
async fn sample_refuses_to_overwrite_a_run() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let source = run("20230126155023");
    write_url_artifact(&dir, &source, &[url("https://www.athome.lu/en/buy/flat/a/id-1.html")])
        .await
        .expect("write");

    let err = sample_url_artifact(&dir, &source, &source, 10)
        .await
        .expect_err("target exists");
    assert!(matches!(err, ArtifactError::AlreadyExists { .. }));
}

#[tokio::test]
async fn run_ids_need_not_be_calendar_dates() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    // Minute field 60: still 14 digits, still a run
    let odd = run("20230126156000");
    let one = [url("https://www.athome.lu/en/buy/flat/a/id-1.html")];
    write_url_artifact(&dir, &odd, &one).await.expect("write");

    assert_eq!(read_url_artifact(&dir, &odd).await.expect("read"), one.to_vec());
    assert!(RunId::parse("2023012615600").is_err());
    assert!(RunId::parse("2023012615600x").is_err());
}

#[tokio::test]
async fn failed_artifact_write_leaves_no_temp_file() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("extracted_urls");
    let id = run("20240101010101");

    // A directory squatting on the artifact's name makes the rename fail
    std::fs::create_dir_all(url_artifact_path(&dir, &id).join("occupied")).expect("mkdir");

    write_url_artifact(&dir, &id, &[url("https://www.athome.lu/en/buy/flat/a/id-1.html")])
        .await
        .expect_err("target is a directory");

    let names: Vec<String> = std::fs::read_dir(&dir)
        .expect("list")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["URLs_20240101010101.txt".to_string()]);
}
