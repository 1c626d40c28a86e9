//! Catalog workflow tests.
//!
//! Drives the data catalog through the registry the way a request
//! dispatcher would: acquire the region store, run one operation under its
//! lock, inspect the returned representation.

use std::sync::Once;

use cirrus_core::{BackendRegistry, CirrusConfig, ErrorKind, PageRequest};
use cirrus_glue::*;
use indexmap::IndexMap;

static TRACING_INIT: Once = Once::new();

/// Controlled by `RUST_LOG` (e.g. `RUST_LOG=cirrus_glue=debug`).
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn registry() -> BackendRegistry<GlueBackend> {
    init_tracing();
    BackendRegistry::new(CirrusConfig::default())
}

fn strings(vs: &[&str]) -> Vec<String> {
    vs.iter().map(|v| v.to_string()).collect()
}

fn table_input(description: &str) -> TableInput {
    let mut input = TableInput {
        partition_keys: vec![
            Column::new("year", "int"),
            Column::new("day", "date"),
        ],
        ..TableInput::default()
    };
    input
        .attributes
        .insert("Description".to_string(), description.into());
    input
}

// ── Tables ───────────────────────────────────────────────────────

#[test]
fn table_versions_are_one_based() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("db", DatabaseInput::default())?;
        b.create_table("db", "t", table_input("first"))?;
        b.update_table("db", "t", table_input("second"))?;
        b.update_table("db", "t", table_input("third"))?;

        assert_eq!(
            b.get_table_version("db", "t", "1")?.attributes["Description"],
            "first"
        );
        assert_eq!(
            b.get_table_version("db", "t", "3")?.attributes["Description"],
            "third"
        );
        assert_eq!(
            b.get_table_version("db", "t", "4").unwrap_err().kind(),
            ErrorKind::VersionNotFound
        );
        assert_eq!(
            b.get_table_version("db", "t", "x").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );

        let ids: Vec<String> = b
            .get_table_versions("db", "t")?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, strings(&["1", "2", "3"]));

        let table = b.get_table("db", "t")?.to_value();
        assert_eq!(table["Description"], "third");
        assert_eq!(table["DatabaseName"], "db");
        Ok(())
    })
    .unwrap();
}

#[test]
fn duplicate_table_rejected_and_delete_works() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("db", DatabaseInput::default())?;
        b.create_table("db", "t", TableInput::default())?;
        assert_eq!(
            b.create_table("db", "t", TableInput::default()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        b.delete_table("db", "t")?;
        assert_eq!(b.get_table("db", "t").unwrap_err().kind(), ErrorKind::NotFound);
        Ok(())
    })
    .unwrap();
}

// ── Partitions ───────────────────────────────────────────────────

#[test]
fn partition_update_keeps_listing_order() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("db", DatabaseInput::default())?;
        b.create_table("db", "t", table_input("events"))?;
        b.create_partition("db", "t", PartitionInput::new(["2021", "2021-01-01"]))?;
        b.create_partition("db", "t", PartitionInput::new(["2021", "2021-01-02"]))?;

        let mut changed = PartitionInput::new(["2021", "2021-01-01"]);
        changed
            .attributes
            .insert("Parameters".to_string(), serde_json::json!({ "rows": "10" }));
        b.update_partition("db", "t", &strings(&["2021", "2021-01-01"]), changed)?;

        let listed: Vec<Vec<String>> = b
            .get_partitions("db", "t", None)?
            .into_iter()
            .map(|p| p.values().to_vec())
            .collect();
        assert_eq!(
            listed,
            vec![strings(&["2021", "2021-01-01"]), strings(&["2021", "2021-01-02"])]
        );
        let first = b.get_partition("db", "t", &strings(&["2021", "2021-01-01"]))?;
        assert_eq!(first.to_value()["Parameters"]["rows"], "10");
        Ok(())
    })
    .unwrap();
}

#[test]
fn partition_rekey_collision_leaves_both() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("db", DatabaseInput::default())?;
        b.create_table("db", "t", table_input("events"))?;
        b.create_partition("db", "t", PartitionInput::new(["2021", "2021-01-01"]))?;
        b.create_partition("db", "t", PartitionInput::new(["2021", "2021-01-02"]))?;

        let err = b
            .update_partition(
                "db",
                "t",
                &strings(&["2021", "2021-01-01"]),
                PartitionInput::new(["2021", "2021-01-02"]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(b.get_partitions("db", "t", None)?.len(), 2);

        b.update_partition(
            "db",
            "t",
            &strings(&["2021", "2021-01-01"]),
            PartitionInput::new(["2021", "2021-01-03"]),
        )?;
        assert!(b.get_partition("db", "t", &strings(&["2021", "2021-01-01"])).is_err());
        assert!(b.get_partition("db", "t", &strings(&["2021", "2021-01-03"])).is_ok());
        Ok(())
    })
    .unwrap();
}

#[test]
fn typed_partition_filters() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("db", DatabaseInput::default())?;
        b.create_table("db", "t", table_input("events"))?;
        for (year, day) in [
            ("2019", "2019-12-31"),
            ("2020", "2020-02-29"),
            ("2021", "2021-01-15"),
        ] {
            b.create_partition("db", "t", PartitionInput::new([year, day]))?;
        }

        let years = |expr: &str| -> Vec<String> {
            b.get_partitions("db", "t", Some(expr))
                .unwrap()
                .into_iter()
                .map(|p| p.values()[0].clone())
                .collect()
        };
        assert_eq!(years("year > 2019"), strings(&["2020", "2021"]));
        assert_eq!(
            years("day BETWEEN '2020-01-01' AND '2020-12-31'"),
            strings(&["2020"])
        );
        assert_eq!(years("year IN (2019, 2021)"), strings(&["2019", "2021"]));

        assert_eq!(
            b.get_partitions("db", "t", Some("day > '2020-02-30'"))
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            b.get_partitions("db", "t", Some("month = 1")).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        Ok(())
    })
    .unwrap();
}

// ── Crawlers and jobs ────────────────────────────────────────────

#[test]
fn list_crawlers_pages_in_creation_order() {
    let glue = registry();
    glue.with_backend("us-west-2", |b| {
        for i in 0..250 {
            b.create_crawler(&format!("crawler-{i:03}"), CrawlerInput::default())?;
        }

        let mut seen = Vec::new();
        let mut sizes = Vec::new();
        let mut request = PageRequest::first(Some(100));
        loop {
            let page = b.list_crawlers(&request)?;
            sizes.push(page.items.len());
            seen.extend(page.items);
            match page.next_token {
                Some(token) => request = PageRequest::after(token, Some(100)),
                None => break,
            }
        }

        assert_eq!(sizes, vec![100, 100, 50]);
        let expected: Vec<String> = (0..250).map(|i| format!("crawler-{i:03}")).collect();
        assert_eq!(seen, expected);
        Ok(())
    })
    .unwrap();
}

#[test]
fn crawler_token_rejected_by_job_listing() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        for i in 0..3 {
            b.create_crawler(&format!("c{i}"), CrawlerInput::default())?;
            b.create_job(&format!("c{i}"), JobInput::default())?;
        }
        let token = b
            .list_crawlers(&PageRequest::first(Some(1)))?
            .next_token
            .expect("more crawlers remain");
        let err = b.list_jobs(&PageRequest::after(token, Some(1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    })
    .unwrap();
}

#[test]
fn job_run_lifecycle() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_job("nightly", JobInput::default())?;
        let run_id = b.start_job_run("nightly", IndexMap::new())?;
        assert_eq!(b.get_job("nightly")?.state, JobState::Running);
        assert_eq!(
            b.start_job_run("nightly", IndexMap::new()).unwrap_err().kind(),
            ErrorKind::InvalidState
        );

        let run = b.get_job_run("nightly", &run_id)?.to_value();
        assert_eq!(run["JobName"], "nightly");
        assert_eq!(run["JobRunState"], "SUCCEEDED");
        assert_eq!(b.get_job_runs("nightly")?.len(), 1);

        b.delete_job("nightly")?;
        assert_eq!(b.get_job("nightly").unwrap_err().kind(), ErrorKind::NotFound);
        Ok(())
    })
    .unwrap();
}

// ── Tags and regions ─────────────────────────────────────────────

#[test]
fn tags_merge_and_outlive_resource() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        let input = CrawlerInput {
            tags: IndexMap::from([("env".to_string(), "dev".to_string())]),
            ..CrawlerInput::default()
        };
        let arn = b.create_crawler("c", input)?.arn.to_string();

        b.tag_resource(
            &arn,
            IndexMap::from([
                ("env".to_string(), "prod".to_string()),
                ("team".to_string(), "data".to_string()),
            ]),
        );
        b.untag_resource(&arn, &strings(&["missing"]));
        let tags = b.get_tags(&arn);
        assert_eq!(tags["env"], "prod");
        assert_eq!(tags["team"], "data");

        b.delete_crawler("c")?;
        assert_eq!(b.get_tags(&arn).len(), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn regions_are_isolated() {
    let glue = registry();
    glue.with_backend("us-east-1", |b| {
        b.create_database("shared", DatabaseInput::default()).map(|_| ())
    })
    .unwrap();
    let err = glue
        .with_backend("eu-central-1", |b| b.get_database("shared").map(|_| ()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(glue.regions(), strings(&["eu-central-1", "us-east-1"]));
}

#[test]
fn region_allow_list_enforced() {
    init_tracing();
    let config = CirrusConfig::from_toml_str("regions = [\"us-east-1\"]").unwrap();
    let glue: BackendRegistry<GlueBackend> = BackendRegistry::new(config);
    assert!(glue.backend("us-east-1").is_ok());
    assert_eq!(
        glue.backend("ap-south-1").err().map(|e| e.kind()),
        Some(ErrorKind::InvalidInput)
    );
}
