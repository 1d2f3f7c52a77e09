//! Stage 4 against hand-written reports

use crate::scanner::error::ScanError;
use crate::scanner::ingest::ResultIngester;
use crate::scanner::staging::StagingArea;
use crate::scanner::tests::helpers::write_tree;
use crate::store::models::SHA256_EMPTY_CONTENT;
use crate::store::{Acceptance, FileRecord, FileStore, LicenseFinding, SqliteStore};
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

struct Fixture {
    _temp_dir: TempDir,
    staging: StagingArea,
    report_path: std::path::PathBuf,
}

fn fixture(staged: &[(&str, &str)], report: Option<serde_json::Value>) -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let staging = StagingArea::new(temp_dir.path().join("dirty"));
    write_tree(staging.root(), staged);
    let report_path = temp_dir.path().join("report").join("scancode.json");
    if let Some(report) = report {
        std::fs::create_dir_all(report_path.parent().unwrap()).unwrap();
        std::fs::write(&report_path, report.to_string()).unwrap();
    }
    Fixture {
        _temp_dir: temp_dir,
        staging,
        report_path,
    }
}

#[tokio::test]
async fn test_missing_report_is_a_no_op() {
    let fixture = fixture(&[("a.txt", "x")], None);
    let store = SqliteStore::open_in_memory().unwrap();

    let summary = ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.saved, 0);
    assert!(store.all_records().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_staging_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("scancode.json");
    std::fs::write(&report_path, r#"{"files": [{"path": "a", "type": "file"}]}"#).unwrap();
    let store = SqliteStore::open_in_memory().unwrap();

    let summary = ResultIngester::new(&store, StagingArea::new(temp_dir.path().join("nope")), &report_path)
        .run()
        .await
        .unwrap();
    assert_eq!(summary.saved, 0);
}

#[tokio::test]
async fn test_entries_are_saved_with_deduplicated_findings() {
    let fixture = fixture(
        &[("pkg/LICENSE", "GPL text"), ("pkg/main.c", "int main;")],
        Some(json!({
            "files": [
                {"path": "pkg", "type": "directory"},
                {
                    "path": "pkg/LICENSE",
                    "type": "file",
                    "sha256": "abc",
                    "is_legal": true,
                    "license_detections": [
                        {"matches": [{"license_expression": "gpl-2.0"}, {"license_expression": "gpl-1.0"}]},
                        {"matches": [{"license_expression": "gpl-2.0"}]}
                    ]
                },
                {"path": "pkg/main.c", "type": "file", "sha256": "def", "license_detections": []}
            ]
        })),
    );
    let store = SqliteStore::open_in_memory().unwrap();

    let summary = ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.saved, 2, "directory entries are skipped");
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.with_findings, 1);

    let license = store.record("pkg/LICENSE").unwrap().unwrap();
    assert_eq!(
        license.licenses,
        vec![LicenseFinding::new("gpl-1.0"), LicenseFinding::new("gpl-2.0")]
    );
    assert_eq!(license.content_text.as_deref(), Some("GPL text"));
    assert!(license.is_legal_document);
    assert_eq!(license.content_sha256.as_deref(), Some("abc"));

    let main = store.record("pkg/main.c").unwrap().unwrap();
    assert!(main.licenses.is_empty());
    assert_eq!(main.content_text, None, "clean files keep no content");
    assert!(store.record("pkg").unwrap().is_none());
}

#[tokio::test]
async fn test_missing_digest_defaults_to_empty_content_hash() {
    let fixture = fixture(
        &[("empty", "")],
        Some(json!({"files": [{"path": "empty", "type": "file"}]})),
    );
    let store = SqliteStore::open_in_memory().unwrap();

    ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
        .run()
        .await
        .unwrap();

    let record = store.record("empty").unwrap().unwrap();
    assert_eq!(record.content_sha256.as_deref(), Some(SHA256_EMPTY_CONTENT));
}

#[tokio::test]
async fn test_reingest_resets_acceptance() {
    let fixture = fixture(
        &[("f", "GPL v2")],
        Some(json!({"files": [{
            "path": "f",
            "type": "file",
            "sha256": "new",
            "license_detections": [{"matches": [{"license_expression": "gpl-2.0"}]}]
        }]})),
    );
    let store = SqliteStore::open_in_memory().unwrap();
    let mut existing = FileRecord::new("f").with_licenses(["gpl-2.0"]);
    existing.content_sha256 = Some("old".to_string());
    store.upsert_record(&existing, false).unwrap();
    store
        .set_acceptance("f", Some(&Acceptance::new("vetted", Utc::now())))
        .unwrap();

    let summary = ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
        .run()
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.inserted, 0);

    let record = store.record("f").unwrap().unwrap();
    assert_eq!(record.acceptance, None);
    assert_eq!(record.previous_accepted_reason.as_deref(), Some("vetted"));
    assert_eq!(record.content_sha256.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_findings_for_unstaged_file_abort() {
    let fixture = fixture(
        &[("other", "x")],
        Some(json!({"files": [{
            "path": "vanished",
            "type": "file",
            "license_detections": [{"matches": [{"license_expression": "mit"}]}]
        }]})),
    );
    let store = SqliteStore::open_in_memory().unwrap();

    let result = ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
        .run()
        .await;
    assert!(matches!(result, Err(ScanError::Io { .. })));
}

#[tokio::test]
async fn test_malformed_report_aborts() {
    let temp_dir = TempDir::new().unwrap();
    let staging = StagingArea::new(temp_dir.path().join("dirty"));
    write_tree(staging.root(), &[("a", "x")]);
    let report_path = temp_dir.path().join("scancode.json");
    std::fs::write(&report_path, "{\"files\": [").unwrap();
    let store = SqliteStore::open_in_memory().unwrap();

    let result = ResultIngester::new(&store, staging, &report_path).run().await;
    assert!(matches!(result, Err(ScanError::Report { .. })));
}

#[tokio::test]
async fn test_failed_ingestion_leaves_no_partial_records() {
    let fixture = fixture(
        &[("a", "GPL text")],
        Some(json!({"files": [
            {
                "path": "a",
                "type": "file",
                "license_detections": [{"matches": [{"license_expression": "gpl-1.0"}]}]
            },
            {
                "path": "vanished",
                "type": "file",
                "license_detections": [{"matches": [{"license_expression": "mit"}]}]
            }
        ]})),
    );
    let db_path = fixture._temp_dir.path().join("db.sqlite");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        store.begin_global_transaction().unwrap();
        store.upsert_record(&FileRecord::new("kept").with_licenses(["mit"]), false).unwrap();

        let result = ResultIngester::new(&store, fixture.staging.clone(), &fixture.report_path)
            .run()
            .await;
        assert!(result.is_err());
        store.commit().unwrap();
    }

    let reopened = SqliteStore::open(&db_path).unwrap();
    let mut paths: Vec<String> = reopened.all_records().unwrap().into_keys().collect();
    paths.sort();
    assert_eq!(paths, vec!["kept"]);
}
