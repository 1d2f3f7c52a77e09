//! End-to-end workflow: scan a source tree, audit it, accept findings and
//! report on what was accepted. Each command opens the database afresh, the
//! way separate process invocations would.

mod common;

use common::{session_time, Workspace};
use licaudit::app::cli::args::{AcceptedFormat, AuditArgs, Command, LicensesCommand, PolicyTarget, ScanArgs};
use licaudit::app::AppError;
use licaudit::audit::AuditError;
use licaudit::store::FileStore;

fn scan(pattern: &str) -> Command {
    Command::Scan(ScanArgs {
        pattern: pattern.to_string(),
        verbose: false,
        force: false,
        no_extract: false,
    })
}

fn audit() -> Command {
    Command::Audit(AuditArgs::default())
}

fn findings_left(result: Result<(), AppError>) -> usize {
    match result {
        Ok(()) => 0,
        Err(AppError::Audit(AuditError::FindingsPresent(n))) => n,
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[tokio::test]
async fn test_gpl_file_found_then_accepted() {
    let workspace = Workspace::new();
    workspace.write_source("some/file.txt", "I do enjoy some GNU GENERAL PUBLIC LICENSE madness.");
    workspace.write_source("some/other.txt", "Nothing to see.");

    workspace.run(scan("**"), session_time(0)).await.0.unwrap();

    let store = workspace.open_store();
    let record = store.record("some/file.txt").unwrap().unwrap();
    assert_eq!(record.licenses[0].name, "gpl-1.0");
    assert!(record.content_text.unwrap().contains("GNU GENERAL PUBLIC LICENSE"));
    let clean = store.record("some/other.txt").unwrap().unwrap();
    assert!(clean.licenses.is_empty());
    assert_eq!(clean.content_text, None);
    drop(store);

    let (result, _) = workspace.run(audit(), session_time(1)).await;
    assert_eq!(findings_left(result), 1);
    let artifact = workspace.layout(session_time(1)).audit_report();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(artifact).unwrap()).unwrap();
    assert_eq!(json["some"]["file.txt"]["licenses"][0]["name"], "gpl-1.0");

    workspace
        .run(
            Command::Accept {
                pattern: "some/file.txt".to_string(),
                reason: "GPL? Ok, just this once.".to_string(),
            },
            session_time(2),
        )
        .await
        .0
        .unwrap();

    let (result, _) = workspace.run(audit(), session_time(3)).await;
    assert_eq!(findings_left(result), 0);

    let (result, csv) = workspace
        .run(
            Command::Accepted {
                output: AcceptedFormat::Csv,
            },
            session_time(4),
        )
        .await;
    result.unwrap();
    assert_eq!(csv, "file_path|reason\nsome/file.txt|GPL? Ok, just this once.\n");
}

#[tokio::test]
async fn test_changed_file_needs_review_again() {
    let workspace = Workspace::new();
    workspace.write_source("pkg/COPYING", "GNU GENERAL PUBLIC LICENSE");

    workspace.run(scan("**"), session_time(0)).await.0.unwrap();
    workspace
        .run(
            Command::Accept {
                pattern: "pkg/%".to_string(),
                reason: "vetted".to_string(),
            },
            session_time(1),
        )
        .await
        .0
        .unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(2)).await.0), 0);

    // Unchanged rescan keeps the acceptance.
    workspace.run(scan("**"), session_time(3)).await.0.unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(4)).await.0), 0);

    workspace.write_source("pkg/COPYING", "GNU GENERAL PUBLIC LICENSE, new terms");
    workspace.run(scan("pkg/*"), session_time(5)).await.0.unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(6)).await.0), 1);

    let record = workspace.open_store().record("pkg/COPYING").unwrap().unwrap();
    assert_eq!(record.previous_accepted_reason.as_deref(), Some("vetted"));
}

#[tokio::test]
async fn test_allowed_license_needs_no_review() {
    let workspace = Workspace::new();
    workspace.write_source("lib/a.c", "Permission is hereby granted");
    workspace.write_source("lib/b.c", "GNU GENERAL PUBLIC LICENSE");
    workspace.run(scan("**"), session_time(0)).await.0.unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(1)).await.0), 2);

    workspace
        .run(
            Command::Licenses(LicensesCommand::Allow(PolicyTarget::Specific {
                name: "mit".to_string(),
            })),
            session_time(2),
        )
        .await
        .0
        .unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(3)).await.0), 1);

    // Wildcard accept skips files the policy already allows.
    workspace
        .run(
            Command::Accept {
                pattern: "lib/%".to_string(),
                reason: "reviewed".to_string(),
            },
            session_time(4),
        )
        .await
        .0
        .unwrap();
    let store = workspace.open_store();
    assert!(store.record("lib/b.c").unwrap().unwrap().is_accepted());
    assert!(!store.record("lib/a.c").unwrap().unwrap().is_accepted());
    drop(store);

    workspace
        .run(
            Command::Unaccept {
                pattern: "lib/b.c".to_string(),
            },
            session_time(5),
        )
        .await
        .0
        .unwrap();
    assert_eq!(findings_left(workspace.run(audit(), session_time(6)).await.0), 1);
}

#[tokio::test]
async fn test_bulk_accept_groups_in_csv() {
    let workspace = Workspace::new();
    for path in [
        "a/node_modules/file1.txt",
        "a/b/node_modules/file2.txt",
        "a/b/c/node_modules/file3.txt",
        "a/not-me.txt",
    ] {
        workspace.write_source(path, "GNU GENERAL PUBLIC LICENSE");
    }
    workspace.run(scan("**"), session_time(0)).await.0.unwrap();

    workspace
        .run(
            Command::Accept {
                pattern: "%/node_modules/%".to_string(),
                reason: "GPL? Ok, just this thrice.".to_string(),
            },
            session_time(1),
        )
        .await
        .0
        .unwrap();

    let (result, csv) = workspace
        .run(
            Command::Accepted {
                output: AcceptedFormat::Csv,
            },
            session_time(2),
        )
        .await;
    result.unwrap();
    assert_eq!(
        csv,
        "file_path|reason\na/node_modules/{3 files}|GPL? Ok, just this thrice.\n"
    );
    assert_eq!(findings_left(workspace.run(audit(), session_time(3)).await.0), 1);
}
