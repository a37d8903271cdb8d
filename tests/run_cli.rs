mod common;

use common::{ledger_versions, stdout_json, Project};

const PAGES_MASTER: &str = "\
versions:
  1:
    pages:
      enabled: true
      sources: [data/pages.yaml]
";

fn pages_project() -> Project {
    let project = Project::new();
    project.write_master(PAGES_MASTER);
    project.write(
        "data/pages.yaml",
        "home:\n  page:\n    - title: Home\n      content: <p>Welcome</p>\n",
    );
    project
}

#[test]
fn run_applies_pages_and_records_version() {
    let project = pages_project();

    let output = project.run(&["run", "--env", "production"]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");

    assert_eq!(ledger_versions(&project), vec![1]);
    let pages = project.json("var/configurator/store/cms_page.json");
    let home = &pages["rows"]["home@all"]["data"];
    assert_eq!(home["title"], "Home");
    assert_eq!(home["page_layout"], "empty");
    assert_eq!(home["is_active"], true);

    let history = project.read("var/configurator/runs.jsonl");
    let entry: serde_json::Value =
        serde_json::from_str(history.lines().next().expect("one entry")).expect("parse entry");
    assert_eq!(entry["outcome"], "completed");
    assert_eq!(entry["environment"], "production");
    assert_eq!(entry["created"], 1);
}

#[test]
fn rerun_is_nothing_pending_and_leaves_store_untouched() {
    let project = pages_project();
    assert_eq!(project.run(&["run", "--env", "production"]).status.code(), Some(0));
    let store_before = project.read("var/configurator/store/cms_page.json");

    let output = project.run(&["run", "--env", "production"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("nothing pending"));
    assert_eq!(project.read("var/configurator/store/cms_page.json"), store_before);
    assert_eq!(ledger_versions(&project), vec![1]);
    assert_eq!(project.read("var/configurator/runs.jsonl").lines().count(), 2);
}

#[test]
fn missing_version_blocks_until_forced() {
    let project = Project::new();
    project.write("data/pages.yaml", "home:\n  page:\n    - title: Home\n");
    project.write(
        "var/configurator/versions.json",
        r#"{"schema_version":1,"records":[
            {"version":1,"applied_at":"2026-01-05T10:00:00Z"},
            {"version":3,"applied_at":"2026-01-06T10:00:00Z"}]}"#,
    );
    project.write_master(
        "versions:\n  1:\n  2:\n    pages: {enabled: true, sources: [data/pages.yaml]}\n  3:\n",
    );

    let blocked = project.run(&["run", "--env", "production"]);
    assert_eq!(blocked.status.code(), Some(2), "{blocked:?}");
    assert_eq!(ledger_versions(&project), vec![1, 3]);
    assert!(!project
        .root()
        .join("var/configurator/store/cms_page.json")
        .exists());

    let forced = project.run(&["run", "--env", "production", "--force"]);
    assert_eq!(forced.status.code(), Some(0), "{forced:?}");
    assert_eq!(ledger_versions(&project), vec![1, 3, 2]);
}

#[test]
fn invalid_master_aborts_with_every_issue() {
    let project = Project::new();
    project.write_master(
        "versions:\n  1:\n    pages:\n      sources: [a.yaml]\n    blocks: {enabled: true, sources: [b.yaml]}\n",
    );

    let output = project.run(&["run", "--env", "production"]);
    assert_eq!(output.status.code(), Some(3), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 problem(s)"), "{stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "aborted: invalid master definition", "{stdout}");
    assert!(lines.contains(&"  version 1, component 'pages': missing required `enabled` node"));
    assert!(lines.contains(&"  version 1, component 'blocks': not a registered component"));
    assert!(!project.root().join("var/configurator/versions.json").exists());
}

#[test]
fn status_and_history_report_json() {
    let project = pages_project();
    let status = project.run(&["status", "--json"]);
    assert_eq!(status.status.code(), Some(0), "{status:?}");
    let report = stdout_json(&status);
    assert_eq!(report["plan"]["pending"], serde_json::json!([1]));
    assert_eq!(report["applied"], serde_json::json!([]));

    assert_eq!(project.run(&["run", "--env", "production"]).status.code(), Some(0));

    let history = project.run(&["history", "--json"]);
    assert_eq!(history.status.code(), Some(0), "{history:?}");
    let results = stdout_json(&history);
    assert_eq!(results["total_count"], 1);
    assert_eq!(results["items"][0]["version"], 1);
}

#[test]
fn init_bootstraps_a_runnable_project() {
    let project = Project::new();
    let output = project.run(&["init"]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert_eq!(project.json("configurator.json")["schema_version"], 1);

    let run = project.run(&["run", "--env", "production"]);
    assert_eq!(run.status.code(), Some(0), "{run:?}");
    assert_eq!(ledger_versions(&project), vec![1]);
}
