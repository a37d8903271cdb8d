use super::*;

fn write_config_file(root: &Path, contents: &str) {
    fs::write(root.join(CONFIG_FILE_NAME), contents.as_bytes()).expect("write config");
}

#[test]
fn missing_config_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config(dir.path()).expect("load config");
    assert_eq!(config, ProjectConfig::default());
    assert_eq!(config.master, DEFAULT_MASTER_REL);
}

#[test]
fn partial_config_fills_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_config_file(dir.path(), r#"{"schema_version": 1, "master": "etc/master.yaml"}"#);
    let config = load_config(dir.path()).expect("load config");
    assert_eq!(config.master, "etc/master.yaml");
    assert_eq!(config.state_dir, DEFAULT_STATE_REL);
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_config_file(dir.path(), r#"{"schema_version": 9}"#);
    let err = load_config(dir.path()).expect_err("schema 9 rejected");
    assert!(err.to_string().contains("schema_version 9"), "{err}");
}

#[test]
fn rejects_paths_escaping_the_root() {
    let config = ProjectConfig {
        state_dir: "../elsewhere".to_string(),
        ..ProjectConfig::default()
    };
    let err = validate_config(&config).expect_err("parent dir rejected");
    assert!(err.to_string().contains("state_dir"), "{err}");

    let config = ProjectConfig {
        master: "/etc/master.yaml".to_string(),
        ..ProjectConfig::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn stub_round_trips_to_defaults() {
    let stub = config_stub().expect("stub");
    let parsed: ProjectConfig = serde_json::from_str(&stub).expect("parse stub");
    assert_eq!(parsed, ProjectConfig::default());
}
