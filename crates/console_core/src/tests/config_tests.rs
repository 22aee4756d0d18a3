use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn normalizes_base_path_slashes() {
    assert_eq!(normalize_base_path("api/v2/"), "/api/v2");
    assert_eq!(normalize_base_path("//api/v1//"), "/api/v1");
    assert_eq!(normalize_base_path("   "), "/api/v1");
    assert_eq!(normalize_base_path("/"), "/api/v1");
}

#[test]
fn api_root_joins_server_url_and_base_path() {
    let settings = ConsoleSettings {
        server_url: "http://localhost:9000/".into(),
        base_path: "api/v1/".into(),
        ..ConsoleSettings::default()
    };
    assert_eq!(
        settings.api_root().expect("api root").as_str(),
        "http://localhost:9000/api/v1"
    );
}

#[test]
fn api_root_rejects_non_http_scheme() {
    let settings = ConsoleSettings {
        server_url: "ftp://example.com".into(),
        ..ConsoleSettings::default()
    };
    assert!(settings.api_root().is_err());
}

#[test]
fn file_values_override_defaults_and_ignore_malformed_entries() {
    let mut settings = ConsoleSettings::default();
    apply_file_values(
        &mut settings,
        r#"
server_url = "https://console.example.com"
base_path = "backend/api"
request_timeout_secs = "not-a-number"
"#,
    );

    assert_eq!(settings.server_url, "https://console.example.com");
    assert_eq!(settings.base_path, "/backend/api");
    assert_eq!(settings.request_timeout_secs, 30);

    apply_file_values(&mut settings, "request_timeout_secs = 5");
    assert_eq!(settings.request_timeout(), Duration::from_secs(5));
}

#[test]
fn unparsable_file_leaves_settings_untouched() {
    let mut settings = ConsoleSettings::default();
    apply_file_values(&mut settings, "server_url = ");
    assert_eq!(settings, ConsoleSettings::default());
}

#[test]
fn explicit_settings_file_must_exist() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("console_settings_missing_{suffix}.toml"));

    let err = load_settings_file(&missing).expect_err("missing file");
    assert!(err.to_string().contains("failed to read settings file"));
}

#[test]
fn explicit_settings_file_is_loaded() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("console_settings_{suffix}.toml"));
    fs::write(&path, "request_timeout_secs = 12\n").expect("write settings");

    let settings = load_settings_file(&path).expect("load settings");
    assert_eq!(settings.request_timeout_secs, 12);

    fs::remove_file(path).expect("cleanup");
}
