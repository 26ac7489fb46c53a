use std::fs;
use std::sync::Arc;
use transit_auth::{
    AuthConfig, ClaimKind, ConfigError, FileKeyStore, KeyStore, RecordingNavigator, TransitAuth,
};

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transit-auth.json");
    fs::write(
        &path,
        r#"{
            "login_path": "/auth/sign-in",
            "forbidden_path": "/errors/403",
            "wildcard_roles": ["SuperUser"],
            "guard_check_kind": "role",
            "persisted_keys": ["menus", "tabs"]
        }"#,
    )
    .unwrap();

    let config = AuthConfig::from_file(&path).unwrap();
    assert_eq!(config.login_path, "/auth/sign-in");
    assert_eq!(config.forbidden_path, "/errors/403");
    assert_eq!(config.guard_check_kind, ClaimKind::Role);
    assert_eq!(
        config.all_persisted_keys(),
        vec!["token", "user", "menus", "tabs"]
    );
}

#[test]
fn test_invalid_path_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "forbidden_path": "403" }"#).unwrap();

    match AuthConfig::from_file(&path) {
        Err(ConfigError::InvalidPath { field, value }) => {
            assert_eq!(field, "forbidden path");
            assert_eq!(value, "403");
        }
        other => panic!("Expected InvalidPath error, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        AuthConfig::from_file("/nonexistent/transit-auth.json"),
        Err(ConfigError::IOError(_))
    ));
}

#[test]
fn test_builder_requires_navigator() {
    assert!(TransitAuth::builder().build().is_err());
}

#[test]
fn test_file_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let config = AuthConfig::builder()
        .session_file(&session_file)
        .build()
        .unwrap();

    let auth = TransitAuth::builder()
        .config(config.clone())
        .navigator(Arc::new(RecordingNavigator::new()))
        .file_store()
        .build()
        .unwrap();

    let exp = chrono::Utc::now().timestamp() + 600;
    let token = transit_auth::encode_claims(&serde_json::json!({ "exp": exp }));
    auth.login(&token, None).unwrap();
    assert!(session_file.exists());

    let store = FileKeyStore::from_config(&config).unwrap();
    assert_eq!(store.get("token").unwrap().as_deref(), Some(token.as_str()));

    auth.logout().unwrap();
    assert!(store.get("token").unwrap().is_none());
    assert!(store.get("user").unwrap().is_none());
}
