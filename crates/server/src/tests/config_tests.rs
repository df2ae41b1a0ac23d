use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("order_server_config_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, Some(HashMap::new())).expect("settings");
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.event_buffer, 256);
    assert_eq!(settings.max_body_bytes, 64 * 1024);
    assert_eq!(settings.store_id, StoreId(1));
    let names: Vec<&str> = settings.kitchens.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, vec!["Grill", "Fryer", "Drinks"]);
}

#[test]
fn file_overrides_defaults_and_env_overrides_file() {
    let path = temp_file(
        "server.toml",
        r#"
server_bind = "0.0.0.0:9000"
event_buffer = 32
store_id = 7

[[kitchens]]
id = 10
name = "Pizza"
"#,
    );
    let env = HashMap::from([("APP__SERVER_BIND".to_string(), "127.0.0.1:9100".to_string())]);
    let settings = load_settings_from(Some(&path), Some(env)).expect("settings");
    assert_eq!(settings.server_bind, "127.0.0.1:9100");
    assert_eq!(settings.event_buffer, 32);
    assert_eq!(settings.store_id, StoreId(7));
    assert_eq!(
        settings.kitchens,
        vec![KitchenSetting {
            id: KitchenId(10),
            name: "Pizza".to_string(),
        }]
    );
    fs::remove_dir_all(path.parent().expect("dir")).expect("cleanup");
}

#[test]
fn numeric_env_values_are_parsed() {
    let env = HashMap::from([("APP__MAX_BODY_BYTES".to_string(), "1024".to_string())]);
    let settings = load_settings_from(None, Some(env)).expect("settings");
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn zero_event_buffer_is_rejected() {
    let env = HashMap::from([("APP__EVENT_BUFFER".to_string(), "0".to_string())]);
    assert!(load_settings_from(None, Some(env)).is_err());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let path = env::temp_dir().join("order_server_config_missing/server.toml");
    assert!(load_settings_from(Some(&path), Some(HashMap::new())).is_err());
}
