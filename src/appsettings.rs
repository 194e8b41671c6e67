use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use pillminder_models::{chrono_tz, permission::PermissionStatus};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub database_url: String,
    pub local_cache_path: PathBuf,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Default)]
pub struct SessionSettings {
    pub owner_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    #[serde(default)]
    pub permission: PermissionStatus,
    #[serde(default = "default_notify_command")]
    pub command: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            permission: PermissionStatus::Default,
            command: default_notify_command(),
            title: None,
            body: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ScheduleSettings {
    pub timezone: Option<chrono_tz::Tz>,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub storage: StorageSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_notify_command() -> String {
    "notify-send".to_owned()
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> AppSettings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_settings_use_defaults() {
        let settings = parse(
            r#"
[storage]
database_url = "sqlite://pillminder.db"
local_cache_path = "prescriptions.json"
"#,
        );

        assert_eq!(settings.storage.fetch_timeout_secs, 10);
        assert_eq!(settings.session.owner_id, None);
        assert_eq!(settings.notifications.permission, PermissionStatus::Default);
        assert_eq!(settings.notifications.command, "notify-send");
        assert_eq!(settings.schedule.timezone, None);
    }

    #[test]
    fn full_settings_are_parsed() {
        let settings = parse(
            r#"
[storage]
database_url = "sqlite::memory:"
local_cache_path = "/tmp/cache.json"
fetch_timeout_secs = 3

[session]
owner_id = "user-1"

[notifications]
permission = "granted"
title = "Ausgabe"
body = "Nimm {drug}"

[schedule]
timezone = "Europe/Prague"
"#,
        );

        assert_eq!(settings.storage.fetch_timeout_secs, 3);
        assert_eq!(settings.session.owner_id.as_deref(), Some("user-1"));
        assert_eq!(settings.notifications.permission, PermissionStatus::Granted);
        assert_eq!(settings.notifications.body.as_deref(), Some("Nimm {drug}"));
        assert_eq!(settings.schedule.timezone, Some(chrono_tz::Tz::Europe__Prague));
    }
}
