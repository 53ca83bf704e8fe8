use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "ticket.toml";
pub const DEFAULT_DATABASE_FILE: &str = "ticket.sqlite3";
const APP_DIR_NAME: &str = "conf_ticket";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    pub name: String,
    pub date: NaiveDate,
    pub location: String,
    pub ticket_number: String,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            name: "Coding Conf".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default(),
            location: "Austin, TX".into(),
            ticket_number: "#01609".into(),
        }
    }
}

impl EventDetails {
    pub fn schedule_line(&self) -> String {
        format!("{} / {}", self.date.format("%b %d, %Y"), self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `None` lets the app pick its per-user default location.
    pub database_url: Option<String>,
    pub avatar_required: bool,
    /// Directory that `/assets/...` paths resolve against.
    pub assets_dir: PathBuf,
    pub event: EventDetails,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            avatar_required: true,
            assets_dir: PathBuf::from("public"),
            event: EventDetails::default(),
        }
    }
}

impl Settings {
    pub fn resolve_asset(&self, web_path: &str) -> PathBuf {
        self.assets_dir.join(web_path.trim_start_matches('/'))
    }
}

/// Defaults, then the settings file, then environment overrides.
///
/// An explicitly named file must exist; the default `ticket.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TICKET_DATABASE_URL") {
        settings.database_url = Some(v);
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = Some(v);
    }

    if let Some(v) = lookup("APP__AVATAR_REQUIRED") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.avatar_required = true,
            "0" | "false" | "no" => settings.avatar_required = false,
            other => tracing::warn!(value = other, "ignoring unrecognised APP__AVATAR_REQUIRED"),
        }
    }

    if let Some(v) = lookup("APP__ASSETS_DIR") {
        settings.assets_dir = PathBuf::from(v);
    }
}

/// Per-user directory holding the ticket database.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("unable to resolve local app data dir"))?;
    Ok(base.join(APP_DIR_NAME))
}

/// An explicit url wins over the configured one. With neither, the database
/// lives in `data_dir`, falling back to [`default_data_dir`]. The directory is
/// created when `storage::Storage` opens the url.
pub fn resolve_database_url(
    explicit: Option<&str>,
    settings: &Settings,
    data_dir: Option<&Path>,
) -> anyhow::Result<String> {
    let raw = match explicit.or(settings.database_url.as_deref()) {
        Some(url) => url.to_string(),
        None => {
            let dir = match data_dir {
                Some(dir) => dir.to_path_buf(),
                None => default_data_dir()?,
            };
            dir.join(DEFAULT_DATABASE_FILE)
                .to_string_lossy()
                .into_owned()
        }
    };
    Ok(normalize_database_url(&raw))
}

/// Plain paths and `sqlite:path` become `sqlite://path`.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/ticket.db"),
            "sqlite://./data/ticket.db"
        );
        assert_eq!(
            normalize_database_url("sqlite:data\\ticket.db"),
            "sqlite://data/ticket.db"
        );
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn database_url_prefers_explicit_then_configured_then_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();

        let url = resolve_database_url(None, &settings, Some(&dir.path().join("profile")))
            .expect("resolve");
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with(DEFAULT_DATABASE_FILE));

        settings.database_url = Some("sqlite::memory:".to_string());
        assert_eq!(
            resolve_database_url(None, &settings, Some(dir.path())).expect("resolve"),
            "sqlite::memory:"
        );

        let explicit = dir.path().join("cli.db");
        let url = resolve_database_url(
            Some(explicit.to_string_lossy().as_ref()),
            &settings,
            None,
        )
        .expect("resolve");
        assert!(url.ends_with("cli.db"));
    }

    #[test]
    fn reads_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ticket.toml");
        fs::write(
            &path,
            r#"
avatar_required = false

[event]
location = "Berlin, DE"
date = "2026-03-14"
"#,
        )
        .expect("write");

        let settings = read_settings_file(&path).expect("settings");
        assert!(!settings.avatar_required);
        assert_eq!(settings.database_url, None);
        assert_eq!(settings.event.name, "Coding Conf");
        assert_eq!(settings.event.schedule_line(), "Mar 14, 2026 / Berlin, DE");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_settings(Some(dir.path().join("absent.toml").as_path()))
            .expect_err("missing");
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ticket.toml");
        fs::write(&path, "avatar_required = \"sometimes\"").expect("write");
        assert!(matches!(
            read_settings_file(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TICKET_DATABASE_URL", "sqlite://first.db"),
            ("APP__DATABASE_URL", "sqlite://second.db"),
            ("APP__AVATAR_REQUIRED", "no"),
            ("APP__ASSETS_DIR", "/srv/assets"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.database_url.as_deref(), Some("sqlite://second.db"));
        assert!(!settings.avatar_required);
        assert_eq!(
            settings.resolve_asset("/assets/images/image-avatar.jpg"),
            PathBuf::from("/srv/assets/assets/images/image-avatar.jpg")
        );
    }

    #[test]
    fn unrecognised_bool_leaves_setting_alone() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| {
            (name == "APP__AVATAR_REQUIRED").then(|| "maybe".to_string())
        });
        assert!(settings.avatar_required);
    }
}
