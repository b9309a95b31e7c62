use std::path::PathBuf;

use crate::config::{Config, Discord, NotificationSink, StorageConfig};

/// Unset and blank variables both count as absent
fn non_blank(value: Result<String, std::env::VarError>) -> Option<String> {
    value.ok().filter(|value| !value.trim().is_empty())
}

const DISCORD_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";

pub fn get_webhook_url() -> Option<String> {
    non_blank(std::env::var(DISCORD_WEBHOOK_URL))
}

const DATA_DIR: &str = "SITEPULSE_DATA_DIR";

pub fn get_data_dir() -> Option<PathBuf> {
    non_blank(std::env::var(DATA_DIR)).map(PathBuf::from)
}

/// Apply environment overrides on top of a loaded registry.
///
/// `DISCORD_WEBHOOK_URL` replaces the configured sink (keeping a configured
/// Discord `user_id`), `SITEPULSE_DATA_DIR` replaces the data directory of
/// file storage.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, get_webhook_url(), get_data_dir())
}

fn apply_overrides(
    mut config: Config,
    webhook_url: Option<String>,
    data_dir: Option<PathBuf>,
) -> Config {
    if let Some(url) = webhook_url {
        let user_id = match &config.notifications {
            Some(NotificationSink::Discord(discord)) => discord.user_id.clone(),
            _ => None,
        };
        config.notifications = Some(NotificationSink::Discord(Discord { url, user_id }));
    }

    if let Some(dir) = data_dir {
        config.storage = Some(match config.storage.take().unwrap_or_default() {
            StorageConfig::Files {
                summary_cap,
                history_days,
                ..
            } => StorageConfig::Files {
                path: dir,
                summary_cap,
                history_days,
            },
            StorageConfig::None => StorageConfig::None,
        });
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Webhook, default_history_days, default_summary_cap};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::env::VarError;

    fn discord(user_id: Option<&str>) -> Option<NotificationSink> {
        Some(NotificationSink::Discord(Discord {
            url: "https://discord.test/configured".to_string(),
            user_id: user_id.map(str::to_string),
        }))
    }

    #[test]
    fn test_blank_values_are_absent() {
        assert_eq!(non_blank(Ok("  ".to_string())), None);
        assert_eq!(non_blank(Ok(String::new())), None);
        assert_eq!(non_blank(Err(VarError::NotPresent)), None);
        assert_eq!(non_blank(Ok("/srv/pulse".to_string())), Some("/srv/pulse".to_string()));
    }

    #[test]
    fn test_webhook_override_keeps_discord_user_id() {
        let config = Config {
            notifications: discord(Some("42")),
            ..Default::default()
        };

        let config = apply_overrides(config, Some("https://discord.test/env".to_string()), None);

        assert_eq!(
            config.notifications,
            Some(NotificationSink::Discord(Discord {
                url: "https://discord.test/env".to_string(),
                user_id: Some("42".to_string()),
            }))
        );
    }

    #[test]
    fn test_webhook_override_replaces_plain_webhook() {
        let config = Config {
            notifications: Some(NotificationSink::Webhook(Webhook {
                url: "https://hooks.test/a".to_string(),
            })),
            ..Default::default()
        };

        let config = apply_overrides(config, Some("https://discord.test/env".to_string()), None);

        assert_matches!(
            config.notifications,
            Some(NotificationSink::Discord(Discord { ref url, user_id: None })) if url == "https://discord.test/env"
        );
    }

    #[test]
    fn test_data_dir_override_keeps_limits() {
        let config = Config {
            storage: Some(StorageConfig::Files {
                path: PathBuf::from("./data"),
                summary_cap: 7,
                history_days: 3,
            }),
            notifications: discord(None),
            ..Default::default()
        };

        let config = apply_overrides(config, None, Some(PathBuf::from("/srv/pulse")));

        assert_matches!(
            config.storage,
            Some(StorageConfig::Files { ref path, summary_cap: 7, history_days: 3 }) if path == &PathBuf::from("/srv/pulse")
        );
        assert_eq!(config.notifications, discord(None));
    }

    #[test]
    fn test_data_dir_override_on_default_storage() {
        let config = apply_overrides(Config::default(), None, Some(PathBuf::from("/srv/pulse")));

        let summary_cap = default_summary_cap();
        let history_days = default_history_days();
        assert_matches!(
            config.storage,
            Some(StorageConfig::Files { ref path, summary_cap: cap, history_days: days })
                if path == &PathBuf::from("/srv/pulse") && cap == summary_cap && days == history_days
        );
    }

    #[test]
    fn test_data_dir_override_leaves_memory_backend() {
        let config = Config {
            storage: Some(StorageConfig::None),
            ..Default::default()
        };

        let config = apply_overrides(config, None, Some(PathBuf::from("/srv/pulse")));

        assert_matches!(config.storage, Some(StorageConfig::None));
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let config = apply_overrides(
            Config {
                notifications: discord(Some("42")),
                ..Default::default()
            },
            None,
            None,
        );

        assert_eq!(config.notifications, discord(Some("42")));
        assert!(config.storage.is_none());
    }
}
