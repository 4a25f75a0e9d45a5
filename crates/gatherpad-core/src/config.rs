use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

pub const DEFAULT_DATA_DIR: &str = "data/mhw_jh";
pub const DEFAULT_MAX_ENTRIES: usize = 5;
pub const DEFAULT_FILE_PREFIX: &str = "p_notepad";
pub const DEFAULT_KEYWORDS: &str = "集会,集会码";

/// Storage and behavior settings consumed by the notepad core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotepadConfig {
    pub data_dir: PathBuf,
    pub max_entries: usize,
    pub file_prefix: String,
    pub enable_duplicate_check: bool,
    pub enable_timestamp: bool,
}

impl Default for NotepadConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_entries: DEFAULT_MAX_ENTRIES,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            enable_duplicate_check: true,
            enable_timestamp: true,
        }
    }
}

impl NotepadConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_chats: Vec<i64>,

    // Notepad
    pub notepad: NotepadConfig,

    // Dispatch
    pub commands_enabled: bool,
    pub activation_keywords: Vec<String>,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        let telegram_allowed_chats = parse_csv_i64(env_str("TELEGRAM_ALLOWED_CHATS"));

        let max_entries = env_usize("GATHERPAD_MAX_ENTRIES")
            .unwrap_or(DEFAULT_MAX_ENTRIES)
            .max(1);

        let notepad = NotepadConfig {
            data_dir: env_path("GATHERPAD_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()),
            max_entries,
            file_prefix: env_str("GATHERPAD_FILE_PREFIX")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            enable_duplicate_check: env_bool("GATHERPAD_DUPLICATE_CHECK").unwrap_or(true),
            enable_timestamp: env_bool("GATHERPAD_TIMESTAMP").unwrap_or(true),
        };
        validate_file_prefix(&notepad.file_prefix)?;

        let commands_enabled = env_bool("GATHERPAD_COMMANDS_ENABLED").unwrap_or(false);
        let mut activation_keywords = parse_csv(
            env_str("GATHERPAD_KEYWORDS").or_else(|| Some(DEFAULT_KEYWORDS.to_string())),
        );
        // Longest first so "集会码" wins over its prefix "集会".
        activation_keywords.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));

        let audit_log_path = env_path("AUDIT_LOG_PATH");
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_chats,
            notepad,
            commands_enabled,
            activation_keywords,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn validate_file_prefix(prefix: &str) -> Result<()> {
    let ok = prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        return Ok(());
    }
    Err(Error::InvalidPath {
        path: PathBuf::from(prefix),
        reason: "GATHERPAD_FILE_PREFIX may only contain [A-Za-z0-9_-]".to_string(),
    })
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notepad_defaults_match_plugin_defaults() {
        let cfg = NotepadConfig::default();
        assert_eq!(cfg.data_dir, PathBuf::from("data/mhw_jh"));
        assert_eq!(cfg.max_entries, 5);
        assert_eq!(cfg.file_prefix, "p_notepad");
        assert!(cfg.enable_duplicate_check);
        assert!(cfg.enable_timestamp);
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        for s in ["1", "true", "YES", " on "] {
            assert!(parse_bool(s), "{s}");
        }
        for s in ["0", "false", "off", ""] {
            assert!(!parse_bool(s), "{s}");
        }
    }

    #[test]
    fn csv_helpers_skip_garbage() {
        assert_eq!(
            parse_csv_i64(Some("1, -100200, x,,3".to_string())),
            vec![1, -100200, 3]
        );
        assert_eq!(
            parse_csv(Some(" 集会 ,,集会码".to_string())),
            vec!["集会".to_string(), "集会码".to_string()]
        );
    }

    #[test]
    fn file_prefix_rejects_path_separators() {
        assert!(validate_file_prefix("p_notepad").is_ok());
        assert!(validate_file_prefix("../evil").is_err());
        assert!(validate_file_prefix("a/b").is_err());
    }
}
