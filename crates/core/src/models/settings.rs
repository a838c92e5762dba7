use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

/// Name of the per-user data directory (under the home directory).
pub const APP_DIR_NAME: &str = ".deposit-tracker";

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const RATES_FILE_NAME: &str = "rates.sqlite";
pub const DEPOSITS_FILE_NAME: &str = "deposits.json";

/// User-configurable settings, read from `settings.json` in the data directory.
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The currency all costs and profits are reported in.
    pub local_currency: String,

    /// Don't connect to rate sources; use only previously downloaded rates.
    pub offline: bool,

    /// Maximum distance (days) between a requested date and the rate used for it.
    /// Ten days cover the New Year holidays, when banks publish no rates.
    pub accuracy_window_days: i64,

    /// How far back rates are downloaded when the archive is empty.
    pub history_years: u32,

    pub network_timeout_secs: u64,

    /// Directory holding the rate archive and the deposit list.
    /// Defaults to `~/.deposit-tracker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            local_currency: "RUB".to_string(),
            offline: false,
            accuracy_window_days: 10,
            history_years: 10,
            network_timeout_secs: 30,
            data_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from `<data_dir>/settings.json`, falling back to defaults
    /// when the file doesn't exist.
    pub fn load(data_dir: &Path) -> Result<Self, CoreError> {
        let path = data_dir.join(SETTINGS_FILE_NAME);
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(CoreError::FileIO {
                    path,
                    message: e.to_string(),
                })
            }
        };
        if settings.data_dir.is_none() {
            settings.data_dir = Some(data_dir.to_path_buf());
        }
        Ok(settings)
    }

    pub fn from_json(contents: &str) -> Result<Self, CoreError> {
        let mut settings: Settings = serde_json::from_str(contents)
            .map_err(|e| CoreError::InvalidSettings(e.to_string()))?;
        settings.local_currency = settings.local_currency.trim().to_uppercase();
        if settings.accuracy_window_days < 0 {
            return Err(CoreError::InvalidSettings(
                "accuracy_window_days must not be negative".into(),
            ));
        }
        Ok(settings)
    }

    /// `~/.deposit-tracker`, or the current directory when there is no home.
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    pub fn rates_path(&self) -> PathBuf {
        self.data_dir().join(RATES_FILE_NAME)
    }

    pub fn deposits_path(&self) -> PathBuf {
        self.data_dir().join(DEPOSITS_FILE_NAME)
    }
}
