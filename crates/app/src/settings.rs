use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use finassist_chat::{UserId, UserResolution};
use finassist_client::HttpClientConfig;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/api";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;
pub const SETTINGS_DIRECTORY_NAME: &str = "finassist";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Overrides the settings file location.
pub const CONFIG_PATH_ENV: &str = "FINASSIST_CONFIG";
pub const ENV_PREFIX: &str = "FINASSIST_";

/// Which chat backend the shell talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mock,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    /// Signed-in user; empty means nobody is signed in.
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub mock_latency_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            base_url: default_base_url(),
            api_token: String::new(),
            user_id: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            mock_latency_ms: 0,
        }
    }
}

impl AppSettings {
    pub fn normalized(mut self) -> Self {
        self.base_url = if self.base_url.trim().is_empty() {
            default_base_url()
        } else {
            self.base_url.trim().to_string()
        };
        self.api_token = self.api_token.trim().to_string();
        self.user_id = self.user_id.trim().to_string();
        if self.request_timeout_ms == 0 {
            self.request_timeout_ms = default_request_timeout_ms();
        }

        self
    }

    /// Identity as the chat screen sees it once settings are loaded.
    pub fn resolution(&self) -> UserResolution {
        let user_id = (!self.user_id.is_empty()).then(|| UserId::new(self.user_id.clone()));
        UserResolution::from_provider(user_id, false)
    }

    pub fn to_http_config(&self) -> HttpClientConfig {
        HttpClientConfig::new(&self.base_url)
            .with_api_token(&self.api_token)
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".finassist"))
    }

    pub fn default_config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default_config_dir().join(SETTINGS_FILE_NAME))
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from(Self::figment(&config_path), &config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: AppSettings) -> Result<Arc<AppSettings>, SettingsError> {
        let normalized_settings = Arc::new(settings.normalized());
        self.persist(&normalized_settings)?;
        self.settings.store(normalized_settings.clone());
        Ok(normalized_settings)
    }

    /// Layers defaults, the JSON file and `FINASSIST_*` variables, in that order.
    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    fn load_from(figment: Figment, path: &Path) -> AppSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match figment.extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                AppSettings::default()
            }
        }
    }

    /// Stages the JSON next to the target file, then renames it into place.
    fn persist(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        let directory = self
            .config_path
            .parent()
            .filter(|directory| !directory.as_os_str().is_empty());
        if let Some(directory) = directory {
            std::fs::create_dir_all(directory).context(CreateConfigDirSnafu {
                stage: "prepare-finassist-config-dir",
                directory: directory.to_path_buf(),
            })?;
        }

        let mut encoded = serde_json::to_vec_pretty(settings).context(EncodeSettingsSnafu {
            stage: "encode-finassist-settings",
        })?;
        encoded.push(b'\n');

        let staging_path = self.config_path.with_extension("json.partial");
        std::fs::write(&staging_path, &encoded).context(StageSettingsSnafu {
            stage: "stage-finassist-settings",
            staging_path: staging_path.clone(),
        })?;
        std::fs::rename(&staging_path, &self.config_path).context(SwapSettingsSnafu {
            stage: "swap-finassist-settings",
            config_path: self.config_path.clone(),
        })?;

        tracing::info!(
            config_path = %self.config_path.display(),
            backend = ?settings.backend,
            signed_in = !settings.user_id.is_empty(),
            "finassist settings saved"
        );
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display(
        "cannot create finassist config directory {directory:?} on `{stage}` (set {CONFIG_PATH_ENV} to use another file): {source}"
    ))]
    CreateConfigDir {
        stage: &'static str,
        directory: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode finassist settings as JSON on `{stage}`: {source}"))]
    EncodeSettings {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot stage finassist settings at {staging_path:?} on `{stage}`: {source}"))]
    StageSettings {
        stage: &'static str,
        staging_path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot replace finassist settings at {config_path:?} on `{stage}`: {source}"))]
    SwapSettings {
        stage: &'static str,
        config_path: PathBuf,
        source: std::io::Error,
    },
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
