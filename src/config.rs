use arc_swap::ArcSwap;
use serde::Deserialize;
use std::{
    error::Error,
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

const DEFAULT_TRIGGER: &str = "silencer";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub token: String,
    pub database_url: String,
    #[serde(default)]
    pub silencer: PluginSettings,
}

impl Config {
    pub fn read_from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(data).map_err(ConfigError::ParseYaml)
    }
}

/// Runtime settings of the silencer command.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PluginSettings {
    /// Command name without the leading slash.
    pub trigger: String,
    /// Publish the list after every successful read, not only after writes.
    pub notify_on_read: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            trigger: String::from(DEFAULT_TRIGGER),
            notify_on_read: true,
        }
    }
}

impl PluginSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.trigger.is_empty() {
            return Err(SettingsError::EmptyTrigger);
        }
        if self.trigger.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(SettingsError::InvalidTrigger(self.trigger.clone()));
        }
        Ok(())
    }
}

/// Process-wide slot holding the active settings.
///
/// Readers take an immutable snapshot per command; a reload swaps the pointer
/// and never blocks them.
#[derive(Clone)]
pub struct SettingsSlot {
    inner: Arc<ArcSwap<PluginSettings>>,
}

impl SettingsSlot {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn load(&self) -> Arc<PluginSettings> {
        self.inner.load_full()
    }

    /// Installs `settings` if they are valid.
    ///
    /// The trigger is registered with the host once at startup, so it can not
    /// change on reload.
    pub fn replace(&self, settings: PluginSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let current = self.load();
        if current.trigger != settings.trigger {
            return Err(SettingsError::TriggerChanged {
                current: current.trigger.clone(),
                requested: settings.trigger,
            });
        }
        self.inner.store(Arc::new(settings));
        Ok(())
    }
}

impl Default for SettingsSlot {
    fn default() -> Self {
        Self::new(PluginSettings::default())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ParseYaml(serde_yaml::Error),
    ReadFile { source: io::Error, path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::ConfigError::*;
        match self {
            ParseYaml(err) => write!(out, "Could not parse configuration: {}", err),
            ReadFile { source, path } => {
                write!(out, "Could not read configuration file {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::ConfigError::*;
        Some(match self {
            ParseYaml(err) => err,
            ReadFile { source, .. } => source,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SettingsError {
    EmptyTrigger,
    InvalidTrigger(String),
    TriggerChanged { current: String, requested: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::SettingsError::*;
        match self {
            EmptyTrigger => write!(out, "command trigger must not be empty"),
            InvalidTrigger(trigger) => write!(out, "invalid command trigger: {:?}", trigger),
            TriggerChanged { current, requested } => write!(
                out,
                "command trigger can not change from {:?} to {:?} without a restart",
                current, requested
            ),
        }
    }
}

impl Error for SettingsError {}
