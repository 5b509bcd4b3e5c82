use crate::error::ConfigError;
use crate::hooks::{HookCommand, HookFailurePolicy, HookName, OutputMode};
use crate::parser::PageBreak;
use crate::sync::SubscriberPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The environment variable used to find the user configuration file.
pub const CONFIG_PATH_ENV: &str = "SLIDEHOOK_CONFIG";

/// The resolved configuration of a presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The title of the presentation.
    pub title: String,

    /// The page break condition.
    pub page_break: PageBreak,

    /// The commands executed during the presentation.
    pub commands: Commands,

    pub hooks: HookSettings,

    pub sync: SyncSettings,
}

/// A partial configuration, as written in a file or in front matter.
///
/// Fragments are layered with [`ConfigFragment::merge`] and resolved into a
/// [`Config`] once all layers are known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_break: Option<PageBreak>,

    #[serde(default)]
    pub commands: Commands,

    #[serde(default)]
    pub hooks: HooksFragment,

    #[serde(default)]
    pub sync: SyncFragment,
}

/// The commands executed at each lifecycle point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commands {
    /// Executed once after the presentation has been loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize: Option<HookCommand>,

    /// Executed after every page change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<HookCommand>,

    /// Executed once when the presentation ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalize: Option<HookCommand>,
}

impl Commands {
    /// The command configured for a hook, if any.
    pub fn get(&self, hook: HookName) -> Option<&HookCommand> {
        match hook {
            HookName::Initialize => self.initialize.as_ref(),
            HookName::Update => self.update.as_ref(),
            HookName::Finalize => self.finalize.as_ref(),
        }
    }

    /// Layers `other` over `self`, one hook at a time.
    pub fn merge(self, other: Commands) -> Commands {
        Commands {
            initialize: other.initialize.or(self.initialize),
            update: other.update.or(self.update),
            finalize: other.finalize.or(self.finalize),
        }
    }

    /// The hooks that have a command configured.
    pub fn configured(&self) -> Vec<HookName> {
        HookName::ALL
            .into_iter()
            .filter(|hook| self.get(*hook).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HooksFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<HookFailurePolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,
}

/// How hook failures and hook output are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookSettings {
    pub on_failure: HookFailurePolicy,
    pub output: OutputMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<SubscriberPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Page-sync channel settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    /// The named pipe to write page numbers to. No pipe when unset.
    pub path: Option<PathBuf>,

    /// What to do when no viewer is reading the pipe.
    pub subscriber: SubscriberPolicy,

    /// Upper bound on waiting for a reader or for pipe capacity.
    pub timeout: Option<Duration>,
}

impl ConfigFragment {
    /// Parses a fragment from TOML.
    ///
    /// # Arguments
    ///
    /// * `source` - The TOML text
    /// * `origin` - A description of where the text came from, for errors
    /// * `line_offset` - Lines preceding `source` in its file
    pub fn from_toml(source: &str, origin: &str, line_offset: usize) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| line_column(source, span.start))
                .unwrap_or((1, 1));
            ConfigError::Syntax {
                origin: origin.to_string(),
                line: line + line_offset,
                column,
                message: e.message().to_string(),
            }
        })
    }

    /// Loads the user configuration file.
    ///
    /// If `SLIDEHOOK_CONFIG` is set, that file must exist. Otherwise the
    /// platform config directory is consulted and a missing file yields an
    /// empty fragment.
    pub fn load_user() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::load_from(PathBuf::from(path));
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads a fragment from a TOML file.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&contents, &path.display().to_string(), 0)
    }

    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/slidehook/config.toml
    /// - Linux: ~/.config/slidehook/config.toml
    /// - Windows: %APPDATA%/slidehook/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slidehook").join("config.toml"))
    }

    /// Resolves a relative `sync.path` against `base`.
    pub fn relative_to(mut self, base: &Path) -> ConfigFragment {
        self.sync.path = self.sync.path.take().map(|path| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        });
        self
    }

    /// Layers `other` over `self`; values present in `other` win.
    pub fn merge(self, other: ConfigFragment) -> ConfigFragment {
        ConfigFragment {
            title: other.title.or(self.title),
            page_break: other.page_break.or(self.page_break),
            commands: self.commands.merge(other.commands),
            hooks: HooksFragment {
                on_failure: other.hooks.on_failure.or(self.hooks.on_failure),
                output: other.hooks.output.or(self.hooks.output),
            },
            sync: SyncFragment {
                path: other.sync.path.or(self.sync.path),
                subscriber: other.sync.subscriber.or(self.sync.subscriber),
                timeout_ms: other.sync.timeout_ms.or(self.sync.timeout_ms),
            },
        }
    }
}

impl Config {
    /// Resolves layered fragments, later layers winning.
    ///
    /// The usual order is user file, document front matter, command line.
    pub fn layered(layers: impl IntoIterator<Item = ConfigFragment>) -> Self {
        layers
            .into_iter()
            .fold(ConfigFragment::default(), ConfigFragment::merge)
            .into()
    }
}

impl From<ConfigFragment> for Config {
    fn from(fragment: ConfigFragment) -> Self {
        Self {
            title: fragment.title.unwrap_or_else(default_title),
            page_break: fragment.page_break.unwrap_or_default(),
            commands: fragment.commands,
            hooks: HookSettings {
                on_failure: fragment.hooks.on_failure.unwrap_or_default(),
                output: fragment.hooks.output.unwrap_or_default(),
            },
            sync: SyncSettings {
                path: fragment.sync.path,
                subscriber: fragment.sync.subscriber.unwrap_or_default(),
                timeout: fragment.sync.timeout_ms.map(Duration::from_millis),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigFragment::default().into()
    }
}

fn default_title() -> String {
    "Presentation".to_string()
}

/// Converts a byte offset into a 1-based (line, column) pair.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = source[line_start..offset].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
title = "Demo"
page_break = { type = "heading", level = 2 }

[commands.initialize]
binary = "make"
arguments = ["watch"]

[commands.update]
binary = "render"
arguments = ["${presentation.path}", "${page.current}"]

[hooks]
on_failure = "abort"
output = "inherit"

[sync]
path = "/tmp/viewer.fifo"
subscriber = "block"
timeout_ms = 250
"#;

    #[test]
    fn test_parse_full_fragment() {
        let fragment = ConfigFragment::from_toml(FULL, "test", 0).unwrap();
        let config = Config::from(fragment);

        assert_eq!(config.title, "Demo");
        assert_eq!(config.page_break, PageBreak::Heading { level: 2 });
        assert_eq!(config.commands.initialize.as_ref().unwrap().binary, "make");
        assert_eq!(
            config.commands.update.as_ref().unwrap().arguments,
            ["${presentation.path}", "${page.current}"]
        );
        assert!(config.commands.finalize.is_none());
        assert_eq!(config.hooks.on_failure, HookFailurePolicy::Abort);
        assert_eq!(config.hooks.output, OutputMode::Inherit);
        assert_eq!(config.sync.path, Some(PathBuf::from("/tmp/viewer.fifo")));
        assert_eq!(config.sync.subscriber, SubscriberPolicy::Block);
        assert_eq!(config.sync.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.title, "Presentation");
        assert_eq!(config.page_break, PageBreak::ThematicBreak);
        assert!(config.commands.configured().is_empty());
        assert_eq!(config.hooks.on_failure, HookFailurePolicy::Warn);
        assert_eq!(config.hooks.output, OutputMode::Discard);
        assert_eq!(config.sync.subscriber, SubscriberPolicy::FailFast);
        assert!(config.sync.path.is_none());
        assert!(config.sync.timeout.is_none());
    }

    #[test]
    fn test_merge_prefers_later_layer_per_hook() {
        let user = ConfigFragment::from_toml(FULL, "user", 0).unwrap();
        let document = ConfigFragment::from_toml(
            "title = \"Override\"\n[commands.update]\nbinary = \"other\"\n",
            "front matter",
            1,
        )
        .unwrap();

        let config = Config::from(user.merge(document));
        assert_eq!(config.title, "Override");
        assert_eq!(config.commands.update.as_ref().unwrap().binary, "other");
        assert!(config.commands.update.as_ref().unwrap().arguments.is_empty());
        assert_eq!(config.commands.initialize.as_ref().unwrap().binary, "make");
        assert_eq!(config.sync.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_layered_resolution() {
        let user = ConfigFragment::from_toml(FULL, "user", 0).unwrap();
        let document = ConfigFragment::from_toml("title = \"Talk\"\n", "front matter", 1).unwrap();
        let cli = ConfigFragment {
            sync: SyncFragment {
                path: Some(PathBuf::from("/run/pages")),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = Config::layered([user, document, cli]);
        assert_eq!(config.title, "Talk");
        assert_eq!(config.sync.path, Some(PathBuf::from("/run/pages")));
        assert_eq!(config.sync.subscriber, SubscriberPolicy::Block);
        assert_eq!(Config::layered([]), Config::default());
    }

    #[test]
    fn test_unknown_hook_is_rejected() {
        let err = ConfigFragment::from_toml("[commands.upadte]\nbinary = \"x\"\n", "test", 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = ConfigFragment::from_toml("title = \"ok\"\ntitle = = 3\n", "test", 10)
            .unwrap_err();
        match err {
            ConfigError::Syntax { line, .. } => assert_eq!(line, 12),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ConfigFragment::load_from(PathBuf::from("/nonexistent/slidehook.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("abc\ndef", 5), (2, 2));
        assert_eq!(line_column("abc\n", 4), (2, 1));
    }
}
