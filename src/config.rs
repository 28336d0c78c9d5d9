//! Shell configuration: window defaults, auth sources and the launcher list.
//!
//! Built-in defaults are spelled out in [`DEFAULT_CONFIG_TOML`] so
//! `--print-default-config` and the parser can never disagree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use indoc::indoc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AllowList, AuthToken};
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::origin::Origin;
use crate::window::{AppKind, Size, WindowId};

pub const DEFAULT_CONFIG_TOML: &str = indoc! {r#"
    [shell]
    exclusive_focus = false
    window_width = 56
    window_height = 16

    [auth.origins]
    tasks = "https://gestionnairedetaches.netlify.app"
    bookmarks = "https://signets.netlify.app"
    identity = "http://localhost:5173"

    [[launcher]]
    id = "bookmarks"
    kind = "bookmarks"
    title = "Signets"
    url = "https://signets.netlify.app"

    [[launcher]]
    id = "tasks"
    kind = "tasks"
    title = "Tâches"
    url = "https://gestionnairedetaches.netlify.app"

    [[launcher]]
    id = "identity"
    kind = "identity"
    title = "Générateur d'identité"
    url = "http://localhost:5173"
    favoritable = true
"#};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate launcher id '{0}'")]
    DuplicateLauncher(String),
    #[error("launcher '{id}' has an invalid url '{url}': {source}")]
    InvalidUrl {
        id: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("launcher '{id}' embeds origin {origin}, which is not the [auth.origins] entry for {kind}")]
    OriginNotAllowed {
        id: String,
        kind: AppKind,
        origin: String,
    },
    #[error("launchers '{first}' and '{second}' both embed origin {origin}")]
    DuplicateOrigin {
        first: String,
        second: String,
        origin: String,
    },
    #[error("window size must be at least {min_width}x{min_height}")]
    WindowTooSmall { min_width: u16, min_height: u16 },
    #[error("launcher '{id}' window size must be at least {min_width}x{min_height}")]
    LauncherTooSmall {
        id: String,
        min_width: u16,
        min_height: u16,
    },
}

const MIN_WINDOW_WIDTH: u16 = 12;
const MIN_WINDOW_HEIGHT: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSection {
    pub exclusive_focus: bool,
    pub window_width: u16,
    pub window_height: u16,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            exclusive_focus: false,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    /// Fixed token handed to surfaces. Requires `uid`.
    pub token: Option<String>,
    pub uid: Option<String>,
    /// Command printing `{"token": .., "uid": ..}`; wins over `token`.
    pub token_command: Option<String>,
    /// Allow-list: the one origin trusted per application kind.
    pub origins: BTreeMap<AppKind, String>,
}

impl AuthSection {
    pub fn static_token(&self) -> Option<AuthToken> {
        match (&self.token, &self.uid) {
            (Some(token), Some(uid)) => Some(AuthToken::new(token.clone(), uid.clone())),
            _ => None,
        }
    }

    /// Origins are normalized through URL parsing, so a trailing slash or
    /// path in the config does not silently break the exact-match check.
    pub fn allow_list(&self) -> AllowList {
        let mut list = AllowList::new();
        for (kind, raw) in &self.origins {
            let origin = Origin::from_url(raw).unwrap_or_else(|_| Origin::new(raw.clone()));
            list.insert(*kind, origin);
        }
        list
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    pub id: String,
    pub kind: AppKind,
    pub title: String,
    pub url: String,
    /// Shown in the dock only while favorited.
    #[serde(default)]
    pub favoritable: bool,
    /// Never embedded: clicking opens the system browser.
    #[serde(default)]
    pub external_only: bool,
    /// Overrides `[shell] window_width` for this launcher's window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
}

impl LauncherConfig {
    pub fn window_id(&self) -> WindowId {
        WindowId::new(self.id.clone())
    }

    pub fn origin(&self) -> Result<Origin, url::ParseError> {
        Origin::from_url(&self.url)
    }

    /// Initial window size, falling back to the shell-wide default per axis.
    pub fn window_size(&self, shell: &ShellSection) -> Size {
        Size::new(
            self.width.unwrap_or(shell.window_width),
            self.height.unwrap_or(shell.window_height),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
    #[serde(default)]
    pub shell: ShellSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default, rename = "launcher")]
    pub launchers: Vec<LauncherConfig>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        // Empty launcher list if the built-in document fails to parse.
        toml::from_str(DEFAULT_CONFIG_TOML).unwrap_or(Self {
            shell: ShellSection::default(),
            auth: AuthSection::default(),
            launchers: Vec::new(),
        })
    }
}

impl ShellConfig {
    /// Parse and validate a TOML document. Sections left out fall back to
    /// the built-in defaults: a file with only `[shell]` still gets the
    /// default launchers and allow-list.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let mut config: ShellConfig = toml::from_str(source)?;
        let defaults = ShellConfig::default();
        if config.launchers.is_empty() {
            config.launchers = defaults.launchers;
        }
        if config.auth.origins.is_empty() {
            config.auth.origins = defaults.auth.origins;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&source)?;
        tracing::debug!(path = %path.display(), launchers = config.launchers.len(), "config loaded");
        Ok(config)
    }

    /// Load `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.window_width < MIN_WINDOW_WIDTH
            || self.shell.window_height < MIN_WINDOW_HEIGHT
        {
            return Err(ConfigError::WindowTooSmall {
                min_width: MIN_WINDOW_WIDTH,
                min_height: MIN_WINDOW_HEIGHT,
            });
        }
        let allow = self.auth.allow_list();
        let mut seen = BTreeSet::new();
        // Relay messages are attributed by origin: one embedded launcher each.
        let mut embedded: BTreeMap<Origin, &str> = BTreeMap::new();
        for launcher in &self.launchers {
            if !seen.insert(launcher.id.as_str()) {
                return Err(ConfigError::DuplicateLauncher(launcher.id.clone()));
            }
            let size = launcher.window_size(&self.shell);
            if size.width < MIN_WINDOW_WIDTH || size.height < MIN_WINDOW_HEIGHT {
                return Err(ConfigError::LauncherTooSmall {
                    id: launcher.id.clone(),
                    min_width: MIN_WINDOW_WIDTH,
                    min_height: MIN_WINDOW_HEIGHT,
                });
            }
            let origin = launcher
                .origin()
                .map_err(|source| ConfigError::InvalidUrl {
                    id: launcher.id.clone(),
                    url: launcher.url.clone(),
                    source,
                })?;
            if launcher.external_only {
                continue;
            }
            if origin.is_opaque() || allow.origin_for(launcher.kind) != Some(&origin) {
                return Err(ConfigError::OriginNotAllowed {
                    id: launcher.id.clone(),
                    kind: launcher.kind,
                    origin: origin.to_string(),
                });
            }
            if let Some(first) = embedded.insert(origin.clone(), launcher.id.as_str()) {
                return Err(ConfigError::DuplicateOrigin {
                    first: first.to_string(),
                    second: launcher.id.clone(),
                    origin: origin.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn launcher(&self, id: &WindowId) -> Option<&LauncherConfig> {
        self.launchers.iter().find(|l| l.id == id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults_parse_and_validate() {
        let config = ShellConfig::default();
        assert_eq!(config.launchers.len(), 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.shell.window_width, DEFAULT_WINDOW_WIDTH);
        let identity = config.launcher(&WindowId::new("identity")).unwrap();
        assert!(identity.favoritable);
        assert!(!identity.external_only);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = ShellConfig::from_toml("[shell]\nexclusive_focus = true\n").unwrap();
        assert!(config.shell.exclusive_focus);
        assert_eq!(config.shell.window_height, DEFAULT_WINDOW_HEIGHT);
        assert_eq!(config.launchers, ShellConfig::default().launchers);
        assert!(
            config
                .auth
                .allow_list()
                .contains(&Origin::new("https://signets.netlify.app"))
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let source = indoc! {r#"
            [[launcher]]
            id = "tasks"
            kind = "tasks"
            title = "A"
            url = "https://gestionnairedetaches.netlify.app"

            [[launcher]]
            id = "tasks"
            kind = "tasks"
            title = "B"
            url = "https://gestionnairedetaches.netlify.app"
        "#};
        assert!(matches!(
            ShellConfig::from_toml(source),
            Err(ConfigError::DuplicateLauncher(id)) if id == "tasks"
        ));
    }

    #[test]
    fn embedded_launcher_needs_allow_listed_origin() {
        let source = indoc! {r#"
            [[launcher]]
            id = "notes"
            kind = "tasks"
            title = "Notes"
            url = "https://notes.example/app"
        "#};
        assert!(matches!(
            ShellConfig::from_toml(source),
            Err(ConfigError::OriginNotAllowed { origin, .. }) if origin == "https://notes.example"
        ));
    }

    #[test]
    fn external_only_launcher_skips_allow_list() {
        let source = indoc! {r#"
            [[launcher]]
            id = "docs"
            kind = "bookmarks"
            title = "Docs"
            url = "https://docs.example"
            external_only = true
        "#};
        let config = ShellConfig::from_toml(source).unwrap();
        assert!(config.launchers[0].external_only);
    }

    #[test]
    fn bad_url_and_unknown_keys_are_errors() {
        let bad_url = indoc! {r#"
            [[launcher]]
            id = "x"
            kind = "tasks"
            title = "X"
            url = "not a url"
        "#};
        assert!(matches!(
            ShellConfig::from_toml(bad_url),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ShellConfig::from_toml("[shell]\nwobble = 1\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn tiny_windows_are_rejected() {
        assert!(matches!(
            ShellConfig::from_toml("[shell]\nwindow_width = 3\n"),
            Err(ConfigError::WindowTooSmall { .. })
        ));
    }

    #[test]
    fn static_token_needs_both_fields() {
        let mut auth = AuthSection {
            token: Some("T".into()),
            ..AuthSection::default()
        };
        assert_eq!(auth.static_token(), None);
        auth.uid = Some("U".into());
        assert_eq!(auth.static_token(), Some(AuthToken::new("T", "U")));
    }

    #[test]
    fn allow_list_normalizes_configured_origins() {
        let mut auth = AuthSection::default();
        auth.origins
            .insert(AppKind::Tasks, "https://gestionnairedetaches.netlify.app/".into());
        assert!(
            auth.allow_list()
                .contains(&Origin::new("https://gestionnairedetaches.netlify.app"))
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ShellConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn origin_must_match_the_launchers_kind() {
        let source = indoc! {r#"
            [[launcher]]
            id = "identity"
            kind = "identity"
            title = "Identité"
            url = "https://gestionnairedetaches.netlify.app"
        "#};
        assert!(matches!(
            ShellConfig::from_toml(source),
            Err(ConfigError::OriginNotAllowed { kind: AppKind::Identity, .. })
        ));
    }

    #[test]
    fn two_embedded_launchers_cannot_share_an_origin() {
        let source = indoc! {r#"
            [[launcher]]
            id = "tasks"
            kind = "tasks"
            title = "A"
            url = "https://gestionnairedetaches.netlify.app"

            [[launcher]]
            id = "tasks-again"
            kind = "tasks"
            title = "B"
            url = "https://gestionnairedetaches.netlify.app/other"
        "#};
        assert!(matches!(
            ShellConfig::from_toml(source),
            Err(ConfigError::DuplicateOrigin { first, second, .. })
                if first == "tasks" && second == "tasks-again"
        ));
    }

    #[test]
    fn launcher_size_overrides_shell_default() {
        let source = indoc! {r#"
            [[launcher]]
            id = "bookmarks"
            kind = "bookmarks"
            title = "Signets"
            url = "https://signets.netlify.app"
            width = 80
        "#};
        let config = ShellConfig::from_toml(source).unwrap();
        assert_eq!(
            config.launchers[0].window_size(&config.shell),
            Size::new(80, DEFAULT_WINDOW_HEIGHT)
        );

        let tiny = source.replace("width = 80", "height = 2");
        assert!(matches!(
            ShellConfig::from_toml(&tiny),
            Err(ConfigError::LauncherTooSmall { id, .. }) if id == "bookmarks"
        ));
    }
}
