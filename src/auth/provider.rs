//! Sources of the host's current identity token.
//!
//! Providers are called from worker threads, so a slow provider (an
//! external command refreshing a session) never stalls the event loop.

use std::fmt;
use std::process::Command;

use super::{AuthToken, TokenError};

pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// Fetch a fresh token. `Ok(None)` means no user is signed in.
    fn current_token(&self) -> Result<Option<AuthToken>, TokenError>;
}

/// Returns a fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<AuthToken>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<AuthToken>) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn current_token(&self) -> Result<Option<AuthToken>, TokenError> {
        Ok(self.token.clone())
    }
}

/// Reads the token and uid from environment variables on every call, so an
/// outside process can rotate them while the shell runs.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    token_var: String,
    uid_var: String,
}

impl EnvTokenProvider {
    pub const DEFAULT_TOKEN_VAR: &'static str = "EMBED_WM_TOKEN";
    pub const DEFAULT_UID_VAR: &'static str = "EMBED_WM_UID";

    pub fn new(token_var: impl Into<String>, uid_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            uid_var: uid_var.into(),
        }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOKEN_VAR, Self::DEFAULT_UID_VAR)
    }
}

impl TokenProvider for EnvTokenProvider {
    fn current_token(&self) -> Result<Option<AuthToken>, TokenError> {
        let token = std::env::var(&self.token_var).ok().filter(|t| !t.is_empty());
        let uid = std::env::var(&self.uid_var).ok().filter(|u| !u.is_empty());
        Ok(token.zip(uid).map(|(token, uid)| AuthToken { token, uid }))
    }
}

/// Runs an external command that prints `{"token": "...", "uid": "..."}`
/// (or `null` / nothing when signed out) on stdout.
#[derive(Debug, Clone)]
pub struct CommandTokenProvider {
    command: String,
    argv: Vec<String>,
}

impl CommandTokenProvider {
    pub fn parse(command: &str) -> Result<Self, TokenError> {
        let argv =
            shell_words::split(command).map_err(|e| TokenError::InvalidCommand(e.to_string()))?;
        if argv.is_empty() {
            return Err(TokenError::InvalidCommand("empty command".to_string()));
        }
        Ok(Self {
            command: command.to_string(),
            argv,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl TokenProvider for CommandTokenProvider {
    fn current_token(&self) -> Result<Option<AuthToken>, TokenError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(TokenError::InvalidCommand("empty command".to_string()));
        };
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| TokenError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(TokenError::CommandFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<Option<AuthToken>>(stdout)?)
    }
}
