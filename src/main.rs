use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use embed_wm::auth::{CommandTokenProvider, EnvTokenProvider, StaticTokenProvider, TokenProvider};
use embed_wm::config::{DEFAULT_CONFIG_TOML, ShellConfig};
use embed_wm::dock::SystemBrowser;
use embed_wm::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use embed_wm::favorites::{Favorites, JsonFileFavorites, MemoryFavorites};
use embed_wm::log_buffer::{self, LogHandle};
use embed_wm::runner::run_shell;
use embed_wm::shell::Shell;
use embed_wm::tracing_sub;

/// Terminal desktop shell for remote mini-apps.
#[derive(Debug, Parser)]
#[command(name = "embed-wm", version, about)]
struct Cli {
    /// Shell configuration file (TOML). Built-in defaults when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file the dock's favorites are kept in. In-memory when omitted.
    #[arg(long, value_name = "PATH")]
    favorites: Option<PathBuf>,

    /// Minimize every other window when one is opened.
    #[arg(long)]
    exclusive_focus: bool,

    /// Command printing `{"token":..,"uid":..}` on stdout; overrides the
    /// config's `auth.token_command`.
    #[arg(long, value_name = "COMMAND")]
    token_command: Option<String>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: tracing::Level,

    /// Print the built-in configuration and exit.
    #[arg(long)]
    print_default_config: bool,
}

fn token_provider(cli: &Cli, config: &ShellConfig) -> io::Result<Arc<dyn TokenProvider>> {
    let command = cli
        .token_command
        .as_deref()
        .or(config.auth.token_command.as_deref());
    if let Some(command) = command {
        let provider = CommandTokenProvider::parse(command).map_err(io::Error::other)?;
        return Ok(Arc::new(provider));
    }
    if let Some(token) = config.auth.static_token() {
        return Ok(Arc::new(StaticTokenProvider::new(Some(token))));
    }
    Ok(Arc::new(EnvTokenProvider::default()))
}

fn favorites_store(cli: &Cli) -> io::Result<Box<dyn Favorites>> {
    match &cli.favorites {
        Some(path) => Ok(Box::new(
            JsonFileFavorites::open(path.clone()).map_err(io::Error::other)?,
        )),
        None => Ok(Box::new(MemoryFavorites::default())),
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if cli.print_default_config {
        print!("{DEFAULT_CONFIG_TOML}");
        return Ok(());
    }

    // Logs go to stderr until the log buffer is registered below.
    tracing_sub::init(cli.log_level);
    let mut config = ShellConfig::load_or_default(cli.config.as_deref()).map_err(io::Error::other)?;
    if cli.exclusive_focus {
        config.shell.exclusive_focus = true;
    }
    let provider = token_provider(&cli, &config)?;
    let favorites = favorites_store(&cli)?;

    let log = LogHandle::default();
    log_buffer::set_global_log(log.clone());
    log_buffer::install_panic_hook();
    tracing::info!(launchers = config.launchers.len(), "embed-wm starting");

    let mut shell = Shell::new(config, provider, favorites, Box::new(SystemBrowser))
        .with_log(log.clone());
    let mut output = ConsoleOutputDriver::new()?;
    let result = run_shell(
        &mut shell,
        ConsoleInputDriver::new(),
        &mut output,
        Duration::from_millis(16),
    );
    drop(output);

    if result.is_err() {
        for line in log.take_lines() {
            eprintln!("{line}");
        }
    }
    result
}
