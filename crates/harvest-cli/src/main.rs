//! tabharvest CLI - pull every row out of an infinite-scroll table
//!
//! Usage:
//!   harvest init                Write a default harvest.toml
//!   harvest run                 Log in (or reuse the session), navigate, extract, export
//!   harvest login               Force a fresh login and save the session

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvest_browser::{screenshot, BrowserSession, BrowserTableView, Navigator, SessionManager};
use harvest_collector::{Harvest, IncrementalCollector};
use harvest_core::config::DEFAULT_CONFIG_FILE;
use harvest_core::{
    export, ChainedCredentials, EnvCredentials, FileCredentials, HarvestConfig, HarvestError,
    StaticCredentials,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(author, version, about = "Extract every row from a lazily rendered web table")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Establish a session, navigate to the table and extract every row
    Run {
        #[command(flatten)]
        browser: BrowserArgs,

        /// Output JSON file (overrides paths.output_file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pause after each scroll in milliseconds (overrides collector.settle_ms)
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Skip the saved session and log in again
        #[arg(long)]
        fresh_login: bool,
    },

    /// Log in and save the session without extracting
    Login {
        #[command(flatten)]
        browser: BrowserArgs,
    },
}

#[derive(clap::Args)]
struct BrowserArgs {
    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Attach to a browser started with --remote-debugging-port
    #[arg(long, value_name = "PORT")]
    connect: Option<u16>,

    /// Session file (overrides paths.session_file)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Login email; takes precedence over the credentials file
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Login password; takes precedence over the credentials file
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Write a full-page PNG here if the run fails after the browser starts
    #[arg(long, value_name = "PNG")]
    screenshot_on_failure: Option<PathBuf>,
}

impl BrowserArgs {
    fn apply(&self, config: &mut HarvestConfig) {
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(path) = &self.session_file {
            config.paths.session_file = path.clone();
        }
    }

    /// Flags first, then the credentials file, then the environment
    fn credentials(&self, config: &HarvestConfig) -> ChainedCredentials {
        let mut chain = ChainedCredentials::new();
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            chain = chain.with(StaticCredentials::new(username.clone(), password.clone()));
        }
        chain
            .with(FileCredentials::new(&config.paths.credentials_file))
            .with(EnvCredentials)
    }

    async fn open(&self, config: &HarvestConfig) -> harvest_core::Result<BrowserSession> {
        match self.connect {
            Some(port) => BrowserSession::connect(port, &config.browser).await,
            None => BrowserSession::launch(&config.browser).await,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    if let Err(e) = dispatch(cli).await {
        error!("{:#}", e);
        let code = e
            .downcast_ref::<HarvestError>()
            .map(HarvestError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => cmd_init(&cli.config, force).await,
        Commands::Run {
            browser,
            output,
            settle_ms,
            fresh_login,
        } => cmd_run(&cli.config, browser, output, settle_ms, fresh_login).await,
        Commands::Login { browser } => cmd_login(&cli.config, browser).await,
    }
}

fn load_config(path: &Path) -> Result<HarvestConfig> {
    let config = HarvestConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(config)
}

async fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }

    HarvestConfig::write_default(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Put IDEN_USERNAME and IDEN_PASSWORD in config.json or the environment.");
    Ok(())
}

async fn cmd_run(
    config_path: &Path,
    browser: BrowserArgs,
    output: Option<PathBuf>,
    settle_ms: Option<u64>,
    fresh_login: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    browser.apply(&mut config);
    if let Some(path) = output {
        config.paths.output_file = path;
    }
    if let Some(ms) = settle_ms {
        config.collector.settle_ms = ms;
    }
    config.validate()?;

    let credentials = browser.credentials(&config);
    let session = browser.open(&config).await?;

    let result = extract(&session, &config, &credentials, fresh_login).await;
    let harvest = match result {
        Ok(harvest) => harvest,
        Err(e) => {
            screenshot::capture_on_failure(&session, browser.screenshot_on_failure.as_deref())
                .await;
            session.close().await?;
            return Err(e.into());
        }
    };
    session.close().await?;

    export::write_json(&config.paths.output_file, &harvest.rows)
        .await
        .with_context(|| format!("Failed to write {}", config.paths.output_file.display()))?;

    println!(
        "Extraction complete ({}). Saved {} of {} rows to {}.",
        harvest.stop,
        harvest.rows.len(),
        harvest.total,
        config.paths.output_file.display()
    );
    Ok(())
}

/// Session, navigation and collection; nothing is written here
async fn extract(
    session: &BrowserSession,
    config: &HarvestConfig,
    credentials: &ChainedCredentials,
    fresh_login: bool,
) -> harvest_core::Result<Harvest> {
    let manager = SessionManager::new(config);
    if fresh_login {
        manager.login(session, credentials).await?;
    } else {
        let outcome = manager.establish(session, credentials).await?;
        info!("Session ready ({})", outcome);
    }

    Navigator::new(&config.navigation).run(session).await?;

    let view = BrowserTableView::new(session, config.table.clone());
    let collector = IncrementalCollector::new(view, &config.collector);
    info!("Starting scraper...");
    collector.run().await
}

async fn cmd_login(config_path: &Path, browser: BrowserArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    browser.apply(&mut config);

    let credentials = browser.credentials(&config);
    let session = browser.open(&config).await?;

    let manager = SessionManager::new(&config);
    if let Err(e) = manager.login(&session, &credentials).await {
        screenshot::capture_on_failure(&session, browser.screenshot_on_failure.as_deref()).await;
        session.close().await?;
        return Err(e.into());
    }
    session.close().await?;

    println!("Session saved to {}", manager.session_file().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::parse_from([
            "harvest",
            "run",
            "--headless",
            "--session-file",
            "s.json",
            "--output",
            "out.json",
            "--settle-ms",
            "50",
        ]);
        let Commands::Run {
            browser,
            output,
            settle_ms,
            fresh_login,
        } = cli.command
        else {
            panic!("expected run");
        };

        let mut config = HarvestConfig::default();
        browser.apply(&mut config);
        assert!(config.browser.headless);
        assert_eq!(config.paths.session_file, PathBuf::from("s.json"));
        assert_eq!(output, Some(PathBuf::from("out.json")));
        assert_eq!(settle_ms, Some(50));
        assert!(!fresh_login);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_verbose_accepted_after_subcommand() {
        let cli = Cli::parse_from(["harvest", "run", "-v", "--headless"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run { .. }));

        let cli = Cli::parse_from(["harvest", "--verbose", "login"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_username_requires_password() {
        let result = Cli::try_parse_from(["harvest", "login", "--username", "me"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_credentials_take_precedence() {
        use harvest_core::CredentialProvider;

        let cli = Cli::parse_from([
            "harvest",
            "login",
            "--username",
            "flag@example.com",
            "--password",
            "pw",
        ]);
        let Commands::Login { browser } = cli.command else {
            panic!("expected login");
        };

        let creds = browser.credentials(&HarvestConfig::default()).credentials().unwrap();
        assert_eq!(creds.username, "flag@example.com");
    }

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        cmd_init(&path, false).await.unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.collector.settle_ms, 1000);
    }
}
