use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use spoonfollows::api::SpoonClient;
use spoonfollows::app::App;
use spoonfollows::config::{Config, PagePolicy};
use spoonfollows::query::UserQuery;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "spoonfollows")]
#[command(about = "Browse the followers, followings and mutual follows of a Spoon user")]
#[command(version)]
struct Args {
    /// @handle, numeric user id or profile URL to load on start
    user: Option<String>,

    /// Path to config file (default: ~/.config/spoonfollows/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prefix prepended to every URL-encoded request URL
    #[arg(long)]
    proxy: Option<String>,

    /// How list pagination stops
    #[arg(long, value_enum)]
    policy: Option<PagePolicy>,

    /// Page cap for the capped policy
    #[arg(long)]
    max_pages: Option<usize>,

    /// Seconds allowed for a whole load
    #[arg(long)]
    timeout: Option<u64>,

    /// Load USER once, print the result as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Write logs to this file while the TUI runs
    #[arg(long, conflicts_with = "dump")]
    log_file: Option<PathBuf>,
}

fn init_tracing(dump: bool, log_file: Option<&Path>) -> Result<()> {
    if !dump && log_file.is_none() {
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "spoonfollows=info".into());

    // The TUI owns the terminal, so it only ever logs to a file.
    let stderr_layer = dump.then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(proxy) = &args.proxy {
        config.api.proxy = Some(proxy.clone());
    }
    if let Some(policy) = args.policy {
        config.api.pagination.policy = policy;
    }
    if let Some(max_pages) = args.max_pages {
        config.api.pagination.max_pages = max_pages;
    }
    if let Some(timeout) = args.timeout {
        config.api.timeout_secs = timeout;
    }
}

async fn dump(client: &SpoonClient, user: Option<&str>) -> Result<()> {
    let Some(user) = user else {
        bail!("--dump needs a USER");
    };
    let query = UserQuery::parse(user)?;
    let snapshot = client.load(&query).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.dump, args.log_file.as_deref())?;

    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    let client = SpoonClient::from_config(&config.api);

    if args.dump {
        return dump(&client, args.user.as_deref()).await;
    }

    let mut app = App::new(client, &config.layout);
    if let Some(user) = args.user.as_deref() {
        app.submit(user);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_conflicts_with_dump() {
        let err = Args::try_parse_from(["spoonfollows", "--dump", "--log-file", "x.log", "123"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_log_file_allowed_for_tui() {
        let args = Args::try_parse_from(["spoonfollows", "--log-file", "x.log", "123"]).unwrap();
        assert_eq!(args.log_file, Some(PathBuf::from("x.log")));
        assert!(!args.dump);

        let args = Args::try_parse_from(["spoonfollows", "--dump", "123"]).unwrap();
        assert!(args.dump && args.log_file.is_none());
    }
}
