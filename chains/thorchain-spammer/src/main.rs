use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, shutdown_on_ctrl_c, LoggerConfig, RateLimiter, SpamStats, WalletManager};
use dialoguer::{theme::ColorfulTheme, Password};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thorchain_spammer::{RestClient, SpamContext, SpammerPool, StatsReport, ThorConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Transaction load generator for THORChain", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/thorchain-spammer/config.toml")]
    config: String,
    #[arg(long)]
    chain_id: Option<String>,
    /// Milliseconds between two submissions, across all spammers
    #[arg(long)]
    rate_limit: Option<u64>,
    #[arg(long)]
    spam_prefix: Option<String>,
    #[arg(long)]
    spam_password: Option<String>,
    #[arg(long)]
    node: Option<String>,
    #[arg(long)]
    keystore_dir: Option<String>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    stats_interval: Option<u64>,
    #[arg(short, long)]
    export_stats: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut ThorConfig) {
        if let Some(v) = &self.chain_id {
            config.chain_id = Some(v.clone());
        }
        if let Some(v) = self.rate_limit {
            config.rate_limit_ms = v;
        }
        if let Some(v) = &self.spam_prefix {
            config.spam_prefix = v.clone();
        }
        if let Some(v) = &self.spam_password {
            config.spam_password = Some(v.clone());
        }
        if let Some(v) = &self.node {
            config.node_url = v.clone();
        }
        if let Some(v) = &self.keystore_dir {
            config.keystore_dir = v.clone();
        }
        if let Some(v) = self.stats_interval {
            config.stats_interval_secs = v;
        }
    }
}

/// Flag or config value first, then `WALLET_PASSWORD`, then an interactive prompt.
fn resolve_password(config: &mut ThorConfig) {
    if config.spam_password.as_deref().is_some_and(|p| !p.is_empty()) {
        return;
    }
    if let Ok(pw) = env::var("WALLET_PASSWORD") {
        if !pw.is_empty() {
            config.spam_password = Some(pw);
            return;
        }
    }

    match Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter spam password")
        .interact()
    {
        Ok(input) => config.spam_password = Some(input),
        Err(_) => {
            error!("Cannot prompt for password (not a terminal).");
            error!("Pass --spam-password or set WALLET_PASSWORD.");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let _log_guard = setup_logger(&LoggerConfig {
        log_dir: args.log_dir.clone(),
        ..LoggerConfig::default()
    });

    info!("Loading config from: {}", args.config);
    let mut config = ThorConfig::load(&args.config)?;
    args.apply(&mut config);

    // Fail on a missing chain id before asking for anything
    config.to_spam_config().require_chain_id()?;
    resolve_password(&mut config);
    config.validate()?;

    let keystore = WalletManager::open(&config.keystore_dir)
        .with_context(|| format!("Failed to open keystore at {}", config.keystore_dir))?;
    if keystore.count() == 0 {
        error!("No key files in {}", config.keystore_dir);
    }

    let stats = Arc::new(SpamStats::new());
    let client = RestClient::new(&config.node_url, config.request_timeout(), Arc::clone(&stats))?;
    let limiter = RateLimiter::from_millis(config.rate_limit_ms)?;
    let ctx = Arc::new(SpamContext::new(Arc::new(client), limiter, stats));

    let pool = SpammerPool::build(&config, &keystore, ctx).await?;
    info!(
        "Starting {} spammers on {} every {}ms",
        pool.len(),
        config.node_url,
        config.rate_limit_ms
    );

    let token = CancellationToken::new();
    shutdown_on_ctrl_c(token.clone());

    let report = StatsReport {
        interval: Duration::from_secs(config.stats_interval_secs),
        export_path: args.export_stats.clone(),
    };
    pool.run(token, report).await?;

    Ok(())
}
