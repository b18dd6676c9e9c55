//! Sync CLI commands for reconciling with the remote document store.

use std::sync::Arc;

use clap::{Args, Subcommand};
use tokio::sync::watch;

use grocery_sync::config::Config;
use grocery_sync::db::LocalStore;
use grocery_sync::sync::{HttpRemoteStore, Reconciler, RemoteError, RemoteGateway, SyncError};

/// Sync with the remote document store
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and local row counts
    Status,
}

impl SyncCommand {
    pub async fn run(&self, local: LocalStore, config: &Config) -> Result<(), SyncCommandError> {
        match &self.command {
            None => self.sync(local, config).await,
            Some(SyncSubcommand::Status) => self.status(&local, config).await,
        }
    }

    async fn sync(&self, local: LocalStore, config: &Config) -> Result<(), SyncCommandError> {
        let (Some(server_url), Some(owner_id)) = (&config.sync.server_url, &config.sync.owner_id)
        else {
            return Err(SyncCommandError::NotConfigured);
        };

        let timeout = config.sync.request_timeout();
        let store = HttpRemoteStore::new(server_url, config.sync.api_token.clone(), timeout)?;
        let gateway = RemoteGateway::new(Arc::new(store), owner_id.as_str()).with_timeout(timeout);
        let reconciler = Reconciler::new(local, gateway);

        // Ctrl-C stops the run at the next phase boundary.
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });

        println!("Syncing with {}...", server_url);
        println!();

        let report = reconciler.synchronize_cancellable(&cancel_rx).await?;

        for phase in &report.phases {
            println!("  ✓ {}", phase);
        }

        let skipped: Vec<_> = report.skipped().collect();
        if !skipped.is_empty() {
            println!();
            println!("Skipped ({}):", skipped.len());
            for skip in skipped {
                println!("  - {}: {}", skip.subject, skip.reason);
            }
        }

        println!();
        println!("Sync complete.");
        Ok(())
    }

    async fn status(&self, local: &LocalStore, config: &Config) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"https://docs.example.com\"");
            println!("    owner_id: \"your-user-id\"");
            println!("    api_token: \"your-token\"");
            println!();
            println!("Or set environment variables:");
            println!("  GROCERY_SYNC_URL");
            println!("  GROCERY_OWNER_ID");
            println!("  GROCERY_SYNC_TOKEN");
        } else {
            let sync = &config.sync;
            println!("Server:  {}", sync.server_url.as_deref().unwrap_or_default());
            println!("Owner:   {}", sync.owner_id.as_deref().unwrap_or_default());
            match &sync.api_token {
                Some(token) => println!("Token:   {}...", token_preview(token)),
                None => println!("Token:   (none)"),
            }
            println!("Timeout: {}s", sync.request_timeout_secs);
        }

        println!();
        println!("Local rows");
        println!("----------");
        for (table, count) in local.counts().await? {
            println!("  {:<20} {}", table.name(), count);
        }

        Ok(())
    }
}

/// First characters of a secret, safe to print.
fn token_preview(token: &str) -> String {
    token.chars().take(8).collect()
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    Remote(RemoteError),
    Sync(SyncError),
    Database(sqlx::Error),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Sync is not configured. Run 'grocery sync status' for setup instructions."
            ),
            SyncCommandError::Remote(e) => write!(f, "{}", e),
            SyncCommandError::Sync(e) => write!(f, "{}", e),
            SyncCommandError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::NotConfigured => None,
            SyncCommandError::Remote(e) => Some(e),
            SyncCommandError::Sync(e) => Some(e),
            SyncCommandError::Database(e) => Some(e),
        }
    }
}

impl From<RemoteError> for SyncCommandError {
    fn from(e: RemoteError) -> Self {
        SyncCommandError::Remote(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::Sync(e)
    }
}

impl From<sqlx::Error> for SyncCommandError {
    fn from(e: sqlx::Error) -> Self {
        SyncCommandError::Database(e)
    }
}
