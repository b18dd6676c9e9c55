use clap::{Args, Subcommand, ValueEnum};

use grocery_sync::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => match format {
                OutputFormat::Json => {
                    let mut value = serde_json::to_value(config)?;
                    if let Some(token) = value.pointer_mut("/sync/api_token") {
                        if !token.is_null() {
                            *token = "********".into();
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Text => {
                    println!("Configuration");
                    println!("=============\n");

                    if let Some(path) = &config.config_file {
                        println!("Config file: {}", path.display());
                    } else {
                        println!(
                            "Config file: {} (not found)",
                            Config::default_config_path().display()
                        );
                    }
                    println!();

                    println!("database_path: {}", config.database_path.value.display());
                    println!("  source: {}", config.database_path.source);
                    println!();

                    let sync = &config.sync;
                    println!("sync.server_url: {}", sync.server_url.as_deref().unwrap_or("-"));
                    println!("sync.owner_id: {}", sync.owner_id.as_deref().unwrap_or("-"));
                    println!(
                        "sync.api_token: {}",
                        if sync.api_token.is_some() { "set" } else { "-" }
                    );
                    println!("sync.request_timeout_secs: {}", sync.request_timeout_secs);
                }
            },
        }
        Ok(())
    }
}
