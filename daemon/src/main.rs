//! dailyread daemon: serves the site and administers its stored settings.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dailyread_mail::{MailSettings, MailUpdate};
use dailyread_node::{sweep_once, SiteConfig, SiteNode};
use dailyread_store::keys;
use dailyread_types::{NewContentSource, PollingAlgorithm, SourceId};
use dailyread_utils::{format_duration, init_logging};

#[derive(Parser)]
#[command(name = "dailyread", about = "dailyread site daemon", version)]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, env = "DAILYREAD_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "DAILYREAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP API port.
    #[arg(long, env = "DAILYREAD_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "DAILYREAD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "DAILYREAD_LOG_FORMAT")]
    log_format: Option<String>,

    /// Operator-supplied credential key. Takes precedence over the stored key.
    #[arg(long, env = "DAILYREAD_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API until SIGINT or SIGTERM.
    Serve,
    /// Outbound mail relay settings.
    Mail {
        #[command(subcommand)]
        action: MailAction,
    },
    /// External content sources.
    Sources {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Verification codes.
    Codes {
        #[command(subcommand)]
        action: CodeAction,
    },
    /// The credential encryption key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum MailAction {
    /// Update relay settings. Omitted fields keep their stored values.
    Set {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Stored encrypted under the credential key.
        #[arg(long, env = "DAILYREAD_MAIL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        from_address: Option<String>,
        #[arg(long)]
        from_name: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Print relay settings. The password is never printed.
    Show,
}

#[derive(Subcommand)]
enum SourceAction {
    /// Register a source, appended after the last one unless --position is given.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        position: Option<u32>,
        /// Per-source polling algorithm override: "sequential" or "random".
        #[arg(long)]
        algorithm: Option<PollingAlgorithm>,
        /// Register the source disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// List sources in fallback order.
    List,
    Enable { id: SourceId },
    Disable { id: SourceId },
    /// Set or clear the global polling algorithm.
    Algorithm {
        /// "sequential" or "random"; omit to clear the stored setting.
        algorithm: Option<PollingAlgorithm>,
    },
}

#[derive(Subcommand)]
enum CodeAction {
    /// Delete used and expired codes now.
    Sweep,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Load or create the key and report where it came from.
    Check,
}

fn load_config(cli: &Cli) -> anyhow::Result<SiteConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            SiteConfig::from_toml_file(&path).with_context(|| format!("loading {path}"))?
        }
        None => SiteConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if cli.secret_key.is_some() {
        config.secret_key = cli.secret_key.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Mail { action } => mail(SiteNode::new(config)?, action),
        Command::Sources { action } => sources(SiteNode::new(config)?, action),
        Command::Codes {
            action: CodeAction::Sweep,
        } => {
            let node = SiteNode::new(config)?;
            let report = sweep_once(&node.ledger, &node.sessions, node.config.session_idle_secs)?;
            println!("removed {} verification code(s)", report.codes);
            Ok(())
        }
        Command::Key {
            action: KeyAction::Check,
        } => key_check(SiteNode::new(config)?),
    }
}

async fn serve(config: SiteConfig) -> anyhow::Result<()> {
    tracing::info!(
        data_dir = %config.data_dir.display(),
        rpc_port = config.rpc_port,
        "starting dailyread"
    );
    let mut node = SiteNode::new(config)?;
    node.start().await?;
    node.wait_for_shutdown().await;
    node.stop().await?;
    Ok(())
}

fn mail(node: SiteNode, action: MailAction) -> anyhow::Result<()> {
    match action {
        MailAction::Set {
            endpoint,
            username,
            password,
            from_address,
            from_name,
            enabled,
        } => {
            let update = MailUpdate {
                endpoint,
                username,
                password,
                from_address,
                from_name,
                enabled,
            };
            if update.is_empty() {
                println!("nothing to change");
                return Ok(());
            }
            MailSettings::apply(&update, &node.settings, &node.cipher)?;
            println!("mail settings saved");
        }
        MailAction::Show => {
            let settings = MailSettings::load(&node.settings, &node.cipher)?;
            let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(not set)".into());
            println!("endpoint:     {}", show(&settings.endpoint));
            println!("username:     {}", show(&settings.username));
            println!(
                "password:     {}",
                if settings.password.is_some() { "(set)" } else { "(not set)" }
            );
            println!("from address: {}", show(&settings.from_address));
            println!("from name:    {}", show(&settings.from_name));
            println!("enabled:      {}", settings.enabled);
            println!("configured:   {}", settings.is_configured());
        }
    }
    Ok(())
}

fn sources(node: SiteNode, action: SourceAction) -> anyhow::Result<()> {
    match action {
        SourceAction::Add {
            name,
            url,
            position,
            algorithm,
            disabled,
        } => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("source url must start with http:// or https://");
            }
            let source = node.sources.put_source(
                NewContentSource {
                    name,
                    url,
                    enabled: !disabled,
                    order_index: position,
                    polling_algorithm: algorithm,
                },
                dailyread_types::Timestamp::now(),
            )?;
            println!("added source #{} at position {}", source.id, source.order_index);
        }
        SourceAction::List => {
            let global = node.settings.get_string(keys::SOURCE_POLLING_ALGORITHM)?;
            println!(
                "polling algorithm: {} (configured default {})",
                global.as_deref().unwrap_or("(not set)"),
                node.config.source_polling_algorithm
            );
            for source in node.sources.list_sources()? {
                println!(
                    "#{:<4} {:<4} {:<9} {:<20} {}{}",
                    source.id,
                    source.order_index,
                    if source.enabled { "enabled" } else { "disabled" },
                    source.name,
                    source.url,
                    source
                        .polling_algorithm
                        .map(|a| format!(" [{a}]"))
                        .unwrap_or_default()
                );
            }
        }
        SourceAction::Enable { id } => {
            let source = node.sources.set_enabled(id, true)?;
            println!("enabled source #{} ({})", source.id, source.name);
        }
        SourceAction::Disable { id } => {
            let source = node.sources.set_enabled(id, false)?;
            println!("disabled source #{} ({})", source.id, source.name);
        }
        SourceAction::Algorithm { algorithm } => match algorithm {
            Some(algorithm) => {
                node.settings
                    .set_string(keys::SOURCE_POLLING_ALGORITHM, &algorithm.to_string())?;
                println!("polling algorithm set to {algorithm}");
            }
            None => {
                node.settings.remove(keys::SOURCE_POLLING_ALGORITHM)?;
                println!("polling algorithm setting cleared");
            }
        },
    }
    Ok(())
}

fn key_check(node: SiteNode) -> anyhow::Result<()> {
    let record = node.cipher.record()?;
    println!("origin:      {}", record.origin);
    println!("fingerprint: {}", record.key.fingerprint());
    if let Some(at) = record.persisted_at {
        let age = dailyread_types::Timestamp::now().elapsed_since(at);
        println!("persisted:   {at} ({} ago)", format_duration(age));
    }
    Ok(())
}
