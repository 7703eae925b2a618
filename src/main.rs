#![deny(dead_code)]
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use kik_stanza::config::{self, Config};
use kik_stanza::models::{ChatMessage, DeliveredReceipt, LinkShare, OutboundEvent, ReadReceipt, TypingStatus};
use kik_stanza::utils::setup_logging;
use kik_stanza::xmpp::encoder::encode_to_string;
use kik_stanza::{decode_str, Decoded, SystemClock};

/// Command line arguments for kik-stanza
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kik-stanza: encode domain events into kik stanzas and decode stanzas into events."
)]
struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append log output to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serialize an outbound event and print the stanza
    #[command(subcommand)]
    Encode(EncodeCommand),
    /// Decode a stanza read from FILE or stdin and print the event as JSON
    Decode {
        file: Option<PathBuf>,
    },
    /// Write the given settings to the config file
    Config {
        #[arg(long)]
        log_level: Option<String>,
        #[arg(long)]
        default_peer: Option<String>,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Recipient jid; falls back to `default_peer` from the config file
    #[arg(long)]
    to: Option<String>,
    /// Message id; a fresh UUID when omitted
    #[arg(long)]
    id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum EncodeCommand {
    /// Text chat message
    Chat {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        body: String,
        #[arg(long)]
        group: bool,
        #[arg(long, value_name = "JID")]
        bot: Option<String>,
    },
    /// Read receipt for one message
    Read {
        #[command(flatten)]
        target: Target,
        #[arg(long = "msg", value_name = "ID")]
        receipt_target_id: String,
        #[arg(long = "group", value_name = "JID")]
        group_id: Option<String>,
    },
    /// Delivery receipt for one message
    Delivered {
        #[command(flatten)]
        target: Target,
        #[arg(long = "msg", value_name = "ID")]
        receipt_target_id: String,
    },
    /// Typing indicator
    Typing {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        group: bool,
        #[arg(long)]
        stopped: bool,
    },
    /// Link shared as an article card
    Link {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        link: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long, default_value = "kik-stanza")]
        app_name: String,
    },
}

fn resolve_target(target: Target, config: &Config) -> Result<(String, String)> {
    let peer = target
        .to
        .or_else(|| config.default_peer.clone())
        .ok_or_else(|| anyhow!("No recipient: pass --to or set default_peer in the config file"))?;
    let id = target.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    Ok((peer, id))
}

fn build_event(command: EncodeCommand, config: &Config) -> Result<(OutboundEvent, String)> {
    let built = match command {
        EncodeCommand::Chat { target, body, group, bot } => {
            let (peer_id, id) = resolve_target(target, config)?;
            let event = ChatMessage {
                peer_id,
                body,
                is_group: group,
                bot_mention_id: bot,
            };
            (event.into(), id)
        }
        EncodeCommand::Read { target, receipt_target_id, group_id } => {
            let (peer_id, id) = resolve_target(target, config)?;
            let event = ReadReceipt {
                peer_id,
                receipt_target_id,
                group_id,
            };
            (event.into(), id)
        }
        EncodeCommand::Delivered { target, receipt_target_id } => {
            let (peer_id, id) = resolve_target(target, config)?;
            (DeliveredReceipt { peer_id, receipt_target_id }.into(), id)
        }
        EncodeCommand::Typing { target, group, stopped } => {
            let (peer_id, id) = resolve_target(target, config)?;
            let event = TypingStatus {
                peer_id,
                is_group: group,
                is_typing: !stopped,
            };
            (event.into(), id)
        }
        EncodeCommand::Link { target, link, title, text, app_name } => {
            let (peer_id, id) = resolve_target(target, config)?;
            let event = LinkShare {
                peer_id,
                link,
                title,
                text,
                app_name,
            };
            (event.into(), id)
        }
    };
    Ok(built)
}

/// Read a whole stanza from `path`, or from stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String> {
    let mut input = String::new();
    match path {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?
                .read_to_string(&mut input)?;
        }
        None => {
            io::stdin().read_to_string(&mut input)?;
        }
    }
    Ok(input)
}

fn run_decode(file: Option<PathBuf>) -> Result<()> {
    let input = read_input(file.as_deref())?;
    match decode_str(input.trim())? {
        Decoded::Event(event) => {
            info!("Decoded stanza {}", event.header().message_id);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Decoded::Unknown { element, stanza_type } => {
            warn!("Unknown stanza <{}> type={:?}", element, stanza_type);
            println!("unknown stanza: <{}> type={}", element, stanza_type.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        config::set_config_path_override(path.clone())?;
    }
    let config = config::load_config()
        .context("Failed to load config file")?
        .unwrap_or_default();

    let log_file = cli.log_file.clone().or_else(|| config.log_file.clone());
    let log_file = log_file.as_ref().map(|p| p.display().to_string());
    setup_logging(log_file.as_deref(), config.level_filter())?;
    debug!("Running with config {:?}", config);

    match cli.command {
        Command::Encode(command) => {
            let (event, message_id) = build_event(command, &config)?;
            let stanza = encode_to_string(&event, &message_id, &SystemClock)?;
            println!("{}", stanza);
        }
        Command::Decode { file } => run_decode(file)?,
        Command::Config { log_level, default_peer } => {
            let updated = Config {
                log_level: log_level.or(config.log_level),
                log_file: config.log_file,
                default_peer: default_peer.or(config.default_peer),
            };
            config::save_config(&updated)?;
        }
    }
    Ok(())
}
