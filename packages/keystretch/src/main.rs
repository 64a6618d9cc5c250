//! `keystretch` command line

use clap::{Parser, Subcommand};
use keystretch::{BridgeResponse, DerivationService, PluginBridge, ServiceConfig};
use keystretch_common::LoggingTransformer;
use keystretch_key::{KeySize, Pbkdf2Params};
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "keystretch", version, about = "PBKDF2-HMAC-SHA256 key derivation")]
struct Cli {
    /// JSON service configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive a key; the passphrase is read from stdin unless set in the environment
    Derive {
        /// Standard base64 salt
        #[arg(long)]
        salt: String,
        /// Iteration count (defaults to the configured default)
        #[arg(long)]
        iterations: Option<i64>,
        /// Key size in bits
        #[arg(long, default_value_t = 256)]
        bits: i64,
        #[arg(long, env = "KEYSTRETCH_PASSPHRASE", hide = true, hide_env_values = true)]
        passphrase: Option<String>,
    },
    /// Print a fresh random base64 salt
    Salt {
        /// Print a full parameter set as JSON instead
        #[arg(long)]
        params: bool,
    },
    /// Answer one JSON `{action, args}` request per stdin line
    Bridge,
}

#[derive(Deserialize)]
struct BridgeLine {
    action: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    LoggingTransformer::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::default(),
    }
    .with_env_overrides()?;

    match cli.command {
        Command::Derive {
            salt,
            iterations,
            bits,
            passphrase,
        } => {
            let passphrase = match passphrase {
                Some(p) => Zeroizing::new(p),
                None => read_passphrase()?,
            };
            let iterations = iterations.unwrap_or_else(|| i64::from(config.default_iterations));
            let service = DerivationService::start(config)?;

            match service
                .request_derivation(&passphrase, &salt, iterations, bits)
                .await
            {
                Ok(key) => {
                    println!("{}", key.expose());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}: {e}", e.code());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Salt { params } => {
            let generated = Pbkdf2Params {
                iterations: config.default_iterations,
                key_size: KeySize::Bits256.bits(),
                ..Pbkdf2Params::default()
            }
            .with_random_salt();
            if params {
                println!("{}", serde_json::to_string_pretty(&generated)?);
            } else {
                println!("{}", generated.salt);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Bridge => {
            let bridge = PluginBridge::new(Arc::new(DerivationService::start(config)?));
            serve_bridge(&bridge).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_passphrase() -> std::io::Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

async fn serve_bridge(bridge: &PluginBridge) -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = Zeroizing::new(line?);
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<BridgeLine>(&line) {
            Ok(request) => dispatch(bridge, &request).await,
            Err(e) => BridgeResponse::error(keystretch::INVALID_ARGUMENTS, e.to_string()),
        };

        writeln!(stdout, "{}", response.to_json())?;
        stdout.flush()?;
    }

    Ok(())
}

async fn dispatch(bridge: &PluginBridge, request: &BridgeLine) -> BridgeResponse {
    let (tx, rx) = oneshot::channel();
    let args = Zeroizing::new(request.args.to_string());

    let handled = bridge.execute(&request.action, &args, move |response| {
        let _ = tx.send(response);
    });

    if !handled {
        return BridgeResponse::error(
            "UNKNOWN_ACTION",
            format!("unknown action {:?}", request.action),
        );
    }

    rx.await.unwrap_or_else(|_| {
        BridgeResponse::error("INTERNAL_FAILURE", "bridge callback was dropped")
    })
}
