//! Interactive command-line client for MHUX data servers.
//!
//! Two modes: an interactive shell with line editing and history, and a
//! batch runner that executes queries from a file. Both drive one client
//! session with strict request/response turn-taking and observe a
//! cancellation token between operations for Ctrl-C shutdown.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mhux_client::config::ClientConfig;
use mhux_client::error::ProtocolError;
use mhux_client::service::client::Client;
use mhux_client::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "mhux-client", version, about = "Interactive client for MHUX data servers")]
struct Args {
    /// Server host name or IP address
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Execute queries from a file instead of starting the shell
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Load settings from a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip server certificate verification (development only)
    #[arg(long)]
    insecure: bool,

    /// Echo every request before sending it
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::from_env().context("reading environment")?,
    };
    if let Some(server) = &args.server {
        config.connection.host = server.clone();
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if args.insecure {
        config.tls.insecure = true;
    }
    config.validate_strict()?;

    logging::init(&config.logging);

    // Ctrl-C cancels the token; the shell and batch loops observe it
    // between send/receive calls and tear the session down once.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                shutdown.cancel();
            }
        });
    }

    match &args.file {
        Some(path) => batch_mode(&config, path, &shutdown, args.verbose).await,
        None => interactive_mode(&config, &shutdown, args.verbose).await,
    }
}

/// Connect a fresh client using the configured address and TLS settings.
async fn connect(config: &ClientConfig) -> anyhow::Result<Client> {
    let tls = config.tls_client_config()?;
    let client = Client::connect(&config.connection.address(), tls).await?;
    Ok(client)
}

/// Whether an error means the session can no longer be trusted.
///
/// Integrity failures indicate corruption or a peer speaking an
/// incompatible protocol; continuing would risk reading a partially
/// consumed stream.
fn is_fatal(err: &ProtocolError) -> bool {
    matches!(
        err,
        ProtocolError::ConnectionClosed
            | ProtocolError::WriteFailed(_)
            | ProtocolError::ChecksumMismatch { .. }
            | ProtocolError::BadMagic(_)
            | ProtocolError::UnsupportedVersion(_)
            | ProtocolError::OversizedPacket(_)
    )
}

fn print_help() {
    println!("Commands:");
    println!("  \\q, \\quit              Quit the shell");
    println!("  \\h, \\help              Show this help");
    println!("  \\c, \\connect           Connect to the server");
    println!("  \\d, \\disconnect        Disconnect from the server");
    println!("  \\s, \\status            Show connection status");
    println!("  \\v, \\verbose           Toggle verbose mode");
    println!();
    println!("Anything else is sent to the server as a query.");
}

async fn interactive_mode(
    config: &ClientConfig,
    shutdown: &CancellationToken,
    mut verbose: bool,
) -> anyhow::Result<()> {
    println!("mhux-client {}", env!("CARGO_PKG_VERSION"));
    println!("Server: {}", config.connection.address());
    println!("Type \\h for help, \\q to quit.");
    println!("----------------------------------------");

    let mut client = match connect(config).await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "could not connect; use \\c to retry");
            None
        }
    };

    let mut editor = DefaultEditor::new()?;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let connected = client.as_ref().is_some_and(Client::is_connected);
        let prompt = if connected {
            "mhux> "
        } else {
            "mhux (disconnected)> "
        };

        // rustyline blocks on the terminal, so step off the async runtime
        let line = tokio::task::block_in_place(|| editor.readline(prompt));
        let input = match line {
            Ok(input) => input,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        editor.add_history_entry(input).ok();

        if let Some(command) = input.strip_prefix('\\') {
            match command {
                "q" | "quit" => break,
                "h" | "help" => print_help(),
                "c" | "connect" => {
                    if client.as_ref().is_some_and(Client::is_connected) {
                        println!("already connected");
                    } else {
                        match connect(config).await {
                            Ok(fresh) => client = Some(fresh),
                            Err(e) => eprintln!("connection failed: {e}"),
                        }
                    }
                }
                "d" | "disconnect" => {
                    if let Some(mut c) = client.take() {
                        c.disconnect().await.ok();
                    } else {
                        println!("not connected");
                    }
                }
                "s" | "status" => {
                    if client.as_ref().is_some_and(Client::is_connected) {
                        println!("connected to {}", config.connection.address());
                    } else {
                        println!("not connected");
                    }
                }
                "v" | "verbose" => {
                    verbose = !verbose;
                    println!("verbose: {}", if verbose { "on" } else { "off" });
                }
                other => println!("unknown command: \\{other}"),
            }
            continue;
        }

        let result = match client.as_mut() {
            Some(c) => {
                if verbose {
                    println!("sending: {input}");
                }
                Some(c.query(input).await)
            }
            None => {
                println!("not connected; use \\c to connect");
                None
            }
        };

        match result {
            Some(Ok(response)) => println!("{response}"),
            Some(Err(e)) => {
                eprintln!("error: {e}");
                if is_fatal(&e) {
                    if let Some(mut dead) = client.take() {
                        dead.disconnect().await.ok();
                    }
                    eprintln!("session closed; use \\c to reconnect");
                }
            }
            None => {}
        }
    }

    if let Some(mut c) = client.take() {
        c.disconnect().await.ok();
    }
    Ok(())
}

async fn batch_mode(
    config: &ClientConfig,
    path: &PathBuf,
    shutdown: &CancellationToken,
    verbose: bool,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let mut client = connect(config).await?;
    info!(file = %path.display(), "running batch file");

    for (index, line) in contents.lines().enumerate() {
        if shutdown.is_cancelled() {
            warn!("batch run cancelled");
            break;
        }

        let query = line.trim();
        if query.is_empty() || query.starts_with('#') {
            continue;
        }

        if verbose {
            println!("line {}: {query}", index + 1);
        }
        // Abort on the first failing line.
        let response = client
            .query(query)
            .await
            .with_context(|| format!("line {} failed", index + 1))?;
        println!("{response}");
    }

    client.disconnect().await.ok();
    Ok(())
}
