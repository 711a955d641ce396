//! Foreground runner: hosts the engine runtime, prints every event as one
//! JSON line and reads commands (plain words or `timeblock://` URLs) from
//! stdin until `quit` or Ctrl-C.

use clap::Args;
use timeblock_core::{open_store, runtime, BlockEngine, Config, ControlCommand, LogSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::CliResult;

#[derive(Args)]
pub struct RunArgs {
    /// Index of the block to start with
    #[arg(long, default_value = "0")]
    pub block: usize,
    /// Load and wait without starting a block
    #[arg(long)]
    pub idle: bool,
}

const HELP: &str =
    "commands: start <index> | pause | resume | toggle | skip | stop | reset | refresh | status | quit | timeblock://<startstop|pause|resume|skip>";

pub fn run(args: RunArgs) -> CliResult {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run_async(args))
}

async fn run_async(args: RunArgs) -> CliResult {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let engine = BlockEngine::load(&*store, config).with_sinks(Box::new(LogSink), Box::new(LogSink));
    let handle = runtime::spawn(engine, store);

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if !args.idle {
        handle.start(args.block).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let mut words = line.split_whitespace();
                    let result = match (words.next(), words.next()) {
                        (None, _) => continue,
                        (Some("quit" | "exit"), _) => break,
                        (Some("start"), index) => match index.map(str::parse::<usize>) {
                            Some(Ok(index)) => handle.start(index).await,
                            _ => {
                                eprintln!("usage: start <index>");
                                continue;
                            }
                        },
                        (Some("pause"), _) => handle.pause().await,
                        (Some("resume"), _) => handle.resume().await,
                        (Some("toggle"), _) => handle.toggle().await,
                        (Some("skip"), _) => handle.skip().await,
                        (Some("stop"), _) => handle.stop().await,
                        (Some("reset"), _) => handle.reset().await,
                        (Some("refresh"), _) => handle.refresh_all().await,
                        (Some("status"), _) => {
                            let snapshot = handle.snapshot().await?;
                            println!("{}", serde_json::to_string(&snapshot)?);
                            continue;
                        }
                        (Some(url), _) if url.contains("://") => match ControlCommand::from_url(url) {
                            Ok(command) => handle.control(command).await,
                            Err(e) => {
                                eprintln!("{e}");
                                continue;
                            }
                        },
                        (Some(other), _) => {
                            eprintln!("unknown command: {other}\n{HELP}");
                            continue;
                        }
                    };
                    result?;
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await?;
    drop(handle);
    let _ = printer.await;
    Ok(())
}
