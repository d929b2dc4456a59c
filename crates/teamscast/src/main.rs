use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::runtime::Runtime;

use teamscast::card::build_card;
use teamscast::cli::{Cli, Commands};
use teamscast::config::{Config, Endpoint};
use teamscast::dispatch::{dispatch, Destination};
use teamscast::event::CiEvent;

use tabled::{Table, Tabled};
use tabled::settings::{Style, Modify, Alignment, Padding, object::{Columns, Rows}};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Send {
                url,
                hooks,
                all,
                payload,
                event,
                event_name,
                workflow,
                jobs,
            } => {
                let body = load_payload(
                    payload.as_deref(),
                    event.as_deref(),
                    &event_name,
                    &workflow,
                )?;
                let destinations = resolve_destinations(cli.config.clone(), url, hooks, all)?;

                let reports = dispatch(&body, destinations, jobs).await?;

                #[derive(Tabled)]
                struct Row {
                    #[tabled(rename = "hook")]
                    hook: String,
                    #[tabled(rename = "Δ")]
                    sent: String,
                    #[tabled(rename = "ms")]
                    duration: u128,
                    #[tabled(rename = "error")]
                    error: String,
                }

                let rows: Vec<Row> = reports
                    .iter()
                    .map(|r| Row {
                        hook: r.hook.clone(),
                        sent: if r.ok {
                            "✅".to_string()
                        } else {
                            "🚨".to_string()
                        },
                        duration: r.duration_ms,
                        error: r
                            .error
                            .as_deref()
                            .map(|e| one_line(e, 60))
                            .unwrap_or_default(),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table
                    .with(Style::modern())
                    // ms right-aligned
                    .with(Modify::new(Columns::single(2)).with(Alignment::right()))
                    // Hook left-aligned
                    .with(Modify::new(Columns::single(0)).with(Alignment::left()))
                    // Center the icon column, no padding
                    .with(Modify::new(Columns::single(1)).with(Alignment::center()))
                    .with(Modify::new(Columns::single(1)).with(Padding::zero()))
                    // Add one-space padding left/right to other columns for readability
                    .with(Modify::new(Rows::new(0..)).with(Padding::new(1, 1, 0, 0)));

                println!("{}", table);

                // emit summary json
                let summary = serde_json::json!({
                    "results": reports,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);

                // Exit code: 0 = all delivered, 2 = at least one failure
                if reports.iter().any(|r| !r.ok) {
                    std::process::exit(2);
                }
            }
            Commands::Version { json } => {
                if json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "teamscast {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok(())
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prebuilt payload wins; otherwise an Adaptive Card is built from the CI event.
fn load_payload(
    payload: Option<&Path>,
    event: Option<&Path>,
    event_name: &str,
    workflow: &str,
) -> anyhow::Result<serde_json::Value> {
    if let Some(path) = payload {
        let contents = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Reading payload from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("Reading payload file {}", path.display()))?
        };
        return serde_json::from_str(&contents).context("Parsing payload JSON");
    }

    if let Some(path) = event {
        let event = CiEvent::load(path)?;
        return Ok(build_card(&event, event_name, workflow));
    }

    anyhow::bail!("No payload: pass --payload or --event")
}

fn resolve_destinations(
    config_path: Option<PathBuf>,
    url: Option<String>,
    hooks: Vec<String>,
    all: bool,
) -> anyhow::Result<Vec<Destination>> {
    let url = url.or_else(|| std::env::var("TEAMS_WEBHOOK_URL").ok());

    let mut destinations = Vec::new();
    if let Some(url) = url {
        destinations.push(Destination {
            name: "webhook".to_string(),
            endpoint: Endpoint::Webhook { url },
        });
    }

    if all || !hooks.is_empty() {
        let config = Config::load(config_path)?;
        let names = if all { config.hook_names() } else { hooks };
        for name in names {
            let endpoint = config.hook(&name)?.clone();
            destinations.push(Destination { name, endpoint });
        }
    }

    if destinations.is_empty() {
        anyhow::bail!("No destination: pass --url, --hook, or --all (or set TEAMS_WEBHOOK_URL)");
    }
    Ok(destinations)
}

/// Collapse a multi-line diagnostic into a single trimmed table cell.
fn one_line(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut cut: String = flat.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }
}
