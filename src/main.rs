use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use labamba_hub::config::{self, Settings, SourceMode};
use labamba_hub::refresh::{CycleOutcome, Refresher};
use labamba_hub::render::{OutputFormat, render};
use labamba_hub::site_api::{SiteApi, image_content_type};
use labamba_hub::{logging, run, sources};
use log::Level;

#[derive(Parser)]
#[command(name = "labamba", about = "La Bamba Frisbee club hub - team list, photos and payments")]
struct Cli {
	/// Explicit config file (JSON/TOML/YAML) instead of the standard locations
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	/// Override the configured log level
	#[arg(long, global = true, value_parser = parse_level)]
	log_level: Option<Level>,
	#[command(subcommand)]
	command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
	/// Fetch the registration sheet once and print the team list (default)
	Teams {
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
		/// Source to read from: text-export, sheets-api or backend
		#[arg(long, value_parser = parse_mode)]
		mode: Option<SourceMode>,
	},
	/// Keep polling the team list and print every refresh
	Watch {
		/// Polling interval in milliseconds (defaults to the configured refresh_ms)
		#[arg(long)]
		interval_ms: Option<u64>,
		#[arg(long, value_parser = parse_mode)]
		mode: Option<SourceMode>,
	},
	/// Run the club backend (registrations, photos, checkout)
	Serve,
	/// List uploaded photo URLs from the backend gallery
	Photos {
		#[arg(long, default_value_t = 60)]
		limit: usize,
	},
	/// Upload an image to the backend gallery (needs photo storage on the backend)
	Upload {
		path: PathBuf,
	},
	/// Create a card checkout session (needs a Stripe key on the backend)
	Checkout {
		#[arg(long)]
		amount_sek: u32,
		#[arg(long)]
		description: Option<String>,
	},
}

fn parse_mode(s: &str) -> Result<SourceMode, String> {
	SourceMode::from_hint(s).ok_or_else(|| format!("unknown source mode '{}'", s))
}

fn parse_level(s: &str) -> Result<Level, String> {
	s.parse::<Level>()
		.map_err(|_| format!("unknown log level '{}'", s))
}

fn load_settings(cli: &Cli) -> Settings {
	let loaded = match &cli.config {
		Some(path) => config::load_from(path),
		None => config::load(),
	};
	match loaded {
		Ok(s) => s,
		Err(e) => {
			eprintln!("failed to load config, using defaults: {}", e);
			Settings::default()
		}
	}
}

fn refresher(settings: &Settings, mode: Option<SourceMode>) -> anyhow::Result<Refresher> {
	let mut source_settings = settings.source.clone();
	if let Some(m) = mode {
		source_settings.mode = m;
	}
	let specs = settings.columns.compile()?;
	let source = sources::from_settings(&source_settings, &specs, sources::http_client()?);
	Ok(Refresher::new(source, specs))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = load_settings(&cli);
	logging::init_logging(cli.log_level.unwrap_or(settings.log_level))?;

	match cli.command.unwrap_or(Commands::Teams {
		format: OutputFormat::Text,
		mode: None,
	}) {
		Commands::Teams { format, mode } => {
			let r = refresher(&settings, mode)?;
			let outcome = r.refresh().await;
			println!("{}", render(&r.snapshot().await, format)?);
			if let CycleOutcome::Failed { error, .. } = outcome {
				anyhow::bail!("team refresh failed ({})", error.kind());
			}
		}
		Commands::Watch { interval_ms, mode } => {
			let r = Arc::new(refresher(&settings, mode)?);
			let interval = interval_ms.unwrap_or(settings.refresh_ms);
			let board = r.board();

			match r.spawn_polling(interval) {
				None => {
					r.refresh().await;
					println!("{}", render(&r.snapshot().await, OutputFormat::Text)?);
				}
				Some(handle) => {
					let mut last = 0;
					let mut ticker =
						tokio::time::interval(std::time::Duration::from_millis(interval.min(1_000)));
					loop {
						tokio::select! {
							_ = tokio::signal::ctrl_c() => break,
							_ = ticker.tick() => {
								let snapshot = board.read().await.clone();
								if snapshot.generation != last {
									last = snapshot.generation;
									println!("{}\n", render(&snapshot, OutputFormat::Text)?);
								}
							}
						}
					}
					handle.abort();
				}
			}
		}
		Commands::Serve => run(settings).await?,
		Commands::Photos { limit } => {
			let api = SiteApi::from_settings(sources::http_client()?, &settings.source);
			for url in api.list_photos(limit).await? {
				println!("{}", url);
			}
		}
		Commands::Upload { path } => {
			let name = path
				.file_name()
				.and_then(|n| n.to_str())
				.context("upload path has no file name")?
				.to_string();
			let content_type = image_content_type(&name)
				.with_context(|| format!("'{}' does not look like an image", name))?;
			let bytes = tokio::fs::read(&path)
				.await
				.with_context(|| format!("failed to read {}", path.display()))?;

			let api = SiteApi::from_settings(sources::http_client()?, &settings.source);
			let uploaded = api.upload_photo(&name, content_type, bytes).await?;
			println!("{}", uploaded.url.unwrap_or_default());
		}
		Commands::Checkout {
			amount_sek,
			description,
		} => {
			let api = SiteApi::from_settings(sources::http_client()?, &settings.source);
			let session = api
				.create_checkout(amount_sek, description.as_deref())
				.await?;
			println!("{}", session);
		}
	}

	Ok(())
}
