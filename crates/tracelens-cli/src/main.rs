// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracelens command line: symbolicate stacks locally, ingest them into a
//! SQLite store and triage stored reports.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracelens_config::Config;
use tracelens_core::{ReportId, ReportStatus};
use tracelens_geocode::{HttpReverseGeocoder, NoopGeocoder, ReverseGeocoder};
use tracelens_server_ingest::{
	create_pool, run_migrations, IngestRequest, IngestService, SqliteReportRepository,
};
use tracelens_symbolicate::{HttpSourceFetcher, Symbolicator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Tracelens - stack trace symbolication for client error reports.
#[derive(Parser, Debug)]
#[command(name = "tracelens", about = "Client error symbolication and triage", version)]
struct Args {
	/// Config file (defaults to /etc/tracelens/config.toml)
	#[arg(long, global = true, env = "TRACELENS_CONFIG")]
	config: Option<PathBuf>,

	/// Log output format (logs go to stderr)
	#[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
	log_format: LogFormat,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
	Text,
	Json,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Symbolicate a stack trace and print the report as JSON
	Symbolicate {
		/// File containing the stack; reads stdin when omitted or `-`
		input: Option<PathBuf>,

		/// Pretty-print the JSON output
		#[arg(long)]
		pretty: bool,
	},

	/// Symbolicate, geocode and store a stack trace
	Ingest {
		/// Grouping key to file the report under
		#[arg(long)]
		group: String,

		/// File containing the stack; reads stdin when omitted or `-`
		input: Option<PathBuf>,

		#[arg(long, allow_hyphen_values = true, requires = "longitude")]
		latitude: Option<f64>,

		#[arg(long, allow_hyphen_values = true, requires = "latitude")]
		longitude: Option<f64>,

		/// Extra client context as a JSON object
		#[arg(long)]
		metadata: Option<String>,
	},

	/// Inspect and triage stored reports
	Report {
		#[command(subcommand)]
		command: ReportCommand,
	},

	/// Show version and build information
	Version,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
	/// List reports in a group, newest first
	List {
		group: String,

		#[arg(long)]
		limit: Option<u32>,
	},

	/// Print one report
	Get { id: ReportId },

	/// Set the triage status of a report (open, resolved, ignored)
	Status { id: ReportId, status: ReportStatus },

	/// Delete one report
	Delete { id: ReportId },

	/// Delete every report in a group
	DeleteGroup { group: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => tracelens_config::load_config_with_file(path)?,
		None => tracelens_config::load_config()?,
	};

	init_tracing(&config.logging.level, args.log_format);

	match args.command {
		Command::Symbolicate { input, pretty } => {
			let stack = read_input(input.as_deref())?;
			let symbolicator = Symbolicator::from_config(config.symbolicate.clone())?;
			let report = symbolicator.symbolicate(&stack).await?;
			print_json(&report, pretty)?;
		}
		Command::Ingest {
			group,
			input,
			latitude,
			longitude,
			metadata,
		} => {
			let stack = read_input(input.as_deref())?;
			let metadata = match metadata {
				Some(raw) => serde_json::from_str(&raw).context("--metadata must be valid JSON")?,
				None => serde_json::Value::Object(serde_json::Map::new()),
			};

			let service = build_service(&config).await?;
			let report = service
				.ingest(IngestRequest {
					group,
					stack,
					latitude,
					longitude,
					metadata,
				})
				.await?;
			print_json(&report, true)?;
		}
		Command::Report { command } => {
			let service = build_service(&config).await?;
			match command {
				ReportCommand::List { group, limit } => {
					let reports = service.list_reports(&group, limit).await?;
					print_json(&reports, true)?;
				}
				ReportCommand::Get { id } => {
					print_json(&service.get_report(id).await?, true)?;
				}
				ReportCommand::Status { id, status } => {
					service.set_status(id, status).await?;
					println!("{id}: {status}");
				}
				ReportCommand::Delete { id } => {
					service.delete_report(id).await?;
					println!("deleted {id}");
				}
				ReportCommand::DeleteGroup { group } => {
					let deleted = service.delete_group(&group).await?;
					println!("deleted {deleted} report(s) from {group}");
				}
			}
		}
		// printed before configuration is loaded
		Command::Version => {}
	}

	Ok(())
}

fn init_tracing(default_level: &str, format: LogFormat) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| default_level.into());

	let registry = tracing_subscriber::registry().with(filter);
	match format {
		LogFormat::Text => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
	}
}

async fn build_service(config: &Config) -> anyhow::Result<IngestService<HttpSourceFetcher>> {
	tracing::info!(database = %config.database.url, "opening report store");
	let pool = create_pool(&config.database.url).await?;
	run_migrations(&pool).await?;

	let geocoder: Arc<dyn ReverseGeocoder> = match &config.geocode {
		Some(geocode) => Arc::new(HttpReverseGeocoder::new(geocode)?),
		None => Arc::new(NoopGeocoder),
	};

	Ok(IngestService::new(
		Arc::new(SqliteReportRepository::new(pool)),
		Arc::new(Symbolicator::from_config(config.symbolicate.clone())?),
		geocoder,
	))
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
	match path {
		Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display())),
		_ => {
			let mut buf = String::new();
			std::io::stdin()
				.read_to_string(&mut buf)
				.context("failed to read stack from stdin")?;
			Ok(buf)
		}
	}
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
	let json = if pretty {
		serde_json::to_string_pretty(value)?
	} else {
		serde_json::to_string(value)?
	};
	println!("{json}");
	Ok(())
}
