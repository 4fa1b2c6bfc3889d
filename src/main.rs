mod cli;
mod error;
mod service;

use clap::Parser as _;
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tagcache_cache::{Database, Store};
use tagcache_config::Config;
use tagcache_extract::codec::AutoCodec;
use tagcache_extract::models::Metadata;
use tagcache_extract::{Parser, ParserOptions};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use crate::service::MetadataService;

#[derive(Serialize)]
struct Entry<'a> {
    path: &'a std::path::Path,
    metadata: &'a Metadata,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = tagcache_config::load(cli.config.as_deref()).map_err(|err| miette::miette!("{err:?}"))?;
    init_logging(&config.log);
    run(cli, config).await.map_err(|err| miette::miette!("{err:?}"))
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Command::Genres = cli.command {
        return print_lines(tagcache_extract::genre::alphabetical());
    }
    let database = cli.database.unwrap_or(config.database);
    let db = Database::connect(&database).await.or_raise(|| ErrorKind::Cache)?;
    let parser = Parser::new(Arc::new(AutoCodec), ParserOptions { probe_audio: config.probe_audio });
    let service = MetadataService::new(Store::new(db), parser);
    let result = execute(&service, cli.command).await;
    // Close even after a failure so that work already cached is kept.
    service.close().await?;
    result
}

async fn execute(service: &MetadataService, command: Command) -> Result<()> {
    match command {
        Command::Show { paths } => {
            let mut shown = Vec::with_capacity(paths.len());
            let mut failed = 0;
            for path in &paths {
                match service.metadata(path).await {
                    Ok(metadata) => shown.push((path, metadata)),
                    Err(err) => {
                        tracing::error!(path = %path.display(), "{err:?}");
                        failed += 1;
                    },
                }
            }
            let entries: Vec<_> = shown.iter().map(|(path, metadata)| Entry { path, metadata }).collect();
            print_json(&entries)?;
            if failed > 0 {
                exn::bail!(ErrorKind::Failed(failed));
            }
        },
        Command::Edit(args) => {
            let mut metadata = service.metadata(&args.path).await?;
            args.apply(&mut metadata);
            service.write(&args.path, &metadata).await?;
            let metadata = service.metadata(&args.path).await?;
            print_json(&Entry { path: &args.path, metadata: &metadata })?;
        },
        Command::Art { path, output } => {
            let artwork = service.artwork(&path).await?.ok_or_raise(|| ErrorKind::NoArtwork(path.clone()))?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("cover.{}", artwork.extension())));
            tokio::fs::write(&output, &artwork.data).await.or_raise(|| ErrorKind::Output)?;
            tracing::info!(path = %output.display(), bytes = artwork.data.len(), "Saved artwork");
        },
        Command::Forget { paths } => {
            for path in &paths {
                let removed = service.forget(path).await?;
                tracing::info!(path = %path.display(), removed, "Forgot cached metadata");
            }
        },
        Command::Genres => print_lines(tagcache_extract::genre::alphabetical())?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}

fn print_lines(lines: impl IntoIterator<Item = impl std::fmt::Display>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}").or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}
