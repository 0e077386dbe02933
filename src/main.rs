use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod errors;
mod forvo;
#[cfg(test)]
mod tests;
mod web;

use config::{Config, Overrides};
use forvo::{AudioSourceList, Forvo, SessionManager};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forvo_audio=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::Args::parse();

    let base_path = match args.base_path {
        Some(path) => path,
        None => Config::base_path()?,
    };
    let config = Config::load_with(&base_path)
        .with_context(|| format!("failed to load config from {base_path}"))?;

    let session = SessionManager::new(&config.server_host).context("failed to build http client")?;
    let forvo = Forvo::new(Arc::new(session));

    match args.command {
        cli::Command::Serve { port, language } => {
            let config = config.with_overrides(&Overrides { language, port });
            log::info!(
                "serving language {:?} on port {}",
                config.language,
                config.port
            );
            // blocking clients must not be dropped on a runtime thread
            web::start_daemon(forvo.clone(), Arc::new(config))
        }

        cli::Command::Lookup {
            term,
            reading,
            language,
            debug,
        } => {
            let config = config.with_overrides(&Overrides {
                language,
                ..Default::default()
            });

            let output = if debug {
                serde_json::to_string_pretty(&forvo.debug_report(&term, &reading, &config)?)?
            } else {
                let sources = forvo.resolve(&term, &reading, &config)?;
                serde_json::to_string_pretty(&AudioSourceList::from(sources))?
            };

            println!("{output}");
            Ok(())
        }
    }
}
