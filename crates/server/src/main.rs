//! Channel server entry point.
mod config;
mod demo;

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use channel_runtime::{Runtime, RuntimeConfig};
use config::ServerConfig;
use skill_content::{ContentFactory, LoadedSkills, SkillLoader};
use skill_core::CombatConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    let _guard = setup_logging(config.log_dir.as_deref())?;

    let (combat, skills) = load_content(&config)?;
    let runtime_config = config.runtime_config(RuntimeConfig {
        combat,
        ..RuntimeConfig::default()
    });

    let runtime = Runtime::builder()
        .config(runtime_config)
        .content(skills)
        .region(demo::arena())
        .build()
        .await?;

    demo::run(runtime).await
}

fn load_content(config: &ServerConfig) -> Result<(CombatConfig, LoadedSkills)> {
    match &config.content_dir {
        Some(dir) => {
            let factory = ContentFactory::new(dir);
            tracing::info!("Loading content from {}", factory.data_dir().display());
            Ok((factory.load_config()?, factory.load_skills()?))
        }
        None => {
            tracing::info!("CONTENT_DIR not set, using builtin content");
            Ok((CombatConfig::default(), SkillLoader::builtin()?))
        }
    }
}

/// Setup logging to stderr and, when a directory is given, to a file
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "channel-server.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        tracing::info!("Log file: {}/channel-server.log", dir.display());
    }

    Ok(guard)
}
