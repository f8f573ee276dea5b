use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_kernel::{settings::Settings, InitCtx};

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Book lookup service")]
struct Cli {
    /// Deployment environment: local, staging or production
    #[arg(long, global = true, env = "FOLIO_ENV", default_value = "local")]
    env: String,

    /// Directory holding `base.toml` and `{env}.toml`
    #[arg(long, global = true, env = "FOLIO_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the effective settings as JSON and exit
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    Settings::load_dotenv();
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config_dir, &cli.env)
        .with_context(|| "failed to load Folio settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::CheckConfig => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Serve => {
            folio_telemetry::init(&settings.telemetry)?;
            tokio::runtime::Runtime::new()
                .context("failed to start tokio runtime")?
                .block_on(serve(settings))
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = settings.environment.as_str(),
        address = %settings.server.bind_address(),
        "folio bootstrap starting"
    );

    let registry = folio_app::build_registry(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = folio_http::start_server(&registry, &settings).await;

    // Modules are stopped even when the server exits with an error.
    let stopped = registry.stop_modules().await;
    served?;
    stopped?;

    tracing::info!("folio shut down cleanly");
    Ok(())
}
