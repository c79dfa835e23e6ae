use city_weather::config::Config;
use city_weather::session::Session;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,city_weather=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load_or_default("config/config.yaml").map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {}\n\n\
             Make sure:\n\
             1. config/config.yaml is valid YAML (or remove it to use defaults)\n\
             2. Every ${{VAR}} it references is set in the environment or .env",
            e
        )
    })?;
    info!("Configuration loaded");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut session = Session::new(&config, stdin.lock(), stdout.lock())?;
    session.run().await?;

    Ok(())
}
