use ::atlas_common::{config::load_config, error::Result, tokio, tracing::info, tracing_subscriber};
use ::atlas_provider::{
    cli::{Cli, Provider},
    config::ProviderConfig,
};
use ::clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // setup tracing
    tracing_subscriber::fmt::init();

    let Cli { args, command } = Cli::parse();
    let config: ProviderConfig = load_config(&args.config_path)?;
    info!("Using Atlas API at {}", config.base_url);

    Provider::new(config)?.run(command).await
}
