mod cli;
mod demo;

use anyhow::Result;
use clap::Parser;
use textgen_ai::LlamaPipelineFactory;
use textgen_core::config::AppConfig;
use textgen_core::lifecycle;

use cli::Cli;

fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref());

    lifecycle::log_startup();
    tracing::info!("Model directory: {}", config.inference.model_dir);

    let factory = LlamaPipelineFactory::new(config.inference.clone());
    let mut stdout = std::io::stdout().lock();
    demo::run(&factory, &config.demo, &mut stdout)?;

    lifecycle::log_shutdown();
    Ok(())
}
