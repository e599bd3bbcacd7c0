use clap::Parser;
use moescape_comments::utils::{logger, validation::Validate};
use moescape_comments::{CliConfig, CommentPipeline, HarvestEngine, LocalStorage, LogProgress};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting moescape-comments CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = CommentPipeline::new(storage, config, LogProgress);
    let engine = HarvestEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Harvest completed successfully!");
            println!("✅ Harvest completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("❌ Harvest failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }

    Ok(())
}
