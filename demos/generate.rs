use rveo::{ClientConfig, ErrorCategory, VeoClient};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    rveo::logger::init()?;

    let config = ClientConfig::from_env().with_settings_dir(
        env::var("VEO_SETTINGS_DIR").unwrap_or_else(|_| ".rveo".to_string()),
    );
    rveo::logger::log_client_config(&config);

    let client = VeoClient::new(config);
    let mut settings = client.restore_configuration().await;

    if let Some(prompt) = env::args().nth(1) {
        settings = settings.with_prompt(prompt);
        client.update_configuration(&settings).await;
    }

    match client.generate(&settings).await {
        Ok(videos) => {
            for video in videos {
                tokio::fs::write(&video.file_name, &video.data).await?;
                log::info!("💾 Saved {} ({} bytes)", video.file_name, video.len());
            }
        }
        Err(e) if e.category == ErrorCategory::ValidationError => {
            log::warn!("{} (pass the prompt as the first argument)", e);
        }
        Err(e) => log::error!("Generation failed [{}]: {}", e.category.as_str(), e),
    }

    Ok(())
}
