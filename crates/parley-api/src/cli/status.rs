//! System status command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display catalog size, upstream endpoints and storage location.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let models = state.model_service.list_models().await?;
    let premium = models.iter().filter(|m| m.premium).count();
    let config = &state.config;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "models": {
                "total": models.len(),
                "free": models.len() - premium,
                "premium": premium,
            },
            "inference_url": config.inference.base_url,
            "enrichment_url": config.enrichment.base_url,
            "analytics_enabled": config.analytics.enabled && config.analytics.api_key.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Parley v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Models ──").dim());
    println!("  Total:   {}", style(models.len()).bold());
    println!("  Free:    {}", style(models.len() - premium).green());
    println!("  Premium: {}", style(premium).yellow());
    println!();

    println!("  {}", style("── Upstreams ──").dim());
    println!("  Inference:  {}", style(&config.inference.base_url).cyan());
    println!("  Enrichment: {}", style(&config.enrichment.base_url).cyan());
    let analytics = if config.analytics.enabled && config.analytics.api_key.is_some() {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("  Analytics:  {analytics}");
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();
    Ok(())
}
