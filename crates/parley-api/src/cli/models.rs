//! Model catalog commands.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use parley_types::model::NewModel;

use crate::state::AppState;

/// List the catalog as a table, free models first.
pub async fn list_models(state: &AppState, json: bool) -> Result<()> {
    let models = state.model_service.list_models().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    if models.is_empty() {
        println!();
        println!("  No models yet. Add one with {}", style("parley models add").cyan());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("System Name").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Providers").fg(Color::White),
        Cell::new("Capabilities").fg(Color::White),
    ]);

    for model in &models {
        let tier = if model.premium {
            Cell::new("premium").fg(Color::Yellow)
        } else {
            Cell::new("free").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&model.display_name).fg(Color::Cyan),
            Cell::new(&model.system_name),
            tier,
            Cell::new(model.providers.join(", ")),
            Cell::new(model.capabilities.join(", ")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Add a model to the catalog.
pub async fn add_model(state: &AppState, new: NewModel, json: bool) -> Result<()> {
    let model = state.model_service.add_model(new).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Added {} ({})",
        style("✓").green().bold(),
        style(&model.display_name).cyan(),
        model.id
    );
    println!();
    Ok(())
}
