//! `lkeep stats` and `lkeep health`.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use console::style;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> anyhow::Result<()> {
    let stats = state.agent.statistics().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", style(format!("Series: {}", stats.series_name)).bold());
    println!("database: {}", stats.database_location);
    println!("embeddings: {}", stats.embedding_model);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["collection", "records"]);
    for (collection, count) in &stats.totals {
        table.add_row(vec![collection.clone(), count.to_string()]);
    }
    println!("{table}");
    Ok(())
}

pub async fn health(state: &AppState, json: bool) -> anyhow::Result<()> {
    let report = state.agent.health_check().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let status = match report.status {
        lorekeep_core::agent::HealthStatus::Healthy => style("healthy").green(),
        lorekeep_core::agent::HealthStatus::Degraded => style("degraded").yellow(),
        lorekeep_core::agent::HealthStatus::Unhealthy => style("unhealthy").red(),
    };
    println!("{} {}", style(&report.series_name).bold(), status);
    println!("database: {}", report.database.status);
    if let Some(collections) = &report.database.collections {
        for (collection, count) in collections {
            println!("  {collection}: {count}");
        }
    }
    println!("llm: {}", report.llm.status);
    if let Some(detail) = &report.llm.detail {
        println!("  {detail}");
    }
    Ok(())
}
