//! `lkeep reset` -- delete all stored knowledge for the series.

use console::style;
use dialoguer::Confirm;

use crate::state::AppState;

pub async fn run(state: &AppState, force: bool, json: bool) -> anyhow::Result<()> {
    let series = &state.agent.config().series_name;

    let confirmed = force
        || Confirm::new()
            .with_prompt(format!(
                "Delete ALL stored knowledge for '{series}'? This cannot be undone"
            ))
            .default(false)
            .interact()?;

    let performed = state.agent.reset_database(confirmed).await?;

    if json {
        println!("{}", serde_json::json!({ "reset": performed }));
        return Ok(());
    }

    if performed {
        println!("{} database reset for '{series}'", style("ok").green().bold());
    } else {
        println!("reset aborted");
    }
    Ok(())
}
