//! `lkeep summary` -- generate a comprehensive episode summary.

use console::style;

use crate::state::AppState;

pub async fn run(state: &AppState, season: u32, episode: u32, json: bool) -> anyhow::Result<()> {
    let summary = state.agent.generate_episode_summary(season, episode).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "season": season,
                "episode": episode,
                "summary": summary,
            }))?
        );
        return Ok(());
    }

    println!("{}", style(format!("S{season:02}E{episode:02}")).bold());
    println!("{summary}");
    Ok(())
}
