//! `lkeep ingest` -- process an episode transcript.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use lorekeep_types::episode::EpisodeInfo;

use crate::state::AppState;

pub async fn run(
    state: &AppState,
    transcript_path: &Path,
    season: u32,
    episode: u32,
    title: &str,
    air_date: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let transcript = tokio::fs::read_to_string(transcript_path).await.map_err(|e| {
        anyhow::anyhow!("cannot read transcript {}: {e}", transcript_path.display())
    })?;

    let mut info = EpisodeInfo::new(season, episode, title);
    info.air_date = air_date.map(str::to_string);
    let episode_id = info.episode_id();

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
        );
        spinner.set_message(format!("Processing {episode_id}: {title}"));
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        spinner
    };

    let result = state.agent.process_episode(&transcript, info).await;
    spinner.finish_and_clear();

    let processed = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
        return Ok(());
    }

    println!("{} processed {episode_id}", style("ok").green().bold());
    println!("  scenes:        {}", processed.scenes.len());
    println!("  characters:    {}", processed.characters_introduced.len());
    println!("  plot arcs:     {}", processed.plot_arcs.join(", "));
    println!("  importance:    {:.2}", processed.importance_score);
    if let Some(summary) = &processed.summary {
        println!("\n{}", style("Digest").bold());
        println!("{summary}");
    }
    Ok(())
}
