//! Read-side commands: character, relationship, arc, find-scene, search,
//! mystery, context.

use console::style;

use crate::state::AppState;

pub async fn character(state: &AppState, name: &str, json: bool) -> anyhow::Result<()> {
    let profile = state.agent.character_profile(name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", profile.profile_summary);
    if !profile.key_scenes.is_empty() {
        println!("\n{}", style("Key Scenes").bold());
        for scene in profile.key_scenes.iter().take(5) {
            println!(
                "- {} ({}): {}",
                scene.scene_id,
                scene.episode_id.as_deref().unwrap_or("?"),
                scene.summary.as_deref().unwrap_or("no summary")
            );
        }
    }
    Ok(())
}

pub async fn relationship(
    state: &AppState,
    character1: &str,
    character2: &str,
    json: bool,
) -> anyhow::Result<()> {
    let history = state.agent.relationship_history(character1, character2).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!("{}", history.summary);
    if !history.interaction_scenes.is_empty() {
        println!("\n{}", style("Interaction Scenes").bold());
        for scene in history.interaction_scenes.iter().take(5) {
            println!(
                "- {}: {}",
                scene.scene_id,
                scene.summary.as_deref().unwrap_or("no summary")
            );
        }
    }
    Ok(())
}

pub async fn plot_arc(state: &AppState, name: &str, json: bool) -> anyhow::Result<()> {
    let arc = state.agent.plot_arc_summary(name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&arc)?);
        return Ok(());
    }

    println!("{}", arc.summary);
    Ok(())
}

pub async fn find_scene(
    state: &AppState,
    query: &str,
    n_results: usize,
    json: bool,
) -> anyhow::Result<()> {
    let results = state.agent.find_scene(query, n_results).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!(
        "{} ({} results)",
        style(format!("Scenes matching \"{query}\"")).bold(),
        results.total_results
    );
    for hit in &results.results {
        println!(
            "- {} [{:.3}] {}",
            hit.scene_id,
            hit.relevance_score,
            hit.summary.as_deref().unwrap_or("no summary")
        );
        if !hit.characters.is_empty() {
            println!("    characters: {}", hit.characters.join(", "));
        }
    }
    Ok(())
}

pub async fn search(state: &AppState, query: &str, n_results: usize, json: bool) -> anyhow::Result<()> {
    let results = state.agent.search(query, n_results).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", style(format!("Results for \"{query}\"")).bold());
    for (collection, hits) in &results.hits {
        if hits.is_empty() {
            continue;
        }
        println!("\n{}", style(collection).underlined());
        for hit in hits {
            let first_line = hit.snippet.lines().next().unwrap_or("");
            println!("- {} [{:.3}] {}", hit.id, hit.relevance_score, first_line);
        }
    }
    Ok(())
}

pub async fn mystery(state: &AppState, description: &str, json: bool) -> anyhow::Result<()> {
    let report = state.agent.track_mystery(description).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", style(format!("Mystery: {description}")).bold());
    println!(
        "clues: {}  resolutions: {}  resolved: {}",
        report.total_clues, report.total_resolutions, report.is_resolved
    );
    for clue in &report.clues {
        println!(
            "- clue {} ({})",
            clue.title.as_deref().unwrap_or("untitled"),
            clue.episode_id.as_deref().unwrap_or("?")
        );
    }
    for resolution in &report.resolutions {
        println!(
            "- resolution {} ({})",
            resolution.title.as_deref().unwrap_or("untitled"),
            resolution.episode_id.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

pub async fn context(state: &AppState, season: u32, episode: u32, json: bool) -> anyhow::Result<()> {
    let context = state.agent.episode_context(season, episode).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }

    println!("{}", style(format!("Context before {}", context.target_episode)).bold());
    println!("previous episodes: {}", context.previous_episodes.join(", "));
    println!("known characters:  {}", context.known_characters.join(", "));
    println!("active plot arcs:  {}", context.active_plot_arcs.join(", "));
    for rel in &context.known_relationships {
        println!(
            "- {} & {} ({}, since {})",
            rel.character1, rel.character2, rel.relationship_type, rel.established_in
        );
    }
    Ok(())
}
