//! The series archive: typed persistence over the vector store.
//!
//! Renders each record into a searchable document string plus flat metadata,
//! embeds the document, and delegates to the [`VectorStore`] port. Characters
//! and relationships are cumulative: re-adding an existing name/pair merges
//! into the stored record instead of creating a duplicate. Transient storage
//! failures retry with bounded backoff.

use std::collections::BTreeMap;

use serde_json::json;

use lorekeep_types::character::Character;
use lorekeep_types::episode::Episode;
use lorekeep_types::error::StorageError;
use lorekeep_types::event::PlotEvent;
use lorekeep_types::relationship::Relationship;
use lorekeep_types::scene::Scene;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::store::{BoxEmbedder, BoxVectorStore};

/// Typed persistence facade over the five collections.
pub struct SeriesArchive {
    store: BoxVectorStore,
    embedder: BoxEmbedder,
    retry: RetryPolicy,
}

impl SeriesArchive {
    pub fn new(store: BoxVectorStore, embedder: BoxEmbedder) -> Self {
        Self { store, embedder, retry: RetryPolicy::default() }
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    async fn put(&self, collection: Collection, entry: DocumentEntry) -> Result<(), StorageError> {
        let embedding = self.embedder.embed_one(&entry.document).await?;
        retry_with_backoff(self.retry, StorageError::is_transient, || {
            self.store.insert(collection, &entry, &embedding)
        })
        .await?;
        tracing::debug!(collection = %collection, id = %entry.id, "stored record");
        Ok(())
    }

    /// Add an episode record. The caller is responsible for removing a stale
    /// version first (see [`Self::delete_episode`]).
    pub async fn add_episode(&self, episode: &Episode) -> Result<(), StorageError> {
        let entry = DocumentEntry::new(
            episode.id.clone(),
            render_episode(episode),
            episode_metadata(episode),
        );
        self.put(Collection::Episodes, entry).await
    }

    pub async fn add_scene(&self, scene: &Scene) -> Result<(), StorageError> {
        let entry = DocumentEntry::new(scene.id.clone(), render_scene(scene), scene_metadata(scene));
        self.put(Collection::Scenes, entry).await
    }

    /// Add or cumulatively update a character profile. The name is the
    /// identity key; an existing record absorbs the new extraction.
    pub async fn add_character(&self, character: &Character) -> Result<(), StorageError> {
        let merged = match self.get_character_record(&character.name).await? {
            Some(mut existing) => {
                existing.absorb(character.clone());
                self.store
                    .delete(Collection::Characters, &[Character::record_id(&character.name)])
                    .await?;
                existing
            }
            None => character.clone(),
        };
        let entry = DocumentEntry::new(
            Character::record_id(&merged.name),
            render_character(&merged),
            character_metadata(&merged),
        );
        self.put(Collection::Characters, entry).await
    }

    /// Add or cumulatively update a relationship. The unordered pair id is
    /// the identity key.
    pub async fn add_relationship(&self, relationship: &Relationship) -> Result<(), StorageError> {
        let episode_id = relationship
            .first_interaction
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let merged = match self
            .get_relationship_record(&relationship.character1, &relationship.character2)
            .await?
        {
            Some(mut existing) => {
                existing.absorb(relationship.clone(), &episode_id);
                self.store
                    .delete(Collection::Relationships, &[existing.id.clone()])
                    .await?;
                existing
            }
            None => relationship.clone(),
        };
        let entry = DocumentEntry::new(
            merged.id.clone(),
            render_relationship(&merged),
            relationship_metadata(&merged),
        );
        self.put(Collection::Relationships, entry).await
    }

    /// Plot events are append-only and never deleted.
    pub async fn add_plot_event(&self, event: &PlotEvent) -> Result<(), StorageError> {
        let entry = DocumentEntry::new(event.id.clone(), render_event(event), event_metadata(event));
        self.put(Collection::PlotEvents, entry).await
    }

    /// Semantic search: embed the query text, rank by similarity.
    pub async fn query(
        &self,
        collection: Collection,
        text: &str,
        n_results: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        let embedding = self.embedder.embed_one(text).await?;
        retry_with_backoff(self.retry, StorageError::is_transient, || {
            self.store.search(collection, &embedding, n_results, filter)
        })
        .await
    }

    pub async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<DocumentEntry>, StorageError> {
        retry_with_backoff(self.retry, StorageError::is_transient, || {
            self.store.get(collection, id)
        })
        .await
    }

    pub async fn scan(
        &self,
        collection: Collection,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentEntry>, StorageError> {
        retry_with_backoff(self.retry, StorageError::is_transient, || {
            self.store.scan(collection, filter, limit)
        })
        .await
    }

    pub async fn get_episode(&self, episode_id: &str) -> Result<Option<DocumentEntry>, StorageError> {
        self.get(Collection::Episodes, episode_id).await
    }

    pub async fn get_character(&self, name: &str) -> Result<Option<DocumentEntry>, StorageError> {
        self.get(Collection::Characters, &Character::record_id(name)).await
    }

    /// The full typed character record, reconstructed from metadata.
    pub async fn get_character_record(&self, name: &str) -> Result<Option<Character>, StorageError> {
        Ok(self
            .get_character(name)
            .await?
            .and_then(|entry| entry.metadata.get("record").cloned())
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    /// Exact relationship lookup; (A, B) and (B, A) hit the same record.
    pub async fn get_relationship(&self, a: &str, b: &str) -> Result<Option<DocumentEntry>, StorageError> {
        self.get(Collection::Relationships, &Relationship::pair_id(a, b)).await
    }

    pub async fn get_relationship_record(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Relationship>, StorageError> {
        Ok(self
            .get_relationship(a, b)
            .await?
            .and_then(|entry| entry.metadata.get("record").cloned())
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    /// All scenes of an episode, ordered by scene number.
    pub async fn scenes_for_episode(&self, episode_id: &str) -> Result<Vec<DocumentEntry>, StorageError> {
        let filter = SearchFilter::EpisodeId(episode_id.to_string());
        let mut scenes = self.scan(Collection::Scenes, Some(&filter), usize::MAX).await?;
        scenes.sort_by_key(|entry| entry.meta_f64("scene_number").unwrap_or(0.0) as u64);
        Ok(scenes)
    }

    /// All stored episodes ordered by id (season/episode order falls out of
    /// the `SxxEyy` format).
    pub async fn list_episodes(&self) -> Result<Vec<DocumentEntry>, StorageError> {
        let mut episodes = self.scan(Collection::Episodes, None, usize::MAX).await?;
        episodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(episodes)
    }

    /// Delete an episode and all of its scenes.
    pub async fn delete_episode(&self, episode_id: &str) -> Result<(), StorageError> {
        self.store
            .delete(Collection::Episodes, &[episode_id.to_string()])
            .await?;
        let scene_ids: Vec<String> = self
            .scenes_for_episode(episode_id)
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        if !scene_ids.is_empty() {
            self.store.delete(Collection::Scenes, &scene_ids).await?;
        }
        tracing::info!(episode_id, scene_count = scene_ids.len(), "deleted stale episode");
        Ok(())
    }

    /// Per-collection record counts.
    pub async fn counts(&self) -> Result<BTreeMap<String, u64>, StorageError> {
        let mut counts = BTreeMap::new();
        for collection in Collection::ALL {
            counts.insert(collection.to_string(), self.store.count(collection).await?);
        }
        Ok(counts)
    }

    /// Delete all data in every collection.
    pub async fn reset(&self) -> Result<(), StorageError> {
        tracing::warn!("resetting archive - all data will be deleted");
        self.store.reset().await
    }
}

fn render_episode(episode: &Episode) -> String {
    let mut doc = format!("Episode {}: {}\n\n", episode.id, episode.info.title);
    doc.push_str(&format!(
        "Summary: {}\n\n",
        episode.summary.as_deref().unwrap_or("No summary available")
    ));
    doc.push_str(&format!("Transcript: {}", episode.transcript));
    doc
}

fn episode_metadata(episode: &Episode) -> serde_json::Value {
    json!({
        "episode_id": episode.id,
        "season": episode.info.season,
        "episode": episode.info.episode,
        "title": episode.info.title,
        "air_date": episode.info.air_date,
        "summary": episode.summary,
        "characters_introduced": episode.characters_introduced,
        "plot_arcs": episode.plot_arcs,
        "importance_score": episode.importance_score,
        "processed_at": episode.processed_at.to_rfc3339(),
    })
}

fn render_scene(scene: &Scene) -> String {
    let mut doc = format!("Scene {}\n", scene.id);
    doc.push_str(&format!("Episode: {}\n", scene.episode_id));
    doc.push_str(&format!("Location: {}\n", scene.location.as_deref().unwrap_or("Unknown")));
    doc.push_str(&format!("Characters: {}\n\n", scene.characters_present.join(", ")));
    doc.push_str(&format!("Summary: {}\n\n", scene.summary.as_deref().unwrap_or("No summary")));
    doc.push_str(&format!("Content: {}", scene.content));
    doc
}

fn scene_metadata(scene: &Scene) -> serde_json::Value {
    json!({
        "scene_id": scene.id,
        "episode_id": scene.episode_id,
        "scene_number": scene.scene_number,
        "location": scene.location,
        "summary": scene.summary,
        "characters_present": scene.characters_present.join(", "),
        "plot_relevance": scene.plot_relevance,
        "importance_score": scene.importance_score,
        "processed_at": scene.processed_at.to_rfc3339(),
    })
}

fn render_character(character: &Character) -> String {
    let mut doc = format!("Character: {}\n", character.name);
    if !character.aliases.is_empty() {
        doc.push_str(&format!("Aliases: {}\n", character.aliases.join(", ")));
    }
    doc.push_str(&format!("Role: {}\n", character.role));
    doc.push_str(&format!(
        "Description: {}\n",
        character.description.as_deref().unwrap_or("No description")
    ));
    doc.push_str(&format!(
        "Occupation: {}\n",
        character.occupation.as_deref().unwrap_or("Unknown")
    ));
    doc.push_str(&format!(
        "Background: {}\n\n",
        character.background.as_deref().unwrap_or("No background")
    ));
    doc.push_str(&format!("Personality Traits: {}\n", character.personality_traits.join(", ")));
    doc.push_str(&format!("Goals/Motivations: {}\n", character.goals_motivations.join(", ")));
    doc.push_str(&format!("Skills/Abilities: {}\n", character.skills_abilities.join(", ")));
    doc.push_str(&format!(
        "Character Arc: {}\n",
        character.character_arc.as_deref().unwrap_or("No defined arc")
    ));
    if !character.important_quotes.is_empty() {
        doc.push_str("\nImportant Quotes:\n");
        for quote in &character.important_quotes {
            doc.push_str(&format!("- {quote}\n"));
        }
    }
    doc
}

fn character_metadata(character: &Character) -> serde_json::Value {
    json!({
        "character_name": character.name,
        "role": character.role.to_string(),
        "first_appearance": character.first_appearance,
        "last_appearance": character.last_appearance,
        "importance_score": character.importance_score,
        "created_at": character.created_at.to_rfc3339(),
        "updated_at": character.updated_at.to_rfc3339(),
        "record": character,
    })
}

fn render_relationship(rel: &Relationship) -> String {
    let mut doc = format!("Relationship: {} and {}\n", rel.character1, rel.character2);
    doc.push_str(&format!("Type: {}\n", rel.relationship_type));
    doc.push_str(&format!("Status: {}\n", rel.current_status));
    doc.push_str(&format!(
        "Description: {}\n\n",
        rel.description.as_deref().unwrap_or("No description")
    ));
    if let Some(met) = &rel.how_they_met {
        doc.push_str(&format!("How they met: {met}\n"));
    }
    if let Some(dynamic) = &rel.dynamic {
        doc.push_str(&format!("Dynamic: {dynamic}\n\n"));
    }
    if !rel.important_dialogue.is_empty() {
        doc.push_str("Important Dialogue:\n");
        for dialogue in &rel.important_dialogue {
            doc.push_str(&format!("- {dialogue}\n"));
        }
    }
    if !rel.changes.is_empty() {
        doc.push_str("\nRelationship Timeline:\n");
        for change in rel.timeline() {
            doc.push_str(&format!("- {}: {}\n", change.episode_id, change.description));
        }
    }
    doc
}

fn relationship_metadata(rel: &Relationship) -> serde_json::Value {
    json!({
        "relationship_id": rel.id,
        "character1": rel.character1,
        "character2": rel.character2,
        "relationship_type": rel.relationship_type.to_string(),
        "current_status": rel.current_status.to_string(),
        "first_interaction": rel.first_interaction,
        "importance_score": rel.importance_score,
        "emotional_intensity": rel.emotional_intensity,
        "record": rel,
    })
}

fn render_event(event: &PlotEvent) -> String {
    let mut doc = format!("Plot Event: {}\n", event.title);
    doc.push_str(&format!("Type: {}\n", event.event_type));
    doc.push_str(&format!("Importance: {}\n", event.importance));
    doc.push_str(&format!("Episode: {}\n", event.episode_id));
    if let Some(scene_id) = &event.scene_id {
        doc.push_str(&format!("Scene: {scene_id}\n"));
    }
    doc.push_str(&format!("\nDescription: {}\n\n", event.description));
    if !event.characters_involved.is_empty() {
        doc.push_str(&format!("Characters Involved: {}\n", event.characters_involved.join(", ")));
    }
    if let Some(arc) = &event.plot_arc {
        doc.push_str(&format!("Plot Arc: {arc}\n"));
    }
    if !event.themes.is_empty() {
        doc.push_str(&format!("Themes: {}\n", event.themes.join(", ")));
    }
    if !event.mystery_elements.is_empty() {
        doc.push_str(&format!("Mystery Elements: {}\n", event.mystery_elements.join(", ")));
    }
    if !event.reveals_information.is_empty() {
        doc.push_str(&format!("Reveals: {}\n", event.reveals_information.join(", ")));
    }
    if !event.questions_raised.is_empty() {
        doc.push_str(&format!("Questions Raised: {}\n", event.questions_raised.join(", ")));
    }
    if !event.questions_answered.is_empty() {
        doc.push_str(&format!("Questions Answered: {}\n", event.questions_answered.join(", ")));
    }
    doc
}

fn event_metadata(event: &PlotEvent) -> serde_json::Value {
    json!({
        "event_id": event.id,
        "title": event.title,
        "event_type": event.event_type.to_string(),
        "importance": event.importance.to_string(),
        "episode_id": event.episode_id,
        "scene_id": event.scene_id,
        "plot_arc": event.plot_arc,
        "characters_involved": event.characters_involved,
        "mystery_elements": event.mystery_elements.join("; "),
        "emotional_impact": event.emotional_impact,
        "plot_significance": event.plot_significance,
        "created_at": event.created_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubEmbedder, StubStore};
    use lorekeep_types::episode::EpisodeInfo;
    use lorekeep_types::relationship::RelationshipStatus;

    fn archive() -> SeriesArchive {
        SeriesArchive::new(
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
        )
    }

    fn sample_episode() -> Episode {
        let mut episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "ALICE: Hello.");
        episode.summary = Some("Alice arrives in town.".to_string());
        episode
    }

    #[tokio::test]
    async fn test_episode_roundtrip() {
        let archive = archive();
        archive.add_episode(&sample_episode()).await.unwrap();

        let entry = archive.get_episode("S01E01").await.unwrap().unwrap();
        assert!(entry.document.starts_with("Episode S01E01: Pilot"));
        assert_eq!(entry.meta_str("title"), Some("Pilot"));
        assert_eq!(entry.meta_f64("season"), Some(1.0));
    }

    #[tokio::test]
    async fn test_character_merge_is_cumulative() {
        let archive = archive();

        let mut first = Character::new("Alice");
        first.personality_traits = vec!["stubborn".to_string()];
        first.add_appearance("S01E01");
        archive.add_character(&first).await.unwrap();

        let mut second = Character::new("Alice");
        second.personality_traits = vec!["loyal".to_string()];
        second.add_appearance("S01E02");
        archive.add_character(&second).await.unwrap();

        // One record, merged fields.
        assert_eq!(archive.counts().await.unwrap()["characters"], 1);
        let record = archive.get_character_record("Alice").await.unwrap().unwrap();
        assert_eq!(record.personality_traits, vec!["stubborn", "loyal"]);
        assert_eq!(record.episode_appearances, vec!["S01E01", "S01E02"]);
    }

    #[tokio::test]
    async fn test_relationship_lookup_is_symmetric() {
        let archive = archive();
        let mut rel = Relationship::new("Alice", "Bob");
        rel.first_interaction = Some("S01E01".to_string());
        archive.add_relationship(&rel).await.unwrap();

        let ab = archive.get_relationship("Alice", "Bob").await.unwrap().unwrap();
        let ba = archive.get_relationship("Bob", "Alice").await.unwrap().unwrap();
        assert_eq!(ab.id, ba.id);
        assert_eq!(ab.document, ba.document);
    }

    #[tokio::test]
    async fn test_relationship_merge_records_status_change() {
        let archive = archive();

        let mut first = Relationship::new("Alice", "Bob");
        first.current_status = RelationshipStatus::Established;
        first.first_interaction = Some("S01E01".to_string());
        archive.add_relationship(&first).await.unwrap();

        let mut second = Relationship::new("Alice", "Bob");
        second.current_status = RelationshipStatus::Strained;
        second.first_interaction = Some("S01E02".to_string());
        archive.add_relationship(&second).await.unwrap();

        assert_eq!(archive.counts().await.unwrap()["relationships"], 1);
        let record = archive.get_relationship_record("Bob", "Alice").await.unwrap().unwrap();
        assert_eq!(record.current_status, RelationshipStatus::Strained);
        assert_eq!(record.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_scenes_for_episode_ordered() {
        let archive = archive();
        for n in [3u32, 1, 2] {
            let scene = Scene::new("S01E01", n, format!("scene {n} content"));
            archive.add_scene(&scene).await.unwrap();
        }
        let scene = Scene::new("S01E02", 1, "other episode");
        archive.add_scene(&scene).await.unwrap();

        let scenes = archive.scenes_for_episode("S01E01").await.unwrap();
        let numbers: Vec<u64> = scenes
            .iter()
            .map(|s| s.meta_f64("scene_number").unwrap() as u64)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_episode_removes_scenes() {
        let archive = archive();
        archive.add_episode(&sample_episode()).await.unwrap();
        archive.add_scene(&Scene::new("S01E01", 1, "content")).await.unwrap();
        archive.add_scene(&Scene::new("S01E01", 2, "content")).await.unwrap();

        archive.delete_episode("S01E01").await.unwrap();

        assert!(archive.get_episode("S01E01").await.unwrap().is_none());
        assert!(archive.scenes_for_episode("S01E01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_empties_every_collection() {
        let archive = archive();
        archive.add_episode(&sample_episode()).await.unwrap();
        archive.add_scene(&Scene::new("S01E01", 1, "content")).await.unwrap();
        archive.add_character(&Character::new("Alice")).await.unwrap();
        archive.add_relationship(&Relationship::new("Alice", "Bob")).await.unwrap();
        archive
            .add_plot_event(&PlotEvent::new("e1", "Arrival", "Alice arrives", "S01E01"))
            .await
            .unwrap();

        archive.reset().await.unwrap();

        for (_, count) in archive.counts().await.unwrap() {
            assert_eq!(count, 0);
        }
        let hits = archive.query(Collection::Scenes, "anything", 5, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_is_deterministic() {
        let archive = archive();
        let mut scene = Scene::new("S01E01", 1, "Alice and Bob argue in the kitchen");
        scene.summary = Some("A kitchen argument".to_string());
        archive.add_scene(&scene).await.unwrap();
        let scene2 = Scene::new("S01E01", 2, "Bob walks alone on the beach");
        archive.add_scene(&scene2).await.unwrap();

        let first = archive.query(Collection::Scenes, "kitchen argument", 5, None).await.unwrap();
        let second = archive.query(Collection::Scenes, "kitchen argument", 5, None).await.unwrap();
        assert_eq!(first[0].entry.id, second[0].entry.id);
        assert_eq!(first[0].distance, second[0].distance);
    }
}
