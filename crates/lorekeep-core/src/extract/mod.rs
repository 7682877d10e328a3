//! Narrative information extraction.
//!
//! Each extractor sends scene/transcript text plus a task-specific prompt to
//! the LLM and parses the structured response into typed records through the
//! strict JSON boundary in [`json`]. Custom extractors implement
//! [`Extractor`] and register with [`ExtractorRegistry`]; the processor runs
//! them per scene after the built-ins.

pub mod character;
pub mod event;
pub mod json;
pub mod prompts;
pub mod relationship;
pub mod segmenter;

pub use character::CharacterExtractor;
pub use event::PlotEventExtractor;
pub use relationship::RelationshipExtractor;
pub use segmenter::SceneSegmenter;

use std::future::Future;
use std::pin::Pin;

use lorekeep_types::character::Character;
use lorekeep_types::error::ExtractError;
use lorekeep_types::event::PlotEvent;
use lorekeep_types::relationship::Relationship;
use lorekeep_types::scene::Scene;

/// Context handed to every extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub episode_id: String,
    pub scene_id: Option<String>,
    /// Characters detected in the current scene.
    pub characters_present: Vec<String>,
    /// Character names already known from earlier scenes/episodes.
    pub known_characters: Vec<String>,
}

impl ExtractionContext {
    pub fn for_episode(episode_id: impl Into<String>) -> Self {
        Self { episode_id: episode_id.into(), ..Default::default() }
    }

    pub fn for_scene(episode_id: impl Into<String>, scene_id: impl Into<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            scene_id: Some(scene_id.into()),
            ..Default::default()
        }
    }
}

/// A typed record produced by an extractor.
#[derive(Debug, Clone)]
pub enum Record {
    Scene(Scene),
    Character(Character),
    Relationship(Relationship),
    Event(PlotEvent),
}

/// Capability contract for extractors: one operation, text plus context in,
/// zero or more typed records out.
///
/// Uses RPITIT; `BoxExtractor` provides the object-safe form used by the
/// registry.
pub trait Extractor: Send + Sync {
    /// Stable name used for registration and logging.
    fn name(&self) -> &str;

    fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> impl Future<Output = Result<Vec<Record>, ExtractError>> + Send;
}

/// Object-safe version of [`Extractor`] with boxed futures.
pub trait ExtractorDyn: Send + Sync {
    fn extract_boxed<'a>(
        &'a self,
        content: &'a str,
        context: &'a ExtractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Record>, ExtractError>> + Send + 'a>>;

    fn name_dyn(&self) -> &str;
}

impl<T: Extractor> ExtractorDyn for T {
    fn extract_boxed<'a>(
        &'a self,
        content: &'a str,
        context: &'a ExtractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Record>, ExtractError>> + Send + 'a>> {
        Box::pin(self.extract(content, context))
    }

    fn name_dyn(&self) -> &str {
        self.name()
    }
}

/// Type-erased extractor.
pub struct BoxExtractor {
    inner: Box<dyn ExtractorDyn + Send + Sync>,
}

impl BoxExtractor {
    pub fn new<T: Extractor + 'static>(extractor: T) -> Self {
        Self { inner: Box::new(extractor) }
    }

    pub fn name(&self) -> &str {
        self.inner.name_dyn()
    }

    pub async fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> Result<Vec<Record>, ExtractError> {
        self.inner.extract_boxed(content, context).await
    }
}

/// Registry of additional extractors, selected by explicit registration.
///
/// Registering under an existing name replaces the previous extractor.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<BoxExtractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: BoxExtractor) {
        let name = extractor.name().to_string();
        self.extractors.retain(|e| e.name() != name);
        tracing::info!(extractor = %name, "registered custom extractor");
        self.extractors.push(extractor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxExtractor> {
        self.extractors.iter()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopExtractor(&'static str);

    impl Extractor for NoopExtractor {
        fn name(&self) -> &str {
            self.0
        }

        async fn extract(
            &self,
            _content: &str,
            _context: &ExtractionContext,
        ) -> Result<Vec<Record>, ExtractError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ExtractorRegistry::new();
        registry.register(BoxExtractor::new(NoopExtractor("locations")));
        registry.register(BoxExtractor::new(NoopExtractor("locations")));
        registry.register(BoxExtractor::new(NoopExtractor("props")));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_box_extractor_delegates() {
        let boxed = BoxExtractor::new(NoopExtractor("noop"));
        assert_eq!(boxed.name(), "noop");
        let records = boxed
            .extract("text", &ExtractionContext::for_episode("S01E01"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
