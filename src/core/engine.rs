//! Merge engine that runs loaders against a settings object.

use crate::core::Settings;
use crate::error::Result;
use crate::sources::SourceLoader;

/// Loads and merges settings from multiple sources.
///
/// The engine handles precedence by sorting sources by priority and loading them
/// in order (lower priority first, higher priority sources override). Sources
/// with equal priority run in the order they were added.
#[derive(Default)]
pub struct MergeEngine {
    sources: Vec<Box<dyn SourceLoader>>,
}

impl MergeEngine {
    /// Create an engine with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a settings source.
    pub fn add_source(&mut self, source: Box<dyn SourceLoader>) {
        self.sources.push(source);
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn ordered(&self) -> Vec<&dyn SourceLoader> {
        let mut sorted: Vec<&dyn SourceLoader> =
            self.sources.iter().map(|s| s.as_ref()).collect();
        // sort_by_key is stable, so registration order breaks ties
        sorted.sort_by_key(|s| s.priority());
        sorted
    }

    /// Load every source into `settings`, in priority order.
    ///
    /// An engine without sources leaves `settings` untouched.
    ///
    /// # Errors
    ///
    /// Returns the first source error unchanged; sources after it are not run.
    pub fn load_into(&self, settings: &mut Settings) -> Result<()> {
        for source in self.ordered() {
            let before = settings.history().len();
            source.load(settings, None).inspect_err(|e| {
                tracing::warn!(source = %source.name(), error = %e, "settings source failed");
            })?;
            tracing::debug!(
                source = %source.name(),
                priority = source.priority(),
                applied = settings.history().len() - before,
                "merged settings source"
            );
        }
        Ok(())
    }

    /// Get the list of source names in priority order.
    pub fn source_names(&self) -> Vec<String> {
        self.ordered().iter().map(|s| s.name()).collect()
    }
}
