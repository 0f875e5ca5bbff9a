//! Linking engine
//!
//! Wires the pipeline together. Pages are processed independently in
//! parallel (detect, normalize, link, score); the results are reduced on
//! one thread, then deduplicated, validated and summarized.

use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use panlink_core::{ConfidenceThresholds, LinkingConfig, Relation, Result};

use crate::aggregate::{self, DocumentReport, PageResult};
use crate::dedup::deduplicate;
use crate::detector::detect_identifiers;
use crate::linker::ProximityLinker;
use crate::normalizer::SpanNormalizer;
use crate::scoring::ConfidenceScorer;
use crate::validator::FormatValidator;
use crate::{DocumentInput, Page, SpanSource};

/// Entity-relation linking engine
pub struct LinkingEngine {
    linker: ProximityLinker,
    scorer: ConfidenceScorer,
    thresholds: ConfidenceThresholds,
    sources: Vec<Box<dyn SpanSource>>,
}

impl LinkingEngine {
    /// Create an engine with no span sources.
    ///
    /// Fails if the configuration is out of range.
    pub fn new(config: &LinkingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            linker: ProximityLinker::new(config.window_size),
            scorer: ConfidenceScorer::from_config(config),
            thresholds: config.confidence_thresholds,
            sources: Vec::new(),
        })
    }

    /// Add a span source; spans from every source are pooled per page
    pub fn with_source(mut self, source: impl SpanSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Identifiers of the configured span sources
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    /// Process one page. Never fails: a span source error only removes
    /// that source's counterparts and marks the page degraded.
    pub fn process_page(&self, page_index: usize, page: &Page) -> PageResult {
        let identifiers: Vec<_> = detect_identifiers(&page.text, page_index).collect();
        let text_len = page.text.chars().count();

        let mut counterparts = Vec::new();
        let mut degraded = false;
        for source in &self.sources {
            let normalizer = SpanNormalizer::new(source.source_method());
            match source
                .spans(page)
                .and_then(|spans| normalizer.normalize(&spans, page_index, text_len))
            {
                Ok(entities) => counterparts.extend(entities),
                Err(e) => {
                    warn!(
                        page = page_index,
                        source = source.source_id(),
                        "No counterparts available from span source: {}",
                        e
                    );
                    degraded = true;
                }
            }
        }

        let candidates = self
            .linker
            .link(&identifiers, &counterparts)
            .into_iter()
            .filter_map(|candidate| match self.scorer.score_candidate(candidate) {
                Ok(scored) => Some(scored),
                Err(e) => {
                    warn!(page = page_index, "Dropping unscored candidate: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(
            page = page_index,
            identifiers = identifiers.len(),
            counterparts = counterparts.len(),
            candidates = candidates.len(),
            "Page processed"
        );

        PageResult {
            page_index,
            identifiers,
            counterparts,
            candidates,
            degraded,
        }
    }

    /// Process a whole document into a report
    pub fn process_document(&self, document: &DocumentInput) -> DocumentReport {
        let pages: Vec<PageResult> = document
            .pages
            .par_iter()
            .enumerate()
            .map(|(index, page)| self.process_page(index, page))
            .collect();

        let merged = aggregate::merge_pages(pages);

        let relations = deduplicate(merged.candidates.iter().map(Relation::from));
        let validation = FormatValidator
            .validate_all(merged.identifiers.iter().map(|e| e.text.as_str()));
        let entities =
            aggregate::distinct_entities(merged.identifiers.iter().chain(&merged.counterparts));

        let stats = merged.stats
            + aggregate::document_stats(&entities, &relations, &validation, &self.thresholds);

        let document_id = document.document_id.unwrap_or_else(Uuid::new_v4);
        info!(
            document = %document_id,
            pages = stats.total_pages,
            degraded = stats.degraded_pages,
            relations = relations.len(),
            entities = entities.len(),
            "Document processed"
        );

        DocumentReport {
            document_id,
            source: document.source.clone(),
            generated_at: chrono::Utc::now(),
            entities,
            relations,
            validation,
            stats,
        }
    }
}
