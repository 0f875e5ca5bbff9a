//! Proximity linking
//!
//! Pairs each identifier occurrence with the nearest person or
//! organization span inside a fixed character window. One candidate per
//! identifier occurrence; many identifiers may share a counterpart.

use panlink_core::{CandidateRelation, EntityType, RawEntity, CONTEXT_PROXIMITY};

/// Windowed nearest-counterpart linker
#[derive(Debug, Clone, Copy)]
pub struct ProximityLinker {
    window_size: usize,
}

impl ProximityLinker {
    /// Create a linker with a window of `window_size` characters,
    /// split evenly on both sides of an identifier
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Half-open character range searched around `identifier`
    pub fn window(&self, identifier: &RawEntity) -> (usize, usize) {
        let half = self.window_size / 2;
        (
            identifier.start.saturating_sub(half),
            identifier.end.saturating_add(half),
        )
    }

    /// Counterparts on the identifier's page whose range intersects its window
    pub fn candidates<'a>(
        &self,
        identifier: &RawEntity,
        counterparts: &'a [RawEntity],
    ) -> impl Iterator<Item = &'a RawEntity> {
        let (window_start, window_end) = self.window(identifier);
        let page_index = identifier.page_index;

        counterparts.iter().filter(move |c| {
            c.page_index == page_index
                && matches!(c.entity_type, EntityType::Person | EntityType::Organization)
                && c.start < window_end
                && c.end > window_start
        })
    }

    /// Link one identifier occurrence, or `None` if nothing is in range.
    ///
    /// Ranking: distance, then person before organization, then earlier
    /// start, then shorter span.
    pub fn link_one(
        &self,
        identifier: &RawEntity,
        counterparts: &[RawEntity],
    ) -> Option<CandidateRelation> {
        let nearest = self.candidates(identifier, counterparts).min_by_key(|c| {
            (
                identifier.distance_to(c),
                c.entity_type.counterpart_rank(),
                c.start,
                c.span_len(),
            )
        })?;

        Some(CandidateRelation::new(
            identifier.clone(),
            nearest.clone(),
            identifier.distance_to(nearest),
            CONTEXT_PROXIMITY,
        ))
    }

    /// Link every identifier occurrence of a page
    pub fn link(
        &self,
        identifiers: &[RawEntity],
        counterparts: &[RawEntity],
    ) -> Vec<CandidateRelation> {
        identifiers
            .iter()
            .filter_map(|identifier| self.link_one(identifier, counterparts))
            .collect()
    }
}
