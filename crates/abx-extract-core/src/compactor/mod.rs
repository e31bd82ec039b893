//! Administration compactor.
//!
//! Pipeline: raw events → given, in-window, antimicrobial main components →
//! fold-forward merge into dose episodes.
//!
//! The merge only ever extends the most recent matching episode, so with
//! [`MergeOrder::Source`] the output depends on the order events arrive in.

use crate::config::MergeOrder;
use crate::filter::AntimicrobialCodeSet;
use crate::models::{DoseEpisode, RawAdministrationEvent, SubstanceRole, TimeWindow};

/// Turns raw administration events into dose episodes.
pub struct AdministrationCompactor<'a> {
    codes: &'a AntimicrobialCodeSet,
    merge_order: MergeOrder,
}

impl<'a> AdministrationCompactor<'a> {
    /// Create a new compactor.
    pub fn new(codes: &'a AntimicrobialCodeSet, merge_order: MergeOrder) -> Self {
        Self { codes, merge_order }
    }

    /// Filter and merge the events of one encounter.
    pub fn compact(&self, events: &[RawAdministrationEvent], period: &TimeWindow) -> Vec<DoseEpisode> {
        let mut candidates = self.candidates(events, period);
        let candidate_count = candidates.len();

        if self.merge_order == MergeOrder::Chronological {
            candidates.sort_by_key(|c| c.start);
        }
        let episodes = merge_episodes(candidates);

        tracing::debug!(
            events = events.len(),
            candidates = candidate_count,
            episodes = episodes.len(),
            "Compacted administrations"
        );
        episodes
    }

    /// One single-dose candidate per antimicrobial main component of each given,
    /// in-window event, in source order.
    pub fn candidates(&self, events: &[RawAdministrationEvent], period: &TimeWindow) -> Vec<DoseEpisode> {
        let codes = self.codes;
        events
            .iter()
            .filter(|event| {
                !event.was_not_given
                    && period.contains_interval(event.effective_start, event.effective_end)
            })
            .flat_map(move |event| {
                event
                    .substances
                    .iter()
                    .filter(move |s| {
                        s.role == SubstanceRole::MainComponent
                            && !s.atc_code.is_empty()
                            && codes.is_antimicrobial(&s.atc_code)
                    })
                    .map(move |s| DoseEpisode::from_substance(event, s))
            })
            .collect()
    }
}

/// Fold candidates, in the given order, into dose episodes.
///
/// Each candidate extends the matching episode with the latest end time if that
/// episode ends on the same calendar day as the candidate or the day before;
/// otherwise it starts a new episode.
pub fn merge_episodes<I>(candidates: I) -> Vec<DoseEpisode>
where
    I: IntoIterator<Item = DoseEpisode>,
{
    let mut episodes: Vec<DoseEpisode> = Vec::new();

    for candidate in candidates {
        match most_recent_match(&episodes, &candidate) {
            Some(idx) if episodes[idx].is_adjacent_to(&candidate) => {
                episodes[idx].extend_with(&candidate);
            }
            _ => {
                episodes.push(DoseEpisode {
                    dose_count: 1,
                    is_antibiotic: true,
                    ..candidate
                });
            }
        }
    }

    episodes
}

/// Index of the same-drug episode with the latest end; the earliest such episode on ties.
fn most_recent_match(episodes: &[DoseEpisode], candidate: &DoseEpisode) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, episode) in episodes.iter().enumerate() {
        if !episode.same_drug_and_dose(candidate) {
            continue;
        }
        match best {
            Some(b) if episodes[b].end >= episode.end => {}
            _ => best = Some(idx),
        }
    }
    best
}
