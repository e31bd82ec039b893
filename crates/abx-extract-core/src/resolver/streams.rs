//! Parameter streams and timestamp correlation.
//!
//! Orders and reason texts are saved as independent records. The only link
//! between them is an identical timestamp, so every lookup here is an exact
//! equality match.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::config::ParameterIds;
use crate::models::{ParameterStream, ParameterTextEntry, TimeWindow};
use crate::source::{MedicationSource, SourceResult};

/// Entries of the seven parameter streams of one encounter, each in source order.
#[derive(Debug, Clone, Default)]
pub struct ParameterStreams {
    entries: HashMap<ParameterStream, Vec<ParameterTextEntry>>,
}

/// A reason entry together with the stream it was found in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReasonMatch<'s> {
    pub stream: ParameterStream,
    pub entry: &'s ParameterTextEntry,
}

impl ParameterStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch all seven streams, one query per stream.
    pub fn fetch(
        source: &dyn MedicationSource,
        ids: &ParameterIds,
        encounter_key: i32,
        window: &TimeWindow,
    ) -> SourceResult<Self> {
        let mut streams = Self::new();
        for stream in ParameterStream::ALL {
            let entries = source.parameter_text_values(ids.id_of(stream), encounter_key, window)?;
            streams.insert(stream, entries);
        }
        Ok(streams)
    }

    /// Replace the entries of one stream.
    pub fn insert(&mut self, stream: ParameterStream, entries: Vec<ParameterTextEntry>) {
        self.entries.insert(stream, entries);
    }

    /// Entries of one stream; empty if it was never fetched.
    pub fn stream(&self, stream: ParameterStream) -> &[ParameterTextEntry] {
        self.entries.get(&stream).map(Vec::as_slice).unwrap_or_default()
    }

    /// First entry of a stream saved exactly at `time`.
    pub fn entry_at(&self, stream: ParameterStream, time: NaiveDateTime) -> Option<&ParameterTextEntry> {
        first_at(self.stream(stream), time)
    }

    /// The reason saved together with an order.
    ///
    /// Each reason stream contributes its first entry at exactly `save_time`.
    /// Of those, the latest wins; on equal times the earlier stream in
    /// [`ParameterStream::REASONS`] order wins.
    pub fn reason_at(&self, save_time: NaiveDateTime) -> Option<ReasonMatch<'_>> {
        let mut best: Option<ReasonMatch<'_>> = None;
        for stream in ParameterStream::REASONS {
            let Some(entry) = self.entry_at(stream, save_time) else {
                continue;
            };
            match best {
                Some(current) if current.entry.time >= entry.time => {}
                _ => best = Some(ReasonMatch { stream, entry }),
            }
        }
        best
    }

    /// Infection grade recorded at `time`, falling back to the infection category grade.
    pub fn grade_at(&self, time: NaiveDateTime) -> Option<&ParameterTextEntry> {
        self.entry_at(ParameterStream::InfectionGrade, time)
            .or_else(|| self.entry_at(ParameterStream::InfectionCategoryGrade, time))
    }

    /// Drain annotation recorded at `time`.
    pub fn drain_at(&self, time: NaiveDateTime) -> Option<&ParameterTextEntry> {
        self.entry_at(ParameterStream::Drain, time)
    }

    /// Total number of entries across all streams.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn first_at(entries: &[ParameterTextEntry], time: NaiveDateTime) -> Option<&ParameterTextEntry> {
    entries.iter().find(|e| e.time == time)
}
