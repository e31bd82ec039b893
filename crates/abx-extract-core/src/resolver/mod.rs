//! Order reason resolver.
//!
//! Pipeline: parameter streams + orders → antimicrobial orders → save time →
//! reason, grade and drain annotation by exact timestamp.

mod streams;

pub use streams::*;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::ParameterIds;
use crate::filter::AntimicrobialCodeSet;
use crate::models::{EnrichedOrder, RawMedicationOrder, TimeWindow};
use crate::source::{MedicationSource, SourceError};

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Save time of order {order_id} unavailable: {source}")]
    SaveTime {
        order_id: i64,
        #[source]
        source: SourceError,
    },
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Resolves antimicrobial orders and their justification for one encounter.
pub struct OrderReasonResolver<'a> {
    codes: &'a AntimicrobialCodeSet,
    source: &'a dyn MedicationSource,
    parameters: ParameterIds,
}

impl<'a> OrderReasonResolver<'a> {
    /// Create a new resolver.
    pub fn new(
        codes: &'a AntimicrobialCodeSet,
        source: &'a dyn MedicationSource,
        parameters: ParameterIds,
    ) -> Self {
        Self {
            codes,
            source,
            parameters,
        }
    }

    /// Fetch and enrich the antimicrobial orders placed within `window`.
    pub fn resolve(&self, encounter_key: i32, window: &TimeWindow) -> ResolverResult<Vec<EnrichedOrder>> {
        let streams = ParameterStreams::fetch(self.source, &self.parameters, encounter_key, window)?;
        let orders = self.source.medication_orders(encounter_key, window)?;

        let enriched = orders
            .iter()
            .filter(|order| !order.atc_code.is_empty() && self.codes.is_antimicrobial(&order.atc_code))
            .map(|order| self.enrich(order, encounter_key, &streams))
            .collect::<ResolverResult<Vec<_>>>()?;

        tracing::debug!(
            encounter_key,
            orders = orders.len(),
            antimicrobial = enriched.len(),
            with_reason = enriched.iter().filter(|o| o.has_reason()).count(),
            parameter_entries = streams.len(),
            "Resolved order reasons"
        );
        Ok(enriched)
    }

    /// Enrich one order using its save time as the correlation anchor.
    pub fn enrich(
        &self,
        order: &RawMedicationOrder,
        encounter_key: i32,
        streams: &ParameterStreams,
    ) -> ResolverResult<EnrichedOrder> {
        let save_time = self
            .source
            .order_save_time(encounter_key, order.order_id)
            .map_err(|source| ResolverError::SaveTime {
                order_id: order.order_id,
                source,
            })?;

        let mut enriched = EnrichedOrder::from_raw(order);
        attach_reason(&mut enriched, streams, save_time);
        Ok(enriched)
    }
}

/// Attach the reason, grade and drain annotation saved at `save_time`.
///
/// Leaves the order untouched when no reason stream has an entry at exactly
/// that time. Grade and drain are looked up at the reason's own timestamp.
pub fn attach_reason(order: &mut EnrichedOrder, streams: &ParameterStreams, save_time: NaiveDateTime) {
    let Some(reason) = streams.reason_at(save_time) else {
        return;
    };
    let reason_time = reason.entry.time;

    let mut text = reason.entry.value.clone();
    if let Some(drain) = streams.drain_at(reason_time) {
        if !drain.value.is_empty() {
            text.push(' ');
            text.push_str(&drain.value);
        }
    }

    order.order_reason = Some(text);
    order.order_reason_type = Some(reason.entry.name.clone());
    order.order_reason_grade = streams.grade_at(reason_time).map(|g| g.value.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParameterStream, ParameterTextEntry, RawAdministrationEvent};
    use crate::source::SourceResult;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(name: &str, value: &str, time: NaiveDateTime) -> ParameterTextEntry {
        ParameterTextEntry {
            parameter_id: 0,
            name: name.into(),
            value: value.into(),
            time,
        }
    }

    fn order(order_id: i64, atc: &str) -> RawMedicationOrder {
        RawMedicationOrder {
            order_id,
            medication_id: 500 + order_id,
            medication_name: "Amoxicillin".into(),
            atc_code: atc.into(),
            amount: Some(750.0),
            unit: Some("mg".into()),
            ordered_by_id: Some(42),
            ordered_by: Some("Dr. Lind".into()),
            ordered_at: at(8, 0),
            location: Some("Ward 12".into()),
            route: Some("PO".into()),
        }
    }

    /// Source with fixed orders whose save times are all `saved_at`.
    struct FixedSource {
        orders: Vec<RawMedicationOrder>,
        saved_at: Option<NaiveDateTime>,
    }

    impl MedicationSource for FixedSource {
        fn administrations(&self, _: &str, _: &TimeWindow, _: i32) -> SourceResult<Vec<RawAdministrationEvent>> {
            Ok(Vec::new())
        }

        fn medication_orders(&self, _: i32, _: &TimeWindow) -> SourceResult<Vec<RawMedicationOrder>> {
            Ok(self.orders.clone())
        }

        fn order_save_time(&self, _: i32, order_id: i64) -> SourceResult<NaiveDateTime> {
            self.saved_at
                .ok_or_else(|| SourceError::NotFound(format!("order {}", order_id)))
        }

        fn parameter_text_values(&self, _: i32, _: i32, _: &TimeWindow) -> SourceResult<Vec<ParameterTextEntry>> {
            Ok(Vec::new())
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(at(0, 0), at(23, 59))
    }

    #[test]
    fn test_attach_reason_with_grade() {
        let mut streams = ParameterStreams::new();
        streams.insert(ParameterStream::CareRequest, vec![entry("Care request", "fever", at(9, 15))]);
        streams.insert(ParameterStream::InfectionGrade, vec![entry("Infection grade", "II", at(9, 15))]);

        let mut enriched = EnrichedOrder::from_raw(&order(1, "J01CA04"));
        attach_reason(&mut enriched, &streams, at(9, 15));

        assert_eq!(enriched.order_reason.as_deref(), Some("fever"));
        assert_eq!(enriched.order_reason_type.as_deref(), Some("Care request"));
        assert_eq!(enriched.order_reason_grade.as_deref(), Some("II"));
    }

    #[test]
    fn test_drain_appended_with_single_space() {
        let mut streams = ParameterStreams::new();
        streams.insert(ParameterStream::Other, vec![entry("Other", "wound infection", at(9, 15))]);
        streams.insert(ParameterStream::Drain, vec![entry("Drain", "pleural drain", at(9, 15))]);

        let mut enriched = EnrichedOrder::from_raw(&order(1, "J01CA04"));
        attach_reason(&mut enriched, &streams, at(9, 15));

        assert_eq!(enriched.order_reason.as_deref(), Some("wound infection pleural drain"));
        assert!(enriched.order_reason_grade.is_none());
    }

    #[test]
    fn test_empty_drain_ignored() {
        let mut streams = ParameterStreams::new();
        streams.insert(ParameterStream::Other, vec![entry("Other", "sepsis", at(9, 15))]);
        streams.insert(ParameterStream::Drain, vec![entry("Drain", "", at(9, 15))]);

        let mut enriched = EnrichedOrder::from_raw(&order(1, "J01CA04"));
        attach_reason(&mut enriched, &streams, at(9, 15));

        assert_eq!(enriched.order_reason.as_deref(), Some("sepsis"));
    }

    #[test]
    fn test_no_reason_skips_grade_and_drain() {
        let mut streams = ParameterStreams::new();
        streams.insert(ParameterStream::InfectionGrade, vec![entry("Infection grade", "III", at(9, 15))]);
        streams.insert(ParameterStream::Drain, vec![entry("Drain", "chest tube", at(9, 15))]);

        let mut enriched = EnrichedOrder::from_raw(&order(1, "J01CA04"));
        attach_reason(&mut enriched, &streams, at(9, 15));

        assert!(enriched.order_reason.is_none());
        assert!(enriched.order_reason_type.is_none());
        assert!(enriched.order_reason_grade.is_none());
    }

    #[test]
    fn test_resolve_filters_non_antimicrobial() {
        let codes = AntimicrobialCodeSet::new(["J01CA04"], ["J02"]);
        let source = FixedSource {
            orders: vec![order(1, "J01CA04"), order(2, "J05AB01"), order(3, ""), order(4, "J02AC01")],
            saved_at: Some(at(9, 0)),
        };
        let resolver = OrderReasonResolver::new(&codes, &source, ParameterIds::with_drain(1));

        let orders = resolver.resolve(7, &window()).unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(orders.iter().all(|o| o.is_antibiotic && !o.has_reason()));
    }

    #[test]
    fn test_missing_save_time_fails() {
        let codes = AntimicrobialCodeSet::new(["J01CA04"], Vec::<String>::new());
        let source = FixedSource {
            orders: vec![order(1, "J01CA04")],
            saved_at: None,
        };
        let resolver = OrderReasonResolver::new(&codes, &source, ParameterIds::with_drain(1));

        let result = resolver.resolve(7, &window());
        assert!(matches!(result, Err(ResolverError::SaveTime { order_id: 1, .. })));
    }
}
