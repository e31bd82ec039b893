//! Encounter assembler.
//!
//! Runs the order pipeline, then the administration pipeline, and stores both
//! results on the encounter. The two pipelines fail differently: an
//! administration failure is always returned to the caller, an order failure
//! is handled according to [`OrderFailurePolicy`].

use std::sync::Arc;

use crate::compactor::AdministrationCompactor;
use crate::config::{ExtractConfig, OrderFailurePolicy};
use crate::filter::AntimicrobialCodeSet;
use crate::models::{AntimicrobialSummary, EnrichedOrder, Encounter};
use crate::resolver::OrderReasonResolver;
use crate::source::{CodeRepository, MedicationSource};
use crate::{ExtractError, ExtractResult};

/// Result of resolving the orders of one encounter.
#[derive(Debug)]
pub enum OrderOutcome {
    /// At least one antimicrobial order was found
    Resolved(Vec<EnrichedOrder>),
    /// The encounter has no antimicrobial orders in the window
    Empty,
    /// Resolution failed; no partial result is kept
    Failed(ExtractError),
}

impl OrderOutcome {
    fn from_result(result: ExtractResult<Vec<EnrichedOrder>>) -> Self {
        match result {
            Ok(orders) if orders.is_empty() => OrderOutcome::Empty,
            Ok(orders) => OrderOutcome::Resolved(orders),
            Err(e) => OrderOutcome::Failed(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OrderOutcome::Failed(_))
    }
}

/// What `fill_orders` stored on the encounter.
#[derive(Debug)]
pub enum OrderFill {
    Resolved { orders: usize, with_reason: usize },
    Empty,
    /// Failure logged and absorbed; the encounter has no order list
    Absorbed(ExtractError),
}

/// Outcome of a full `fill_medications` run.
#[derive(Debug)]
pub struct FillReport {
    pub orders: OrderFill,
    pub summary: AntimicrobialSummary,
}

/// Fills the antimicrobial administrations and orders of encounters.
pub struct MedicationFiller<'a> {
    source: &'a dyn MedicationSource,
    codes: Arc<AntimicrobialCodeSet>,
    config: ExtractConfig,
}

impl<'a> MedicationFiller<'a> {
    /// Create a filler around an already loaded code set.
    pub fn new(
        source: &'a dyn MedicationSource,
        codes: Arc<AntimicrobialCodeSet>,
        config: ExtractConfig,
    ) -> Self {
        Self {
            source,
            codes,
            config,
        }
    }

    /// Create a filler, loading the code set from a repository once.
    pub fn from_repository(
        source: &'a dyn MedicationSource,
        repository: &dyn CodeRepository,
        config: ExtractConfig,
    ) -> ExtractResult<Self> {
        let codes = AntimicrobialCodeSet::load(repository)?;
        Ok(Self::new(source, Arc::new(codes), config))
    }

    pub fn codes(&self) -> &Arc<AntimicrobialCodeSet> {
        &self.codes
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Fill orders, then administrations.
    pub fn fill_medications(&self, encounter: &mut Encounter) -> ExtractResult<FillReport> {
        let orders = self.fill_orders(encounter)?;
        self.fill_administrations(encounter)?;

        let summary = encounter.antimicrobial_summary();
        tracing::info!(
            encounter = %encounter.source_encounter_id,
            episodes = summary.episodes,
            doses = summary.doses,
            orders = summary.orders,
            orders_with_reason = summary.orders_with_reason,
            "Filled antimicrobial medications"
        );
        Ok(FillReport { orders, summary })
    }

    /// Replace the encounter's administration timeline. Every failure is returned.
    pub fn fill_administrations(&self, encounter: &mut Encounter) -> ExtractResult<usize> {
        let encounter_key = encounter.encounter_key()?;
        let period = encounter.period();

        let events = self
            .source
            .administrations(&encounter.patient_id, &period, encounter_key)?;

        let compactor = AdministrationCompactor::new(&self.codes, self.config.merge_order);
        encounter.medication_administrations = compactor.compact(&events, &period);
        Ok(encounter.medication_administrations.len())
    }

    /// Resolve the encounter's antimicrobial orders without touching it.
    pub fn resolve_orders(&self, encounter: &Encounter) -> OrderOutcome {
        OrderOutcome::from_result(self.try_resolve_orders(encounter))
    }

    /// Replace the encounter's order list, applying the configured failure policy.
    pub fn fill_orders(&self, encounter: &mut Encounter) -> ExtractResult<OrderFill> {
        match self.resolve_orders(encounter) {
            OrderOutcome::Resolved(orders) => {
                let fill = OrderFill::Resolved {
                    orders: orders.len(),
                    with_reason: orders.iter().filter(|o| o.has_reason()).count(),
                };
                encounter.medication_orders = Some(orders);
                Ok(fill)
            }
            OrderOutcome::Empty => {
                encounter.medication_orders = Some(Vec::new());
                Ok(OrderFill::Empty)
            }
            OrderOutcome::Failed(e) => match self.config.order_failure_policy {
                OrderFailurePolicy::Absorb => {
                    tracing::warn!(
                        encounter = %encounter.source_encounter_id,
                        error = %e,
                        "Order reason resolution failed; encounter left without orders"
                    );
                    encounter.medication_orders = None;
                    Ok(OrderFill::Absorbed(e))
                }
                OrderFailurePolicy::Propagate => Err(e),
            },
        }
    }

    fn try_resolve_orders(&self, encounter: &Encounter) -> ExtractResult<Vec<EnrichedOrder>> {
        let encounter_key = encounter.encounter_key()?;
        let window = self.config.order_window.unwrap_or_else(|| encounter.period());

        let resolver = OrderReasonResolver::new(&self.codes, self.source, self.config.parameters);
        Ok(resolver.resolve(encounter_key, &window)?)
    }
}
