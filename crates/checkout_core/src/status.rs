//! Derivation of per-step status from a checkout snapshot.

use shared::domain::{CheckoutSnapshot, StepStatus, StepType};

/// Pure mapping from a snapshot to the ordered step status list.
pub struct StepStatusCalculator;

impl StepStatusCalculator {
    /// Returns one status per step in canonical order. The default-active
    /// step is flagged only once store config is present.
    pub fn compute(snapshot: &CheckoutSnapshot) -> Vec<StepStatus> {
        let mut statuses: Vec<StepStatus> = StepType::ALL
            .iter()
            .map(|&step_type| StepStatus {
                step_type,
                is_required: is_required(snapshot, step_type),
                is_complete: is_complete(snapshot, step_type),
                is_active: false,
                is_editable: true,
            })
            .collect();

        if snapshot.config.is_some() {
            if let Some(active) = default_active_step(&statuses) {
                mark_active(&mut statuses, Some(active));
            }
        }

        statuses
    }
}

pub fn is_required(snapshot: &CheckoutSnapshot, step: StepType) -> bool {
    if snapshot.cart.is_none() {
        return false;
    }
    match step {
        StepType::Shipping => snapshot.has_physical_items(),
        StepType::Customer | StepType::Billing | StepType::Payment => true,
    }
}

pub fn is_complete(snapshot: &CheckoutSnapshot, step: StepType) -> bool {
    match step {
        StepType::Customer => snapshot
            .customer
            .as_ref()
            .is_some_and(|customer| customer.is_signed_in() || customer.has_continued_as_guest()),
        StepType::Shipping => snapshot
            .consignments
            .as_deref()
            .is_some_and(|consignments| {
                !consignments.is_empty() && consignments.iter().all(|c| c.is_ready())
            }),
        StepType::Billing => snapshot.billing_address.is_some(),
        StepType::Payment => snapshot.order.as_ref().is_some_and(|order| order.is_complete),
    }
}

/// First required and incomplete step in canonical order.
pub fn default_active_step(statuses: &[StepStatus]) -> Option<StepType> {
    statuses
        .iter()
        .find(|status| status.is_required && !status.is_complete)
        .map(|status| status.step_type)
}

/// First required and incomplete step strictly after `from`, ignoring `skip`.
pub fn next_incomplete_after(
    statuses: &[StepStatus],
    from: StepType,
    skip: &[StepType],
) -> Option<StepType> {
    statuses
        .iter()
        .filter(|status| status.step_type > from && !skip.contains(&status.step_type))
        .find(|status| status.is_required && !status.is_complete)
        .map(|status| status.step_type)
}

/// First required step at or after `step`.
pub fn first_required_from(statuses: &[StepStatus], step: StepType) -> Option<StepType> {
    statuses
        .iter()
        .filter(|status| status.step_type >= step)
        .find(|status| status.is_required)
        .map(|status| status.step_type)
}

pub fn find(statuses: &[StepStatus], step: StepType) -> Option<&StepStatus> {
    statuses.iter().find(|status| status.step_type == step)
}

pub(crate) fn mark_active(statuses: &mut [StepStatus], active: Option<StepType>) {
    for status in statuses.iter_mut() {
        status.is_active = Some(status.step_type) == active && status.is_required;
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
