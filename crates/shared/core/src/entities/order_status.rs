use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Built locally, not yet handed to a provider
    Created,
    /// Handed to the provider, no acknowledgement yet
    SendingToProvider,
    /// Provider holds the order but has not released it to the venue
    PreSubmission,
    /// Working at the venue
    Submitted,
    /// Partially filled, more fills expected
    Filling,
    /// Completely filled
    Filled,
    /// Cancel requested, not yet confirmed
    CancelSubmitted,
    /// Cancel confirmed by the provider
    Cancelled,
    /// Fill arrived while a cancel was in flight
    FillingDuringCancel,
    /// Cancelled after some quantity had filled
    CancelledWithPartialFill,
    /// More quantity reported than was ordered
    OverFilled,
    /// Refused by the provider
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::CancelledWithPartialFill
                | OrderStatus::Rejected
                | OrderStatus::OverFilled
        )
    }

    /// Returns true if the order can still receive fills in the normal course
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::SendingToProvider
                | OrderStatus::PreSubmission
                | OrderStatus::Submitted
                | OrderStatus::Filling
        )
    }

    /// Returns true if a cancel has been requested or confirmed
    pub fn is_cancelling(&self) -> bool {
        matches!(
            self,
            OrderStatus::CancelSubmitted
                | OrderStatus::Cancelled
                | OrderStatus::FillingDuringCancel
                | OrderStatus::CancelledWithPartialFill
        )
    }
}
