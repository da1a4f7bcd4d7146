//! Data models for the Alma service

pub mod availability;
pub mod holding;

// Re-export commonly used types
pub use availability::{AggregatedItem, AvailabilityRecord, AvailabilityStatus, DisplayStatus, ItemCount, ItemKey};
pub use holding::{HoldingItem, HoldingItems, HoldingsReport};
