//! Availability models: AVA records, item keys and aggregated items

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Raw availability status reported in AVA subfield `e`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    Other(String),
}

impl From<Option<&str>> for AvailabilityStatus {
    fn from(v: Option<&str>) -> Self {
        match v {
            Some("available") => AvailabilityStatus::Available,
            Some("unavailable") => AvailabilityStatus::Unavailable,
            Some(other) => AvailabilityStatus::Other(other.to_string()),
            None => AvailabilityStatus::Other(String::new()),
        }
    }
}

/// One AVA field-group of a bib
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityRecord {
    pub mms_id: Option<String>,
    pub status: AvailabilityStatus,
    pub total_items: Option<String>,
    pub location_code: Option<String>,
    pub call_number: Option<String>,
    pub physical_location: Option<String>,
    pub title: String,
}

impl AvailabilityRecord {
    /// Total item count, when it parses as an integer
    pub fn total_count(&self) -> Option<i64> {
        self.total_items.as_deref().and_then(|v| v.trim().parse().ok())
    }

    /// Course code encoded before the first `/` of the call number
    pub fn course_code(&self) -> Option<&str> {
        let call_number = self.call_number.as_deref()?;
        let course = call_number.split('/').next()?;
        (!course.is_empty()).then_some(course)
    }

    /// Physical location with spaces replaced, as used in item keys
    pub fn location_segment(&self) -> Option<String> {
        self.physical_location.as_ref().map(|l| l.replace(' ', "_"))
    }

    /// Whether the collection filter lets this record through
    pub fn in_collection(&self, limit_collection: Option<&str>) -> bool {
        match limit_collection {
            Some(collection) => self.location_code.as_deref() == Some(collection),
            None => true,
        }
    }
}

/// Key of a logical item: `mms_id--location[--course]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(mms_id: &str, location: &str, course: Option<&str>) -> Self {
        match course {
            Some(course) => ItemKey(format!("{}--{}--{}", mms_id, location, course)),
            None => ItemKey(format!("{}--{}", mms_id, location)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

/// Copy count of an aggregated item.
///
/// A single available record reports its count verbatim; merged and
/// unavailable items carry a tallied integer. An available record without a
/// total serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ItemCount {
    Reported(String),
    Tallied(i64),
    Unreported,
}

impl ItemCount {
    /// Numeric value, if the count is numeric
    pub fn as_number(&self) -> Option<i64> {
        match self {
            ItemCount::Reported(v) => v.trim().parse().ok(),
            ItemCount::Tallied(n) => Some(*n),
            ItemCount::Unreported => None,
        }
    }
}

/// Display status of an aggregated item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DisplayStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "unavailable")]
    Unavailable,
    #[serde(rename = "Check Holding")]
    CheckHolding,
}

/// Availability summary for one logical item
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AggregatedItem {
    pub location: String,
    /// Copy count; a string when reported verbatim, an integer once tallied.
    /// Absent only for "Check Holding" items.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub count: Option<ItemCount>,
    pub status: DisplayStatus,
    pub call_number: Option<String>,
    pub title: String,
    pub mms_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// Latest due date among checked-out copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl AggregatedItem {
    /// Create the item a record describes when its key is new
    pub fn from_record(record: &AvailabilityRecord, mms_id: &str, location: &str, course: Option<&str>) -> Self {
        let (status, count) = match &record.status {
            AvailabilityStatus::Available => (
                DisplayStatus::Available,
                Some(
                    record
                        .total_items
                        .clone()
                        .map_or(ItemCount::Unreported, ItemCount::Reported),
                ),
            ),
            AvailabilityStatus::Unavailable => (DisplayStatus::Unavailable, Some(ItemCount::Tallied(0))),
            AvailabilityStatus::Other(_) => (DisplayStatus::CheckHolding, None),
        };

        AggregatedItem {
            location: location.to_string(),
            count,
            status,
            call_number: record.call_number.clone(),
            title: record.title.clone(),
            mms_id: mms_id.to_string(),
            course: course.map(String::from),
            due_date: None,
        }
    }

    /// Fold another record's count into this item.
    /// Returns false when the counts cannot be summed.
    pub fn merge_count(&mut self, record: &AvailabilityRecord) -> bool {
        let existing = self.count.as_ref().and_then(ItemCount::as_number);
        match (existing, record.total_count()) {
            (Some(old), Some(new)) if new > 0 => {
                self.count = Some(ItemCount::Tallied(old + new));
                true
            }
            _ => false,
        }
    }
}
