//! Holding item models (item-level availability)

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

/// Availability of one physical copy, keyed by barcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HoldingItem {
    pub available: bool,
    /// Items in place
    pub count: i64,
    /// Raw awaiting-reshelving flag
    pub reshelving: Option<String>,
}

/// Items of one holding, keyed by barcode
pub type HoldingItems = IndexMap<String, HoldingItem>;

/// Holdings results: mms_id -> holding_id -> barcode -> item
pub type HoldingsReport = IndexMap<String, IndexMap<String, HoldingItems>>;

/// Fold one holding's items into a report.
/// Items for an existing mms_id/holding_id pair are merged by barcode, later wins.
pub fn merge_holding_items(report: &mut HoldingsReport, mms_id: &str, holding_id: &str, items: HoldingItems) {
    report
        .entry(mms_id.to_string())
        .or_default()
        .entry(holding_id.to_string())
        .or_default()
        .extend(items);
}
