//! Holdings service: item-level availability and due-date resolution

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::{gateway::AlmaGateway, validation};
use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::holding::{merge_holding_items, HoldingItem, HoldingItems, HoldingsReport},
    xml::Element,
};

#[derive(Clone)]
pub struct HoldingsService {
    gateway: AlmaGateway,
    catalog: CatalogConfig,
}

impl HoldingsService {
    pub fn new(gateway: AlmaGateway, catalog: CatalogConfig) -> Self {
        Self { gateway, catalog }
    }

    /// Report the reserve copies of each requested `mms_id -> holding_id` pair
    pub async fn process_holdings(&self, input: Value) -> AppResult<HoldingsReport> {
        let holdings = validation::holdings_from(input)?;

        let mut report = HoldingsReport::new();
        for (mms_id, holding_id) in &holdings {
            let content = self.gateway.retrieve_holding_items(mms_id, holding_id).await?;
            let items = parse_holdings_items(&content, &self.catalog, true)?;
            tracing::debug!("{} reserve items in holding {} of {}", items.len(), holding_id, mms_id);
            merge_holding_items(&mut report, mms_id, holding_id, items);
        }

        Ok(report)
    }

    /// Latest due date among the items of a bib's first holding.
    ///
    /// `holdings_url` is the holdings link of a bib. `None` when the bib has
    /// no holding or no item carries a usable due date.
    pub async fn resolve_latest_due_date(&self, holdings_url: &str) -> AppResult<Option<DateTime<Utc>>> {
        let content = self.gateway.retrieve_additional(holdings_url).await?;
        let Some(link) = first_holding_link(&content)? else {
            tracing::warn!("No holding found at '{}'", holdings_url);
            return Ok(None);
        };

        let items = self.gateway.retrieve_additional(&format!("{}/items", link)).await?;
        latest_due_date(&items)
    }
}

fn parse_document(content: &[u8], what: &str) -> AppResult<Element> {
    Element::parse(content)
        .map_err(|e| AppError::MalformedUpstream(format!("Unable to parse {} response: {}", what, e)))
}

/// Parse a holding items response into per-barcode availability
pub fn parse_holdings_items(
    content: &[u8],
    catalog: &CatalogConfig,
    filter_reserve_only: bool,
) -> AppResult<HoldingItems> {
    let root = parse_document(content, "holding items")?;
    let items = root.find_all("item");
    if items.is_empty() {
        return Err(AppError::MalformedUpstream("No holdings data found in request".to_string()));
    }

    let mut result = HoldingItems::new();
    for item in items {
        if filter_reserve_only && !is_reserve_copy(item, catalog) {
            continue;
        }

        let Some(item_data) = item.find("item_data") else {
            tracing::warn!("Item without item_data skipped");
            continue;
        };
        let Some(barcode) = item_data.find("barcode").map(Element::text) else {
            tracing::warn!("Item without barcode skipped");
            continue;
        };

        let count = item_data
            .find_with_attr("base_status", "desc", &catalog.in_place_desc)
            .and_then(|status| status.text().trim().parse::<i64>().ok())
            .unwrap_or(0);
        let reshelving = item_data.find("awaiting_reshelving").map(Element::text);

        result.insert(
            barcode,
            HoldingItem {
                available: count > 0,
                count,
                reshelving,
            },
        );
    }

    Ok(result)
}

/// A copy is on reserve when its temporary location, or failing that its
/// permanent location, is the reserve collection.
fn is_reserve_copy(item: &Element, catalog: &CatalogConfig) -> bool {
    let desc = catalog.reserve_location_desc.as_str();

    let mut tags = item
        .find("holding_data")
        .map(|h| h.find_all_with_attr("temp_location", "desc", desc))
        .unwrap_or_default();
    if tags.is_empty() {
        tags = item
            .find("item_data")
            .map(|d| d.find_all_with_attr("location", "desc", desc))
            .unwrap_or_default();
    }

    tags.iter().any(|tag| tag.text() == catalog.reserve_location_code)
}

/// Link of the first holding in a holdings response
pub fn first_holding_link(content: &[u8]) -> AppResult<Option<String>> {
    let root = parse_document(content, "holdings")?;
    Ok(root
        .find("holding")
        .and_then(|h| h.attr("link"))
        .map(String::from))
}

/// Latest due date across all items of a holding items response
pub fn latest_due_date(content: &[u8]) -> AppResult<Option<DateTime<Utc>>> {
    let root = parse_document(content, "holding items")?;

    let latest = root
        .find_all("due_date")
        .into_iter()
        .filter_map(|element| {
            let value = element.text();
            let parsed = parse_due_date(&value);
            if parsed.is_none() {
                tracing::warn!("Unparseable due date '{}' ignored", value);
            }
            parsed
        })
        .max();

    Ok(latest)
}

/// Parse an ISO-8601 due date. Dates without an offset are taken as UTC.
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
