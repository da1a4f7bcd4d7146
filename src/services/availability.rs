//! Availability engine
//!
//! Turns an Alma bibs response into one summary per logical item
//! (`mms_id--location[--course]`). Aggregation is a pure pass over the
//! parsed document; due dates for unavailable items are resolved afterwards
//! through the holdings service.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

use super::{gateway::AlmaGateway, holdings::HoldingsService, validation};
use crate::{
    error::{AppError, AppResult},
    marc::{BibDocument, BibRecord, MarcTranslator},
    models::availability::{AggregatedItem, AvailabilityRecord, DisplayStatus, ItemKey},
};

/// Engine output keyed by item key
pub type AvailabilityReport = IndexMap<String, AggregatedItem>;

/// Options of a bib availability query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibOptions {
    /// Only keep records shelved in this location code
    pub limit_collection: Option<String>,
    /// Split items per course code
    pub include_course: bool,
    /// Resolve due dates of unavailable items
    pub check_holdings: bool,
}

/// Items built from one bibs response, before due-date resolution
#[derive(Debug, Default)]
pub struct Aggregation {
    pub items: IndexMap<ItemKey, AggregatedItem>,
    /// Unavailable items awaiting a due date, with their bib's holdings link
    pub due_date_lookups: Vec<(ItemKey, String)>,
}

impl Aggregation {
    fn add(&mut self, bib: &BibRecord, record: AvailabilityRecord, options: &BibOptions) {
        if !record.in_collection(options.limit_collection.as_deref()) {
            tracing::debug!(
                "Skipping {:?} at {:?}: not in collection {:?}",
                record.mms_id,
                record.location_code,
                options.limit_collection
            );
            return;
        }

        let Some(mms_id) = record.mms_id.clone() else {
            tracing::warn!("AVA without mms_id in bib {:?} dropped", bib.mms_id);
            return;
        };
        let (Some(physical_location), Some(location)) =
            (record.physical_location.clone(), record.location_segment())
        else {
            tracing::warn!("AVA without physical location for {} dropped", mms_id);
            return;
        };

        let course = if options.include_course {
            record.course_code()
        } else {
            None
        };
        let key = ItemKey::new(&mms_id, &location, course);

        if let Some(existing) = self.items.get_mut(&key) {
            if existing.merge_count(&record) {
                tracing::debug!("Merged count into {}: {:?}", key, existing.count);
                return;
            }
        }

        let item = AggregatedItem::from_record(&record, &mms_id, &physical_location, course);
        match item.status {
            DisplayStatus::Available => {
                tracing::debug!("{:?} available textbooks for {}", record.total_items, key);
            }
            DisplayStatus::Unavailable => {
                tracing::debug!("No available textbooks for {}", key);
                if options.check_holdings {
                    match &bib.holdings_link {
                        Some(link) => self.due_date_lookups.push((key.clone(), link.clone())),
                        None => tracing::warn!("No holdings link for {}, due date not resolved", key),
                    }
                }
            }
            DisplayStatus::CheckHolding => {
                tracing::debug!("Availability status of {:?} for {}", record.status, key);
            }
        }

        self.items.insert(key, item);
    }

    /// Attach a due date, if the item is still unavailable
    pub fn attach_due_date(&mut self, key: &ItemKey, due_date: DateTime<Utc>) {
        if let Some(item) = self.items.get_mut(key) {
            if item.status == DisplayStatus::Unavailable {
                item.due_date = Some(due_date);
            }
        }
    }

    pub fn into_report(self) -> AvailabilityReport {
        self.items
            .into_iter()
            .map(|(key, item)| (String::from(key), item))
            .collect()
    }
}

/// Aggregate the AVA fields of every bib in a document
pub fn aggregate(document: &BibDocument, options: &BibOptions) -> AppResult<Aggregation> {
    if document.bibs.is_empty() {
        return Err(AppError::MalformedUpstream("No bib entries found in response".to_string()));
    }

    let translator = MarcTranslator::new();
    let mut aggregation = Aggregation::default();

    for bib in &document.bibs {
        if bib.title.is_none() {
            tracing::warn!("No title found for bib {:?}, skipping", bib.mms_id);
            continue;
        }

        let records = translator.translate(bib);
        if records.is_empty() {
            tracing::warn!("No AVA found for bib {:?}, skipping", bib.mms_id);
            continue;
        }

        for record in records {
            aggregation.add(bib, record, options);
        }
    }

    Ok(aggregation)
}

#[derive(Clone)]
pub struct AvailabilityService {
    gateway: AlmaGateway,
    holdings: HoldingsService,
    concurrent_due_dates: bool,
}

impl AvailabilityService {
    pub fn new(gateway: AlmaGateway, holdings: HoldingsService, concurrent_due_dates: bool) -> Self {
        Self {
            gateway,
            holdings,
            concurrent_due_dates,
        }
    }

    /// Availability of a list of bibs
    pub async fn process_bibs(&self, input: Value, options: &BibOptions) -> AppResult<AvailabilityReport> {
        let mms_ids = validation::identifiers_from(input)?;
        tracing::debug!("{} unique mms_ids requested", mms_ids.len());

        let content = self.gateway.retrieve_bibs(&mms_ids).await?;
        let report = self.parse_bibliographic(&content, options).await?;

        report_missing(&mms_ids, &report);
        Ok(report)
    }

    /// Parse a bibs response and resolve due dates where requested
    pub async fn parse_bibliographic(&self, content: &[u8], options: &BibOptions) -> AppResult<AvailabilityReport> {
        let document = BibDocument::from_xml(content)?;
        let mut aggregation = aggregate(&document, options)?;
        self.resolve_due_dates(&mut aggregation).await?;
        Ok(aggregation.into_report())
    }

    async fn resolve_due_dates(&self, aggregation: &mut Aggregation) -> AppResult<()> {
        let lookups = std::mem::take(&mut aggregation.due_date_lookups);
        if lookups.is_empty() {
            return Ok(());
        }

        let due_dates = if self.concurrent_due_dates {
            try_join_all(
                lookups
                    .iter()
                    .map(|(_, link)| self.holdings.resolve_latest_due_date(link)),
            )
            .await?
        } else {
            let mut due_dates = Vec::with_capacity(lookups.len());
            for (_, link) in &lookups {
                due_dates.push(self.holdings.resolve_latest_due_date(link).await?);
            }
            due_dates
        };

        for ((key, _), due_date) in lookups.iter().zip(due_dates) {
            match due_date {
                Some(due_date) => aggregation.attach_due_date(key, due_date),
                None => tracing::debug!("No due date found for {}", key),
            }
        }
        Ok(())
    }
}

fn report_missing(requested: &BTreeSet<String>, report: &AvailabilityReport) {
    let found: BTreeSet<&str> = report.values().map(|item| item.mms_id.as_str()).collect();
    for mms_id in requested {
        if !found.contains(mms_id.as_str()) {
            tracing::warn!("No availability returned for {}", mms_id);
        }
    }
}
