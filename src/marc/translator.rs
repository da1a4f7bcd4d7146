//! AVA field translator
//!
//! Translates the AVA (availability) fields Alma embeds in a bib record into
//! availability records.

use super::parser::{BibRecord, DataField};
use crate::models::availability::{AvailabilityRecord, AvailabilityStatus};

/// Tag of the physical availability field added by `expand=p_avail`
pub const AVA_TAG: &str = "AVA";

/// MARC record translator
#[derive(Debug, Default, Clone, Copy)]
pub struct MarcTranslator;

impl MarcTranslator {
    /// Create a new translator
    pub fn new() -> Self {
        Self
    }

    /// Translate every AVA field of a bib
    pub fn translate(&self, bib: &BibRecord) -> Vec<AvailabilityRecord> {
        let title = bib.title.clone().unwrap_or_default();
        bib.get_fields(AVA_TAG)
            .into_iter()
            .map(|field| self.translate_ava(field, &title))
            .collect()
    }

    /// Translate one AVA field
    pub fn translate_ava(&self, field: &DataField, title: &str) -> AvailabilityRecord {
        // AVA subfield mappings
        // 0 - MMS id
        // e - Availability status
        // f - Total items
        // j - Location code
        // d - Call number
        // b - Physical location (library)
        let record = AvailabilityRecord {
            mms_id: field.get_subfield('0').map(String::from),
            status: AvailabilityStatus::from(field.get_subfield('e')),
            total_items: field.get_subfield('f').map(String::from),
            location_code: field.get_subfield('j').map(String::from),
            call_number: field.get_subfield('d').map(String::from),
            physical_location: field.get_subfield('b').map(String::from),
            title: title.to_string(),
        };

        tracing::debug!(
            "AVA mms_id={:?} availability={:?} total_items={:?} location_code={:?} call_number={:?} physical_location={:?}",
            record.mms_id,
            record.status,
            record.total_items,
            record.location_code,
            record.call_number,
            record.physical_location
        );

        record
    }
}
