//! MARCXML bib parsing and AVA translation
//!
//! This module reads Alma bib responses and translates their AVA fields
//! into availability records.

pub mod parser;
pub mod translator;

pub use parser::{BibDocument, BibRecord, DataField, Subfield};
pub use translator::MarcTranslator;
