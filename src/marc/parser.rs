//! MARCXML bib document parser
//!
//! Reads an Alma `bibs` response into bib records carrying their MARC data
//! fields, including the `AVA` availability fields added by `expand=p_avail`.

use crate::{
    error::{AppError, AppResult},
    xml::Element,
};

/// A MARC data field (010-999, or a local tag such as AVA)
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    /// Field tag
    pub tag: String,
    /// First indicator
    pub ind1: char,
    /// Second indicator
    pub ind2: char,
    /// Subfields
    pub subfields: Vec<Subfield>,
}

/// A MARC subfield
#[derive(Debug, Clone, PartialEq)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield data
    pub data: String,
}

/// One `<bib>` entry of a bibs response
#[derive(Debug, Clone, Default)]
pub struct BibRecord {
    pub mms_id: Option<String>,
    pub title: Option<String>,
    /// Link to the holdings list of this bib
    pub holdings_link: Option<String>,
    pub data_fields: Vec<DataField>,
}

/// A parsed bibs response
#[derive(Debug, Clone, Default)]
pub struct BibDocument {
    pub bibs: Vec<BibRecord>,
}

impl BibDocument {
    /// Parse a bibs response body
    pub fn from_xml(content: &[u8]) -> AppResult<Self> {
        let root = Element::parse(content)
            .map_err(|e| AppError::MalformedUpstream(format!("Unable to parse bibs response: {}", e)))?;

        let bibs = root.find_all("bib").into_iter().map(BibRecord::from_element).collect();

        Ok(BibDocument { bibs })
    }
}

impl BibRecord {
    /// Build a bib record from its `<bib>` element
    pub fn from_element(bib: &Element) -> Self {
        let mms_id = bib
            .children
            .iter()
            .find(|child| child.name == "mms_id")
            .map(Element::text);

        let data_fields = bib
            .find_all("datafield")
            .into_iter()
            .filter_map(DataField::from_element)
            .collect();

        BibRecord {
            mms_id,
            title: bib.find("title").map(Element::text),
            holdings_link: bib.find("holdings").and_then(|h| h.attr("link")).map(String::from),
            data_fields,
        }
    }

    /// Get all data fields with a specific tag
    pub fn get_fields(&self, tag: &str) -> Vec<&DataField> {
        self.data_fields.iter().filter(|f| f.tag == tag).collect()
    }
}

impl DataField {
    /// Build a data field from a `<datafield>` element; fields without a tag are ignored
    pub fn from_element(element: &Element) -> Option<Self> {
        let tag = element.attr("tag")?.to_string();
        let indicator = |key: &str| element.attr(key).and_then(|v| v.chars().next()).unwrap_or(' ');

        let subfields = element
            .children
            .iter()
            .filter(|child| child.name == "subfield")
            .filter_map(|child| {
                let code = child.attr("code")?.chars().next()?;
                Some(Subfield {
                    code,
                    data: child.text(),
                })
            })
            .collect();

        Some(DataField {
            tag,
            ind1: indicator("ind1"),
            ind2: indicator("ind2"),
            subfields,
        })
    }

    /// Get a subfield value by code
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.data.as_str())
    }
}
