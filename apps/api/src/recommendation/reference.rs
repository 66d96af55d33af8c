//! Reference dataset: the college table used to ground profile-mode prompts.
//!
//! Loaded once at startup from the cleaned rankings CSV (`institution`,
//! `location`, `ar score`, `fsr score`, `score scaled` plus any other columns),
//! or from a `.json` array of records with the same keys. Cells are read
//! leniently: a blank or non-numeric score loads as missing, and the prompt
//! builder drops that row instead of the whole file failing to load.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

/// A raw row from the dataset. Every field is optional here; completeness is
/// enforced by `CollegeRecord::complete`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollegeRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    /// Academic reputation score.
    #[serde(default, rename = "ar score", deserialize_with = "lenient_score")]
    pub ar_score: Option<f64>,
    /// Faculty/student ratio score.
    #[serde(default, rename = "fsr score", deserialize_with = "lenient_score")]
    pub fsr_score: Option<f64>,
    #[serde(default, rename = "score scaled", deserialize_with = "lenient_score")]
    pub overall_score: Option<f64>,
}

/// Any single cell, as CSV or JSON presents it.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Cell>::deserialize(deserializer)? {
        Some(Cell::Number(n)) => Some(n),
        Some(Cell::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(Cell::Other(_)) | None => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Cell>::deserialize(deserializer)? {
        Some(Cell::Text(s)) => Some(s),
        Some(Cell::Number(n)) => Some(n.to_string()),
        Some(Cell::Other(_)) | None => None,
    })
}

/// A row with every prompt field present and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteCollege<'a> {
    pub institution: &'a str,
    pub location: &'a str,
    pub ar_score: f64,
    pub fsr_score: f64,
    pub overall_score: f64,
}

impl CollegeRecord {
    pub fn complete(&self) -> Option<CompleteCollege<'_>> {
        Some(CompleteCollege {
            institution: non_empty(&self.institution)?,
            location: non_empty(&self.location)?,
            ar_score: finite(self.ar_score)?,
            fsr_score: finite(self.fsr_score)?,
            overall_score: finite(self.overall_score)?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|n| n.is_finite())
}

/// Ordered, immutable college table shared by all profile-mode requests.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    records: Vec<CollegeRecord>,
}

impl ReferenceDataset {
    pub fn new(records: Vec<CollegeRecord>) -> Self {
        Self { records }
    }

    /// Loads a `.json` array, or CSV for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference dataset {}", path.display()))?;
        // Spreadsheet exports often carry a UTF-8 byte-order mark.
        let raw = raw.trim_start_matches('\u{feff}');

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let records = if is_json {
            serde_json::from_str::<Vec<CollegeRecord>>(raw).with_context(|| {
                format!(
                    "Reference dataset {} must be a JSON array of college records",
                    path.display()
                )
            })?
        } else {
            parse_csv(raw)
                .with_context(|| format!("Failed to parse reference dataset {}", path.display()))?
        };

        let dataset = Self::new(records);
        info!(
            "Loaded reference dataset from {}: {} records ({} complete)",
            path.display(),
            dataset.len(),
            dataset.complete_records().count()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Complete rows, in dataset order.
    pub fn complete_records(&self) -> impl Iterator<Item = CompleteCollege<'_>> {
        self.records.iter().filter_map(CollegeRecord::complete)
    }
}

/// Reads CSV rows by header name. A row that cannot be decoded at all is skipped
/// with a warning; only an unreadable header fails the load.
fn parse_csv(raw: &str) -> Result<Vec<CollegeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    reader.headers().context("CSV header row is unreadable")?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<CollegeRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            // +2: one for the header row, one for 1-based numbering.
            Err(e) => warn!("Skipping reference dataset row {}: {e}", idx + 2),
        }
    }
    Ok(records)
}
