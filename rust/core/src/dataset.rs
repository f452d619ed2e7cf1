// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input dataset rows
//!
//! A dataset is a JSON array (or JSON lines) of per-floor geometric records.
//! Identifier columns come out of spreadsheet exports, so they may be numbers,
//! strings, `null` or the literal `"nan"`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Apartment identifier with all whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApartmentId(String);

impl ApartmentId {
    /// Normalize a raw identifier. Empty, `nan`, `none` and `null` are unassigned.
    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_lowercase().as_str() {
            "" | "nan" | "none" | "null" => None,
            _ => Some(Self(compact)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw record of the input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorRecord {
    #[serde(deserialize_with = "id_required")]
    pub floor_id: String,
    #[serde(default, deserialize_with = "apartment_optional")]
    pub apartment_id: Option<ApartmentId>,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub entity_subtype: Option<String>,
    #[serde(default)]
    pub roomtype: Option<String>,
    pub geom: String,
}

/// What a record contributes to a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Structure,
    Shaft,
    Room,
    Ignored,
}

impl FloorRecord {
    pub fn kind(&self) -> RecordKind {
        let subtype = self.entity_subtype.as_deref().unwrap_or("");
        if self.entity_type == "separator" {
            if subtype == "WALL" {
                return RecordKind::Structure;
            }
            return RecordKind::Ignored;
        }
        if self.entity_type == "area" && subtype == "SHAFT" {
            return RecordKind::Shaft;
        }
        match self.roomtype.as_deref() {
            Some(label) if !crate::room_type::is_ignored_label(label) => RecordKind::Room,
            _ => RecordKind::Ignored,
        }
    }
}

/// Render an identifier value. Integral floats lose their `.0`.
fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f.fract() == 0.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            } else {
                Some(n.to_string())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn id_required<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| serde::de::Error::custom("floor_id must not be null"))
}

fn apartment_optional<'de, D>(deserializer: D) -> std::result::Result<Option<ApartmentId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_id(&value).and_then(|s| ApartmentId::parse(&s)))
}

/// Parse dataset text: a JSON array, or one JSON object per line.
///
/// Malformed lines in JSON-lines input are skipped with a warning. A
/// malformed array is an error.
pub fn parse_records(text: &str) -> Result<Vec<FloorRecord>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FloorRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping malformed dataset line");
            }
        }
    }
    Ok(records)
}

/// Read a dataset file from disk.
pub fn load_records(path: &Path) -> Result<Vec<FloorRecord>> {
    let text = std::fs::read_to_string(path).map_err(Error::Io)?;
    let records = parse_records(&text)?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded dataset");
    Ok(records)
}
