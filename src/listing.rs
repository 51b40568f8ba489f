//! Rental listing record model
//!
//! Defines the canonical record shape shared by scrapers, the reconciliation
//! engine, and the listing store: the `Listing` struct, the fixed set of
//! protectable fields, and the `Decision` workflow state.

use crate::error::HearthError;
use chrono::{SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow decision for a listing, ordered by display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Pending Review")]
    PendingReview,
    #[serde(rename = "Interested")]
    Interested,
    #[serde(rename = "Shortlisted")]
    Shortlisted,
    #[serde(rename = "Appointment Scheduled")]
    AppointmentScheduled,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl Decision {
    pub const ALL: [Decision; 5] = [
        Decision::PendingReview,
        Decision::Interested,
        Decision::Shortlisted,
        Decision::AppointmentScheduled,
        Decision::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::PendingReview => "Pending Review",
            Decision::Interested => "Interested",
            Decision::Shortlisted => "Shortlisted",
            Decision::AppointmentScheduled => "Appointment Scheduled",
            Decision::Rejected => "Rejected",
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::PendingReview
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Decision::ALL
            .iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(normalized))
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = Decision::ALL.iter().map(|d| d.as_str()).collect();
                HearthError::InvalidDecision(format!(
                    "'{}' (valid: {})",
                    normalized,
                    valid.join(", ")
                ))
            })
    }
}

/// Protectable fields of a listing record.
///
/// The reconciliation engine merges candidate and stored records field by
/// field over exactly this set; the ledger keys fingerprints by these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Url,
    Address,
    Price,
    Beds,
    Baths,
    Sqft,
    HouseType,
    Description,
    Amenities,
    AvailableDate,
    Parking,
    Utilities,
    ContactInfo,
    AppointmentUrl,
    ScrapedAt,
    Notes,
    Decision,
}

impl Field {
    /// Canonical field order, matching the stored column layout.
    pub const ALL: [Field; 17] = [
        Field::Url,
        Field::Address,
        Field::Price,
        Field::Beds,
        Field::Baths,
        Field::Sqft,
        Field::HouseType,
        Field::Description,
        Field::Amenities,
        Field::AvailableDate,
        Field::Parking,
        Field::Utilities,
        Field::ContactInfo,
        Field::AppointmentUrl,
        Field::ScrapedAt,
        Field::Notes,
        Field::Decision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Address => "address",
            Field::Price => "price",
            Field::Beds => "beds",
            Field::Baths => "baths",
            Field::Sqft => "sqft",
            Field::HouseType => "house_type",
            Field::Description => "description",
            Field::Amenities => "amenities",
            Field::AvailableDate => "available_date",
            Field::Parking => "parking",
            Field::Utilities => "utilities",
            Field::ContactInfo => "contact_info",
            Field::AppointmentUrl => "appointment_url",
            Field::ScrapedAt => "scraped_at",
            Field::Notes => "notes",
            Field::Decision => "decision",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Field::ALL
            .iter()
            .find(|f| f.as_str() == normalized)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
                HearthError::UnknownField(format!("'{}' (valid: {})", normalized, valid.join(", ")))
            })
    }
}

/// Parse a comma-separated field list, rejecting unknown names.
pub fn parse_field_list(input: &str) -> Result<Vec<Field>, HearthError> {
    let mut fields = Vec::new();
    for name in input.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let field = Field::from_str(name)?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    if fields.is_empty() {
        return Err(HearthError::Validation("field list is empty".to_string()));
    }
    Ok(fields)
}

/// A rental listing record, keyed by its URL.
///
/// Scrapers produce partial candidates (empty strings for fields they could
/// not extract); the stored record carries the reconciled current values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub url: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub beds: String,
    #[serde(default)]
    pub baths: String,
    #[serde(default)]
    pub sqft: String,
    #[serde(default)]
    pub house_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub available_date: String,
    #[serde(default)]
    pub parking: String,
    #[serde(default)]
    pub utilities: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub appointment_url: String,
    /// RFC 3339 UTC timestamp of the last automated write.
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub decision: Decision,
}

impl Listing {
    /// Create an empty listing for the given URL, stamped with the current time.
    pub fn new(url: impl Into<String>) -> Self {
        Listing {
            url: url.into(),
            address: String::new(),
            price: String::new(),
            beds: String::new(),
            baths: String::new(),
            sqft: String::new(),
            house_type: String::new(),
            description: String::new(),
            amenities: Vec::new(),
            available_date: String::new(),
            parking: String::new(),
            utilities: String::new(),
            contact_info: String::new(),
            appointment_url: String::new(),
            scraped_at: now_rfc3339(),
            notes: String::new(),
            decision: Decision::default(),
        }
    }

    /// Textual representation of a field, as fingerprinted by the ledger.
    ///
    /// Amenities are comma-joined; the decision renders as its display string.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Url => self.url.clone(),
            Field::Address => self.address.clone(),
            Field::Price => self.price.clone(),
            Field::Beds => self.beds.clone(),
            Field::Baths => self.baths.clone(),
            Field::Sqft => self.sqft.clone(),
            Field::HouseType => self.house_type.clone(),
            Field::Description => self.description.clone(),
            Field::Amenities => self.amenities.join(", "),
            Field::AvailableDate => self.available_date.clone(),
            Field::Parking => self.parking.clone(),
            Field::Utilities => self.utilities.clone(),
            Field::ContactInfo => self.contact_info.clone(),
            Field::AppointmentUrl => self.appointment_url.clone(),
            Field::ScrapedAt => self.scraped_at.clone(),
            Field::Notes => self.notes.clone(),
            Field::Decision => self.decision.to_string(),
        }
    }

    /// Whether the field carries no value worth merging.
    ///
    /// For `decision` the default `Pending Review` counts as unset.
    pub fn field_is_empty(&self, field: Field) -> bool {
        match field {
            Field::Amenities => self.amenities.is_empty(),
            Field::Decision => self.decision == Decision::PendingReview,
            _ => self.field_text(field).trim().is_empty(),
        }
    }

    /// Copy one field's typed value from another listing.
    pub fn copy_field(&mut self, from: &Listing, field: Field) {
        match field {
            Field::Url => self.url = from.url.clone(),
            Field::Address => self.address = from.address.clone(),
            Field::Price => self.price = from.price.clone(),
            Field::Beds => self.beds = from.beds.clone(),
            Field::Baths => self.baths = from.baths.clone(),
            Field::Sqft => self.sqft = from.sqft.clone(),
            Field::HouseType => self.house_type = from.house_type.clone(),
            Field::Description => self.description = from.description.clone(),
            Field::Amenities => self.amenities = from.amenities.clone(),
            Field::AvailableDate => self.available_date = from.available_date.clone(),
            Field::Parking => self.parking = from.parking.clone(),
            Field::Utilities => self.utilities = from.utilities.clone(),
            Field::ContactInfo => self.contact_info = from.contact_info.clone(),
            Field::AppointmentUrl => self.appointment_url = from.appointment_url.clone(),
            Field::ScrapedAt => self.scraped_at = from.scraped_at.clone(),
            Field::Notes => self.notes = from.notes.clone(),
            Field::Decision => self.decision = from.decision,
        }
    }
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current time as an RFC 3339 UTC string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render epoch milliseconds as an RFC 3339 UTC string.
pub fn format_millis(ms: u64) -> String {
    match Utc.timestamp_millis_opt(ms as i64) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        _ => format!("{}ms", ms),
    }
}
