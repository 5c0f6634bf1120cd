//! # Wire schema — the record store's native shape
//!
//! The hosted record store is a spreadsheet-like database: every request
//! and response wraps rows in `{ records: [{ id, fields, createdTime }] }`
//! envelopes, field names are lower-case with spaces (`"has kids"`,
//! `"marital status"`), the address is a single concatenated string, and
//! enum-ish columns are free-form text. Everything in this module exists to
//! keep those quirks out of the core: the rest of the system only ever sees
//! the canonical [`Contact`].
//!
//! Contacts and communications live in two tables ([`CONTACTS_TABLE`],
//! [`COMMUNICATIONS_TABLE`]), joined by a linked-record id column.
//!
//! Enum columns are coerced through the core's [`Parsed`] API so fallbacks
//! are explicit; a fallback is logged rather than silently absorbed.
//! Sync bookkeeping (`synced`/`deleted`) and the communications list are
//! never serialized into contact fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use store::models::{
    Address, Birthday, Communication, CommunicationType, Contact, ContactCategory,
    ContactStatus, MaritalStatus,
};

pub const CONTACTS_TABLE: &str = "Contacts";
pub const COMMUNICATIONS_TABLE: &str = "Communications";

/// One row: server-assigned id plus the table-specific field set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "F: serde::de::DeserializeOwned + Default"))]
pub struct Record<F> {
    pub id: String,
    #[serde(default)]
    pub fields: F,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

/// List response envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "F: serde::de::DeserializeOwned + Default"))]
pub struct RecordList<F> {
    #[serde(default = "Vec::new")]
    pub records: Vec<Record<F>>,
}

/// Create/update request envelope.
#[derive(Clone, Debug, Serialize)]
pub struct FieldsEnvelope<F> {
    pub fields: F,
}

/// Delete response.
#[derive(Clone, Debug, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub id: String,
}

/// Contact row as the store sees it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContactFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Single concatenated string, not a structured address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "has kids", default, skip_serializing_if = "Option::is_none")]
    pub has_kids: Option<bool>,
    #[serde(rename = "number of kids", default, skip_serializing_if = "Option::is_none")]
    pub number_of_kids: Option<u32>,
    #[serde(rename = "marital status", default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(rename = "additional details", default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
    #[serde(rename = "last contacted at", default, skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Communication row: linked to its contact by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommunicationFields {
    /// Linked-record column; the store wraps single links in an array.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Project a canonical contact onto the wire field set, dropping the sync
/// bookkeeping and the communications list (those live in their own table).
pub fn contact_to_fields(contact: &Contact) -> ContactFields {
    ContactFields {
        name: Some(contact.name.clone()),
        role: non_empty(&contact.role),
        status: Some(contact.status.as_str().to_string()),
        category: Some(contact.category.as_str().to_string()),
        description: non_empty(&contact.description),
        birthday: contact.birthday.map(birthday_to_wire),
        age: contact.age,
        address: {
            let display = contact.address.display();
            (!display.is_empty()).then_some(display)
        },
        has_kids: Some(contact.has_kids),
        number_of_kids: contact.number_of_kids,
        marital_status: contact.marital_status.map(|m| m.as_str().to_string()),
        additional_details: non_empty(&contact.additional_details),
        last_contacted_at: contact.last_contacted_at,
        phone: contact.phone_number.clone(),
        email: contact.email.clone(),
    }
}

/// Build a canonical contact from a wire record. Communications are joined
/// in separately by the client. Enum columns coerce with visible fallbacks.
pub fn record_to_contact(record: &Record<ContactFields>) -> Contact {
    let fields = &record.fields;

    let status = fields
        .status
        .as_deref()
        .map(ContactStatus::parse)
        .unwrap_or(store::Parsed::Fallback(ContactStatus::default()));
    if status.is_fallback() {
        debug!(id = %record.id, raw = ?fields.status, "status fell back to default");
    }
    let category = fields
        .category
        .as_deref()
        .map(ContactCategory::parse)
        .unwrap_or(store::Parsed::Fallback(ContactCategory::default()));
    if category.is_fallback() {
        debug!(id = %record.id, raw = ?fields.category, "category fell back to default");
    }

    let created_at = record.created_time.unwrap_or_else(Utc::now);
    Contact {
        id: record.id.clone(),
        name: fields.name.clone().unwrap_or_default(),
        role: fields.role.clone().unwrap_or_default(),
        status: status.value(),
        category: category.value(),
        description: fields.description.clone().unwrap_or_default(),
        picture: None,
        birthday: fields.birthday.as_deref().and_then(birthday_from_wire),
        age: fields.age,
        address: Address {
            // The store holds one opaque string; it lands in `street`.
            street: fields.address.clone().filter(|s| !s.is_empty()),
            ..Address::default()
        },
        has_kids: fields.has_kids.unwrap_or(false),
        number_of_kids: fields.number_of_kids,
        marital_status: fields
            .marital_status
            .as_deref()
            .and_then(MaritalStatus::parse),
        additional_details: fields.additional_details.clone().unwrap_or_default(),
        phone_number: fields.phone.clone(),
        email: fields.email.clone(),
        communications: Vec::new(),
        last_contacted_at: fields.last_contacted_at,
        created_at,
        updated_at: created_at,
        synced: true,
        deleted: false,
    }
}

/// Extract the linked contact id and the communication itself from a
/// communications-table record. Rows with no link are skipped by callers.
pub fn record_to_communication(
    record: &Record<CommunicationFields>,
) -> (Option<String>, Communication) {
    let contact_id = record.fields.contact.first().cloned();
    let communication = Communication {
        id: record.id.clone(),
        types: record
            .fields
            .types
            .iter()
            .filter_map(|t| communication_type_from_wire(t))
            .collect(),
        notes: record.fields.notes.clone().unwrap_or_default(),
        date: record
            .fields
            .date
            .or(record.created_time)
            .unwrap_or_else(Utc::now),
    };
    (contact_id, communication)
}

pub fn communication_type_to_wire(t: CommunicationType) -> &'static str {
    match t {
        CommunicationType::Call => "Call",
        CommunicationType::Video => "Video",
        CommunicationType::InPerson => "In Person",
        CommunicationType::Email => "Email",
    }
}

pub fn communication_type_from_wire(s: &str) -> Option<CommunicationType> {
    match s.trim() {
        "Call" => Some(CommunicationType::Call),
        "Video" => Some(CommunicationType::Video),
        "In Person" => Some(CommunicationType::InPerson),
        "Email" => Some(CommunicationType::Email),
        _ => None,
    }
}

/// `YYYY-MM-DD` for a full date, `MM-DD` when the year is withheld.
fn birthday_to_wire(birthday: Birthday) -> String {
    match birthday {
        Birthday::Full(date) => date.format("%Y-%m-%d").to_string(),
        Birthday::MonthDay { month, day } => format!("{month:02}-{day:02}"),
    }
}

fn birthday_from_wire(s: &str) -> Option<Birthday> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Birthday::Full(date));
    }
    let mut parts = s.splitn(2, '-');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    (1..=12).contains(&month).then_some(())?;
    (1..=31).contains(&day).then_some(())?;
    Some(Birthday::MonthDay { month, day })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_contact() -> Contact {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Contact {
            id: "local-1".to_string(),
            name: "Ada Lovelace".to_string(),
            role: "Engineer".to_string(),
            status: ContactStatus::Pending,
            category: ContactCategory::Recruiter,
            description: String::new(),
            picture: None,
            birthday: Some(Birthday::MonthDay { month: 12, day: 10 }),
            age: Some(36),
            address: Address {
                street: Some("12 Oak St".into()),
                city: Some("Springfield".into()),
                state: None,
                zip_code: None,
                country: None,
            },
            has_kids: true,
            number_of_kids: Some(2),
            marital_status: Some(MaritalStatus::Single),
            additional_details: String::new(),
            phone_number: Some("5551234567".into()),
            email: Some("ada@example.com".into()),
            communications: vec![Communication {
                id: "comm-1".to_string(),
                types: vec![CommunicationType::Call],
                notes: String::new(),
                date: now,
            }],
            last_contacted_at: Some(now),
            created_at: now,
            updated_at: now,
            synced: false,
            deleted: false,
        }
    }

    #[test]
    fn test_contact_to_fields_strips_bookkeeping_and_joins_address() {
        let fields = contact_to_fields(&sample_contact());
        assert_eq!(fields.address.as_deref(), Some("12 Oak St, Springfield"));
        assert_eq!(fields.status.as_deref(), Some("PENDING"));
        assert_eq!(fields.category.as_deref(), Some("Recruiter"));
        assert_eq!(fields.birthday.as_deref(), Some("12-10"));
        assert_eq!(fields.has_kids, Some(true));
        assert_eq!(fields.number_of_kids, Some(2));

        // No bookkeeping or communications leak onto the wire.
        let json = serde_json::to_value(&fields).unwrap();
        assert!(json.get("synced").is_none());
        assert!(json.get("deleted").is_none());
        assert!(json.get("communications").is_none());
        assert!(json.get("has kids").is_some());
        assert!(json.get("marital status").is_some());
    }

    #[test]
    fn test_record_to_contact_coerces_unknown_enums() {
        let record = Record {
            id: "rec1".to_string(),
            fields: ContactFields {
                name: Some("Bo".into()),
                status: Some("definitely-wrong".into()),
                category: Some("Landlord".into()),
                marital_status: Some("Married".into()),
                ..Default::default()
            },
            created_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        };

        let contact = record_to_contact(&record);
        assert_eq!(contact.status, ContactStatus::Active);
        assert_eq!(contact.category, ContactCategory::Client);
        assert_eq!(contact.marital_status, None);
        assert!(contact.synced);
        assert!(!contact.deleted);
        assert_eq!(
            contact.created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_record_list_tolerates_missing_fields() {
        // A row can arrive with no fields object at all.
        let list: RecordList<ContactFields> = serde_json::from_str(
            r#"{"records":[{"id":"rec1"},{"id":"rec2","fields":{"name":"Bo"}}]}"#,
        )
        .unwrap();
        assert_eq!(list.records.len(), 2);
        assert_eq!(list.records[0].fields.name, None);
        assert_eq!(list.records[1].fields.name.as_deref(), Some("Bo"));

        let empty: RecordList<CommunicationFields> =
            serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.records.is_empty());
    }

    #[test]
    fn test_wire_address_lands_in_street() {
        let record = Record {
            id: "rec1".to_string(),
            fields: ContactFields {
                name: Some("Bo".into()),
                address: Some("1 Elm St, Shelbyville".into()),
                ..Default::default()
            },
            created_time: None,
        };
        let contact = record_to_contact(&record);
        assert_eq!(contact.address.street.as_deref(), Some("1 Elm St, Shelbyville"));
        assert_eq!(contact.address.display(), "1 Elm St, Shelbyville");
    }

    #[test]
    fn test_birthday_wire_roundtrip() {
        let full = Birthday::Full(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap());
        assert_eq!(birthday_to_wire(full), "1990-06-15");
        assert_eq!(birthday_from_wire("1990-06-15"), Some(full));

        let md = Birthday::MonthDay { month: 6, day: 5 };
        assert_eq!(birthday_to_wire(md), "06-05");
        assert_eq!(birthday_from_wire("06-05"), Some(md));

        assert_eq!(birthday_from_wire("13-40"), None);
        assert_eq!(birthday_from_wire("garbage"), None);
    }

    #[test]
    fn test_communication_record_join_key() {
        let record = Record {
            id: "comm-9".to_string(),
            fields: CommunicationFields {
                contact: vec!["rec1".to_string()],
                types: vec!["Call".to_string(), "Carrier Pigeon".to_string()],
                notes: Some("hello".to_string()),
                date: Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
            },
            created_time: None,
        };
        let (contact_id, communication) = record_to_communication(&record);
        assert_eq!(contact_id.as_deref(), Some("rec1"));
        // Unknown channel strings are dropped rather than invented.
        assert_eq!(communication.types, vec![CommunicationType::Call]);
        assert_eq!(
            communication.date,
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
    }
}
