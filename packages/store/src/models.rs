//! # Domain models for contacts and communications
//!
//! Defines the canonical data structures the rest of the crate operates on.
//! These types are `Serialize + Deserialize` so the full mirror state can be
//! written to a durable snapshot slot and read back across restarts.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Contact`] | A person record: identity, descriptive fields, demographics, contact channels, address, timestamps, the communication log, and the core-owned sync bookkeeping flags (`synced`, `deleted`). |
//! | [`Communication`] | One logged contact event — immutable once created; editing a contact's history means appending, never mutating. |
//! | [`PendingChange`] | A queued offline mutation (`create`/`update`/`delete`) awaiting replay against the record store. |
//! | [`Address`] | Structured address, concatenated to a single display string at the store boundary via [`Address::display`]. |
//! | [`Birthday`] | Either a full date or a year-hidden month/day pair. |
//!
//! ## Enum coercion
//!
//! The hosted record store hands back status/category/marital values as
//! free-form strings. Rather than silently best-effort matching, the parse
//! functions here return a [`Parsed`] tagged result so callers can see (and
//! test) when a value fell back to its default:
//!
//! - [`ContactStatus::parse`] — unknown → `Fallback(Active)`
//! - [`ContactCategory::parse`] — unknown → `Fallback(Client)`
//! - [`MaritalStatus::parse`] — unknown → `None`
//!
//! ## Helper functions
//!
//! - [`format_phone_number`] — digits → `(XXX) XXX-XXXX` display form.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of parsing a free-form string into an enum: either the exact
/// value, or the domain default when the input was empty or unrecognised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parsed<T> {
    /// The input matched a known value.
    Exact(T),
    /// The input was empty or unknown; carries the fallback default.
    Fallback(T),
}

impl<T> Parsed<T> {
    /// Unwrap to the carried value, exact or fallback.
    pub fn value(self) -> T {
        match self {
            Parsed::Exact(v) | Parsed::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Parsed::Fallback(_))
    }
}

/// Contact lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Blocked,
}

impl ContactStatus {
    /// Parse a store-provided string, case-insensitively. Unknown or empty
    /// input falls back to [`ContactStatus::Active`].
    pub fn parse(s: &str) -> Parsed<ContactStatus> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Parsed::Exact(ContactStatus::Active),
            "INACTIVE" => Parsed::Exact(ContactStatus::Inactive),
            "PENDING" => Parsed::Exact(ContactStatus::Pending),
            "BLOCKED" => Parsed::Exact(ContactStatus::Blocked),
            _ => Parsed::Fallback(ContactStatus::Active),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "ACTIVE",
            ContactStatus::Inactive => "INACTIVE",
            ContactStatus::Pending => "PENDING",
            ContactStatus::Blocked => "BLOCKED",
        }
    }
}

/// Contact category. An open set in the record store; unknown values coerce
/// to [`ContactCategory::Client`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactCategory {
    #[serde(rename = "Kitchen Table")]
    KitchenTable,
    #[serde(rename = "Inside House")]
    InsideHouse,
    #[serde(rename = "Outside House")]
    OutsideHouse,
    Recruiter,
    #[default]
    Client,
    Employer,
    Bills,
    Health,
    Woman,
}

impl ContactCategory {
    pub fn parse(s: &str) -> Parsed<ContactCategory> {
        match s.trim() {
            "Kitchen Table" => Parsed::Exact(ContactCategory::KitchenTable),
            "Inside House" => Parsed::Exact(ContactCategory::InsideHouse),
            "Outside House" => Parsed::Exact(ContactCategory::OutsideHouse),
            "Recruiter" => Parsed::Exact(ContactCategory::Recruiter),
            "Client" => Parsed::Exact(ContactCategory::Client),
            "Employer" => Parsed::Exact(ContactCategory::Employer),
            "Bills" => Parsed::Exact(ContactCategory::Bills),
            "Health" => Parsed::Exact(ContactCategory::Health),
            "Woman" => Parsed::Exact(ContactCategory::Woman),
            _ => Parsed::Fallback(ContactCategory::Client),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactCategory::KitchenTable => "Kitchen Table",
            ContactCategory::InsideHouse => "Inside House",
            ContactCategory::OutsideHouse => "Outside House",
            ContactCategory::Recruiter => "Recruiter",
            ContactCategory::Client => "Client",
            ContactCategory::Employer => "Employer",
            ContactCategory::Bills => "Bills",
            ContactCategory::Health => "Health",
            ContactCategory::Woman => "Woman",
        }
    }
}

/// Marital status. Only meaningful when the contact's category is
/// [`ContactCategory::Woman`] under this domain's business rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Divorced,
    Separated,
    Widow,
}

impl MaritalStatus {
    /// Parse a store-provided string. Unknown input yields `None` rather
    /// than a fallback — the field is optional.
    pub fn parse(s: &str) -> Option<MaritalStatus> {
        match s.trim() {
            "Single" => Some(MaritalStatus::Single),
            "Divorced" => Some(MaritalStatus::Divorced),
            "Separated" => Some(MaritalStatus::Separated),
            "Widow" => Some(MaritalStatus::Widow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "Single",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Separated => "Separated",
            MaritalStatus::Widow => "Widow",
        }
    }
}

/// How a communication happened. A [`Communication`] carries a non-empty set
/// of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationType {
    Call,
    Video,
    #[serde(rename = "In Person")]
    InPerson,
    Email,
}

/// One logged contact event. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    /// Non-empty set of channels this communication used.
    pub types: Vec<CommunicationType>,
    pub notes: String,
    /// When the communication happened. Defaults to submission time; may be
    /// backdated but never future-dated.
    pub date: DateTime<Utc>,
}

/// Structured address. Every field is optional; the record store holds a
/// single concatenated string, produced by [`Address::display`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    /// Concatenate the populated parts into the single display string the
    /// record store expects: "street, city, state zip, country".
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(street) = self.street.as_deref().filter(|s| !s.is_empty()) {
            parts.push(street.to_string());
        }
        if let Some(city) = self.city.as_deref().filter(|s| !s.is_empty()) {
            parts.push(city.to_string());
        }
        match (
            self.state.as_deref().filter(|s| !s.is_empty()),
            self.zip_code.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(state), Some(zip)) => parts.push(format!("{state} {zip}")),
            (Some(state), None) => parts.push(state.to_string()),
            (None, Some(zip)) => parts.push(zip.to_string()),
            (None, None) => {}
        }
        if let Some(country) = self.country.as_deref().filter(|s| !s.is_empty()) {
            parts.push(country.to_string());
        }
        parts.join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.display().is_empty()
    }
}

/// A contact's birthday: either a full date, or a month/day pair with the
/// year withheld.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Birthday {
    Full(NaiveDate),
    MonthDay { month: u32, day: u32 },
}

impl Birthday {
    /// Age in whole years as of `today`. Only derivable from a full date.
    pub fn age_at(&self, today: NaiveDate) -> Option<u32> {
        match self {
            Birthday::Full(date) => {
                let mut age = today.year() - date.year();
                if (today.month(), today.day()) < (date.month(), date.day()) {
                    age -= 1;
                }
                u32::try_from(age).ok()
            }
            Birthday::MonthDay { .. } => None,
        }
    }
}

/// A person record — the canonical shape used everywhere in the core.
/// External-format variants are a serialization concern of the remote-store
/// adapter, not of this type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Globally unique, assigned client-side on creation, never reused.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub category: ContactCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub birthday: Option<Birthday>,
    /// Manually entered age; [`Contact::age`] prefers the derived value.
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub has_kids: bool,
    /// Meaningful only when `has_kids` is set.
    #[serde(default)]
    pub number_of_kids: Option<u32>,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub additional_details: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Newest first. Appended to by logging a communication, never edited.
    #[serde(default)]
    pub communications: Vec<Communication>,
    #[serde(default)]
    pub last_contacted_at: Option<DateTime<Utc>>,
    /// Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
    /// Set on every mutation.
    pub updated_at: DateTime<Utc>,
    /// False when this record carries local changes the record store has not
    /// confirmed. Core-owned; never sent to the remote store.
    #[serde(default = "default_true")]
    pub synced: bool,
    /// Tombstone flag: deleted while offline, awaiting a remote delete.
    #[serde(default)]
    pub deleted: bool,
}

fn default_true() -> bool {
    true
}

impl Contact {
    /// Age in whole years: derived from a full birthday when available,
    /// otherwise the manually entered value.
    pub fn age(&self) -> Option<u32> {
        self.birthday
            .and_then(|b| b.age_at(Utc::now().date_naive()))
            .or(self.age)
    }

    /// Phone number in `(XXX) XXX-XXXX` display form.
    pub fn formatted_phone(&self) -> Option<String> {
        self.phone_number.as_deref().map(format_phone_number)
    }
}

/// Kind of queued offline mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// A mutation recorded while the record store was unreachable, replayed by
/// the sync engine. At most one is retained per contact id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub kind: ChangeKind,
    /// Target contact id.
    pub id: String,
    /// Full contact snapshot for create/update; absent for delete.
    #[serde(default)]
    pub data: Option<Contact>,
    /// Enqueue time. FIFO per id; no cross-id ordering guarantee.
    pub timestamp: DateTime<Utc>,
}

/// Format a phone number as `(XXX) XXX-XXXX`. Non-digits are stripped
/// first; inputs shorter than ten digits are returned as bare digits.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 10 {
        return digits;
    }
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}
