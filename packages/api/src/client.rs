//! # HTTP adapter for the hosted record store
//!
//! [`HttpRemoteStore`] implements [`RemoteStore`] over the store's REST
//! surface: one base URL, two tables, record envelopes throughout. The
//! translation between wire fields and the canonical [`Contact`] lives in
//! [`crate::fields`]; this module is request plumbing and error
//! classification.
//!
//! A single [`reqwest::Client`] is built at construction with the
//! configured request timeout and reused for every call. The connectivity
//! probe applies its own, shorter per-request timeout and maps every
//! failure to `false` instead of an error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use store::config::KeeptouchConfig;
use store::models::{Communication, CommunicationType, Contact};
use store::remote::{RemoteError, RemoteStore};

use crate::fields::{
    communication_type_to_wire, contact_to_fields, record_to_communication,
    record_to_contact, CommunicationFields, ContactFields, DeleteResponse,
    FieldsEnvelope, Record, RecordList, COMMUNICATIONS_TABLE, CONTACTS_TABLE,
};

pub struct HttpRemoteStore {
    http: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpRemoteStore {
    /// Build an adapter rooted at `base_url` (no trailing slash needed).
    /// Falls back to reqwest's defaults if the client cannot be configured.
    pub fn new(base_url: impl Into<String>, config: &KeeptouchConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.sync.request_timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.sync.probe_timeout_secs as u64),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, table, id)
    }

    /// Classify a transport-level failure. Anything that never produced a
    /// usable response counts as connectivity; a response whose body could
    /// not be decoded means the store answered with something unexpected.
    fn classify(err: reqwest::Error) -> RemoteError {
        if err.is_decode() {
            RemoteError::Validation(err.to_string())
        } else {
            RemoteError::Connectivity(err.to_string())
        }
    }

    /// Turn a non-success response into the matching error variant.
    async fn status_error(response: reqwest::Response) -> RemoteError {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return RemoteError::NotFound;
        }
        let body = response.text().await.unwrap_or_default();
        RemoteError::Validation(format!("{status}: {body}"))
    }

    async fn fetch_communications(
        &self,
    ) -> Result<Vec<(Option<String>, Communication)>, RemoteError> {
        let response = self
            .http
            .get(self.table_url(COMMUNICATIONS_TABLE))
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let list: RecordList<CommunicationFields> =
            response.json().await.map_err(Self::classify)?;
        Ok(list.records.iter().map(record_to_communication).collect())
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn check_availability(&self) -> bool {
        let result = self
            .http
            .get(self.table_url(CONTACTS_TABLE))
            .timeout(self.probe_timeout)
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "availability probe failed");
                false
            }
        }
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, RemoteError> {
        let response = self
            .http
            .get(self.table_url(CONTACTS_TABLE))
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let list: RecordList<ContactFields> =
            response.json().await.map_err(Self::classify)?;
        let mut contacts: Vec<Contact> =
            list.records.iter().map(record_to_contact).collect();

        // Join the communications table in by linked contact id, newest
        // first within each contact.
        match self.fetch_communications().await {
            Ok(communications) => {
                for (contact_id, communication) in communications {
                    let Some(contact_id) = contact_id else { continue };
                    if let Some(contact) =
                        contacts.iter_mut().find(|c| c.id == contact_id)
                    {
                        contact.communications.push(communication);
                    }
                }
                for contact in &mut contacts {
                    contact.communications.sort_by(|a, b| b.date.cmp(&a.date));
                }
            }
            Err(err) => {
                warn!(error = %err, "communications fetch failed, listing contacts without them");
            }
        }
        Ok(contacts)
    }

    async fn get_contact(&self, id: &str) -> Result<Contact, RemoteError> {
        let response = self
            .http
            .get(self.record_url(CONTACTS_TABLE, id))
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let record: Record<ContactFields> =
            response.json().await.map_err(Self::classify)?;
        let mut contact = record_to_contact(&record);

        match self.fetch_communications().await {
            Ok(communications) => {
                contact.communications = communications
                    .into_iter()
                    .filter(|(contact_id, _)| contact_id.as_deref() == Some(id))
                    .map(|(_, communication)| communication)
                    .collect();
                contact.communications.sort_by(|a, b| b.date.cmp(&a.date));
            }
            Err(err) => {
                warn!(error = %err, "communications fetch failed for contact");
            }
        }
        Ok(contact)
    }

    async fn create_contact(&self, contact: &Contact) -> Result<Contact, RemoteError> {
        let envelope = FieldsEnvelope {
            fields: contact_to_fields(contact),
        };
        let response = self
            .http
            .post(self.table_url(CONTACTS_TABLE))
            .json(&envelope)
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let record: Record<ContactFields> =
            response.json().await.map_err(Self::classify)?;
        Ok(record_to_contact(&record))
    }

    async fn update_contact(
        &self,
        id: &str,
        contact: &Contact,
    ) -> Result<Contact, RemoteError> {
        let envelope = FieldsEnvelope {
            fields: contact_to_fields(contact),
        };
        let response = self
            .http
            .patch(self.record_url(CONTACTS_TABLE, id))
            .json(&envelope)
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let record: Record<ContactFields> =
            response.json().await.map_err(Self::classify)?;
        let mut updated = record_to_contact(&record);
        // The contact record does not carry its communications or original
        // creation time; keep the caller's.
        updated.communications = contact.communications.clone();
        updated.created_at = contact.created_at;
        updated.last_contacted_at =
            updated.last_contacted_at.or(contact.last_contacted_at);
        Ok(updated)
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, RemoteError> {
        let response = self
            .http
            .delete(self.record_url(CONTACTS_TABLE, id))
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let deleted: DeleteResponse = response.json().await.map_err(Self::classify)?;
        Ok(deleted.deleted)
    }

    async fn add_communication(
        &self,
        contact_id: &str,
        types: &[CommunicationType],
        notes: &str,
        date: DateTime<Utc>,
    ) -> Result<Communication, RemoteError> {
        let envelope = FieldsEnvelope {
            fields: CommunicationFields {
                contact: vec![contact_id.to_string()],
                types: types
                    .iter()
                    .map(|t| communication_type_to_wire(*t).to_string())
                    .collect(),
                notes: Some(notes.to_string()),
                date: Some(date),
            },
        };
        let response = self
            .http
            .post(self.table_url(COMMUNICATIONS_TABLE))
            .json(&envelope)
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let record: Record<CommunicationFields> =
            response.json().await.map_err(Self::classify)?;
        let (_, communication) = record_to_communication(&record);
        Ok(communication)
    }
}
