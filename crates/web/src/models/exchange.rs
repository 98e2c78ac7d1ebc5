//! Exchange and entry domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use santa_paws_core::{CorgiId, EntryId, ExchangeId};

/// A gift exchange round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// Unique exchange ID.
    pub id: ExchangeId,
    /// Display title (e.g. "Holiday Paws").
    pub title: String,
    /// Exchange year.
    pub year: i32,
    /// Date gifts should arrive by.
    pub due_date: NaiveDate,
    /// Whether new entries are accepted.
    pub is_open: bool,
}

/// Input for registering one corgi as a Santa.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Exchange to join.
    pub exchange_id: ExchangeId,
    /// Corgi acting as Santa.
    pub santa_id: CorgiId,
    /// Optional notes for the organizer.
    pub notes: Option<String>,
}

/// An entry joined with its exchange and corgi names, for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    /// Entry ID.
    pub id: EntryId,
    /// Exchange joined.
    pub exchange_id: ExchangeId,
    /// Exchange title.
    pub exchange_title: String,
    /// Exchange year.
    pub exchange_year: i32,
    /// Exchange due date.
    pub due_date: NaiveDate,
    /// Santa corgi.
    pub santa_id: CorgiId,
    /// Santa corgi's name.
    pub santa_name: String,
    /// Notes entered when joining.
    pub notes: Option<String>,
    /// Recipient's name once assigned.
    pub recipient_name: Option<String>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}
