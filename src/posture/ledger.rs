//! Optional activity ledger.
//!
//! Hosts with an audit store can install a [`PostureLedger`]; without one the
//! controller records into [`NoopLedger`] and behaves identically.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::actor::{Actor, ActorId};
use super::kind::PostureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Start,
    Stop,
}

/// One command-driven posture change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub actor_id: ActorId,
    pub actor_name: String,
    pub kind: PostureKind,
    pub action: LedgerAction,
    pub at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(actor: &dyn Actor, kind: PostureKind, action: LedgerAction) -> Self {
        Self {
            actor_id: actor.id(),
            actor_name: actor.name().to_string(),
            kind,
            action,
            at: Utc::now(),
        }
    }

    /// Reason tag stored alongside the entry, e.g. `posture:sit`.
    pub fn reason(&self) -> String {
        format!("posture:{}", self.kind)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "player": self.actor_id.to_string(),
            "name": self.actor_name,
            "kind": self.kind,
            "state": self.action,
            "reason": self.reason(),
            "at": self.at.to_rfc3339(),
        })
    }
}

pub trait PostureLedger: Send + Sync {
    fn record(&self, entry: LedgerEntry);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLedger;

impl PostureLedger for NoopLedger {
    fn record(&self, _entry: LedgerEntry) {}
}
