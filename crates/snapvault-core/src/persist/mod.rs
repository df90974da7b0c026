//! Whole-state persistence codec
//!
//! ## Payload
//!
//! A JSON envelope around the manager state:
//!
//! ```text
//! {
//!   "format": "snapvault.state",
//!   "version": 1,
//!   "body_digest": "<hex sha256 of the body>",
//!   "body": { max_capacity, comparator, copy_on_save, copy_on_retrieve,
//!             next_id, next_seq, order, records }
//! }
//! ```
//!
//! Decoding checks the envelope, recomputes the digest and validates the
//! body's internal consistency before anything is rebuilt from it. Any
//! violation is reported as `CorruptState`.

pub mod atomic;
pub mod digest;

pub use atomic::atomic_write;
pub use digest::body_digest;

use crate::errors::{Result, SnapshotError};
use crate::model::Metadata;
use crate::tree::Tree;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Envelope format marker
pub const STATE_FORMAT: &str = "snapvault.state";

/// Current payload version
pub const STATE_VERSION: u32 = 1;

/// One persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload<L> {
    pub id: String,
    pub tree: Tree<L>,
    pub metadata: Metadata,
    pub tags: BTreeSet<String>,
    pub insertion_seq: u64,
}

/// Everything needed to rebuild a manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBody<L> {
    pub max_capacity: usize,
    /// Comparator name, `None` for FIFO
    pub comparator: Option<String>,
    pub copy_on_save: bool,
    pub copy_on_retrieve: bool,
    /// Id-generation counter
    pub next_id: u64,
    /// Next insertion sequence number
    pub next_seq: u64,
    /// Ids in storage order
    pub order: Vec<String>,
    pub records: Vec<RecordPayload<L>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    body_digest: String,
    body: Value,
}

impl<L> StateBody<L> {
    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` on the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(SnapshotError::corrupt("max_capacity must be at least 1"));
        }
        if self.order.len() > self.max_capacity {
            return Err(SnapshotError::corrupt(format!(
                "{} snapshots exceed max_capacity {}",
                self.order.len(),
                self.max_capacity
            )));
        }
        if self.order.len() != self.records.len() {
            return Err(SnapshotError::corrupt(format!(
                "order lists {} ids but {} records are present",
                self.order.len(),
                self.records.len()
            )));
        }

        let mut ordered = HashSet::with_capacity(self.order.len());
        for id in &self.order {
            if !ordered.insert(id.as_str()) {
                return Err(SnapshotError::corrupt(format!("id {} repeats in order", id)));
            }
        }

        let mut seen_ids = HashSet::with_capacity(self.records.len());
        let mut seen_seqs = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            if !seen_ids.insert(record.id.as_str()) {
                return Err(SnapshotError::corrupt(format!(
                    "record {} appears more than once",
                    record.id
                )));
            }
            if !ordered.contains(record.id.as_str()) {
                return Err(SnapshotError::corrupt(format!(
                    "record {} is missing from order",
                    record.id
                )));
            }
            if record.insertion_seq >= self.next_seq {
                return Err(SnapshotError::corrupt(format!(
                    "record {} has insertion_seq {} not below next_seq {}",
                    record.id, record.insertion_seq, self.next_seq
                )));
            }
            if !seen_seqs.insert(record.insertion_seq) {
                return Err(SnapshotError::corrupt(format!(
                    "insertion_seq {} is shared by more than one record",
                    record.insertion_seq
                )));
            }
        }
        Ok(())
    }
}

/// Encode a state body into envelope bytes
///
/// The encoded body must decode back into a `StateBody<L>`. JSON has no
/// NaN or infinity and `serde_json` writes them as `null`, so a tree with
/// non-finite float leaves is refused here rather than written as a
/// payload that cannot be loaded.
///
/// # Errors
///
/// Returns `Serialization` if a leaf or metadata value cannot be encoded,
/// or if the encoded body would not decode.
pub fn encode_state<L: Serialize + DeserializeOwned>(body: &StateBody<L>) -> Result<Vec<u8>> {
    let body = serde_json::to_value(body)?;
    StateBody::<L>::deserialize(&body).map_err(|e| SnapshotError::Serialization {
        message: format!("encoded state does not decode: {}", e),
    })?;
    let envelope = Envelope {
        format: STATE_FORMAT.to_string(),
        version: STATE_VERSION,
        body_digest: body_digest(&body)?,
        body,
    };
    let bytes = serde_json::to_vec(&envelope)?;
    tracing::debug!(payload_bytes = bytes.len(), "encoded state payload");
    Ok(bytes)
}

/// Decode and validate envelope bytes
///
/// # Errors
///
/// - `Serialization` if the bytes are not a well-formed envelope or the
///   body does not match the expected schema
/// - `CorruptState` on a format, version, digest or consistency failure
pub fn decode_state<L: DeserializeOwned>(bytes: &[u8]) -> Result<StateBody<L>> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.format != STATE_FORMAT {
        return Err(SnapshotError::corrupt(format!(
            "unexpected format {}",
            envelope.format
        )));
    }
    if envelope.version != STATE_VERSION {
        return Err(SnapshotError::corrupt(format!(
            "unsupported version {}",
            envelope.version
        )));
    }

    let actual = body_digest(&envelope.body)?;
    if actual != envelope.body_digest {
        return Err(SnapshotError::corrupt(format!(
            "body digest mismatch: expected {}, computed {}",
            envelope.body_digest, actual
        )));
    }

    let body: StateBody<L> = serde_json::from_value(envelope.body)?;
    body.validate()?;
    tracing::debug!(
        payload_bytes = bytes.len(),
        records = body.records.len(),
        "decoded state payload"
    );
    Ok(body)
}
