//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the logging macros,
//! the store's debug events, and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_SNAPSHOT_ID: &str = "snapshot_id";
pub const FIELD_EVICTED_ID: &str = "evicted_id";

// Collection sizes
pub const FIELD_STORE_LEN: &str = "store_len";
pub const FIELD_MAX_CAPACITY: &str = "max_capacity";
pub const FIELD_RESULT_LEN: &str = "result_len";
pub const FIELD_PAYLOAD_BYTES: &str = "payload_bytes";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
