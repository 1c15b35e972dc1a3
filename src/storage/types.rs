// src/storage/types.rs
use serde_json::{Map, Value};

/// A stored context document: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Field that names the record file unless configured otherwise.
pub const DEFAULT_ID_FIELD: &str = "installedAppId";

/// The record's identifying value, if the field is present and a string.
pub fn record_id<'a>(record: &'a Record, id_field: &str) -> Option<&'a str> {
    record.get(id_field).and_then(Value::as_str)
}

/// Field-level overwrite: every field in `partial` replaces (or adds) the
/// same field in `record`, `null` included. Untouched fields survive.
pub fn merge_fields(record: &mut Record, partial: Record) {
    for (name, value) in partial {
        record.insert(name, value);
    }
}
