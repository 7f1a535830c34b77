//! JSON output for delta records.
//!
//! Serializes the ordered record set for scripting and piping.

use serde::Serialize;

use crate::diff::DeltaRecord;

#[derive(Serialize)]
struct JsonReport<'a> {
    changes: &'a [DeltaRecord],
    net_change: i64,
}

pub fn render(records: &[DeltaRecord], net_change: i64) -> String {
    let report = JsonReport { changes: records, net_change };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| String::from("{}"))
}
