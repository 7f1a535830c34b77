//! Text rendering for delta records.
//!
//! One row per record, kind-tagged and size-aligned, with a trailing TOTAL
//! line covering the net change of the full record set (not just the rows
//! that survived the limit).

use crate::diff::DeltaRecord;
use crate::util::{format_bytes, format_delta};

pub fn render(displayed: &[DeltaRecord], total: i64, limit: Option<i64>) -> String {
    let mut output = String::new();

    let limit_hint = match limit {
        Some(n) if n > 0 => format!(" (only the first {n} changes)"),
        _ => String::new(),
    };
    output.push_str(&format!("Differences{limit_hint}:\n"));

    if displayed.is_empty() {
        output.push_str("  no size changes between these backups\n");
    }

    for record in displayed {
        output.push_str(&format!(
            "{:>7} {:>12} {}  ({} -> {})\n",
            record.kind.as_str(),
            format_delta(record.delta),
            record.path,
            format_bytes(record.old_size),
            format_bytes(record.new_size),
        ));
    }

    output.push_str(&format!("{:>7} {:>12} TOTAL\n", "CHANGED", format_delta(total)));
    output
}
