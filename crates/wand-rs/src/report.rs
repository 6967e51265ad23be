//! Plain-text rendering of records and correction summaries.

use std::fmt::Write;
use wand_rs_core::RecordStore;
use wand_rs_protocol::CorrectionResult;

pub const SUMMARY_HEADING: &str = "Summary of Changes";

/// One `index  role  content` line per record, newlines escaped.
pub fn listing(store: &RecordStore) -> String {
    let mut out = String::new();
    for (index, _, record) in store.records() {
        let _ = writeln!(
            out,
            "{:>4}  {:<9}  {}",
            index,
            record.role,
            single_line(&record.content)
        );
    }
    out
}

/// Each correction as its role, the original text, and the amendment.
pub fn summary_table(results: &[CorrectionResult]) -> String {
    let mut out = format!("{SUMMARY_HEADING}\n");
    if results.is_empty() {
        out.push_str("(no changes)\n");
        return out;
    }
    for result in results {
        let _ = writeln!(out, "[{}] {}", result.position, result.role);
        let _ = writeln!(out, "  - {}", single_line(&result.content));
        let _ = writeln!(out, "  + {}", single_line(&result.amended_text));
    }
    out
}

fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}
