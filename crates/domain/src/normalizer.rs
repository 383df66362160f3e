//! Maps free-form Warehouse status strings onto [`FabricationStatus`].
//!
//! Rules are case-insensitive; `-` and spaces collapse to `_` before
//! matching (spec §4.2).

use crate::status::FabricationStatus;

fn canonicalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Normalizes a raw Warehouse status string into a [`FabricationStatus`].
///
/// Unknown or empty input conservatively maps to `InProgress` rather than
/// `Completed`, so an unrecognized status never short-circuits the
/// fabricated-event invariant (spec §8, invariant 3).
pub fn normalize(raw: &str) -> FabricationStatus {
    match canonicalize(raw).as_str() {
        "completed" | "complete" | "done" | "finished" | "fabricated" => {
            FabricationStatus::Completed
        }
        "in_progress" | "working" | "manufacturing" | "fabricating" | "running" => {
            FabricationStatus::InProgress
        }
        "requested" | "queued" | "pending" | "created" => FabricationStatus::Requested,
        "failed" | "error" | "ko" | "rejected" => FabricationStatus::Failed,
        _ => FabricationStatus::InProgress,
    }
}
