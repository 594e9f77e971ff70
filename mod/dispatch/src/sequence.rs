//! Per-day batch number reservation.
//!
//! Batch numbers are `YYYYMMDD-NNNN` with NNNN running 0001–9999 within one
//! calendar day, contiguous and never reused. A naive read-then-insert can
//! hand the same number to two concurrent callers, so reservation is only
//! correct in combination with two guards in [`crate::service`]:
//! the creation path is serialized behind an in-process mutex, and the
//! `batch_number` column carries a UNIQUE constraint with a single retry as
//! a backstop. Numbers are consumed by the insert itself, so a failed
//! creation leaves no gap.

use chrono::{DateTime, Utc};

use desk_core::ServiceError;
use desk_sql::{SQLStore, Value};

/// Highest counter value available in one day.
const MAX_PER_DAY: u32 = 9999;

/// Format the day prefix for a batch number: `YYYYMMDD`.
pub fn day_prefix(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Compute the next batch number for the given day.
///
/// Reads the current maximum for the day's prefix and increments it; the
/// first batch of a day gets `-0001`. Counter exhaustion (9999) is an error,
/// the counter never wraps. A storage failure surfaces as StorageError and
/// nothing is written.
pub fn next_batch_number(db: &dyn SQLStore, day: &str) -> Result<String, ServiceError> {
    // Zero-padding makes lexicographic MAX the numeric max.
    let rows = db
        .query(
            "SELECT MAX(batch_number) AS latest FROM batches WHERE batch_number LIKE ?1",
            &[Value::Text(format!("{day}-%"))],
        )
        .map_err(|e| ServiceError::Storage(e.to_string()))?;

    let latest = rows.first().and_then(|r| r.get_str("latest"));

    let next = match latest {
        None => 1,
        Some(number) => {
            let counter = parse_counter(number).ok_or_else(|| {
                ServiceError::Storage(format!("malformed batch number in store: {number:?}"))
            })?;
            if counter >= MAX_PER_DAY {
                return Err(ServiceError::SequenceConflict(format!(
                    "batch counter exhausted for day {day}"
                )));
            }
            counter + 1
        }
    };

    Ok(format!("{day}-{next:04}"))
}

/// Extract the NNNN counter from a `YYYYMMDD-NNNN` batch number.
fn parse_counter(batch_number: &str) -> Option<u32> {
    batch_number.rsplit('-').next()?.parse().ok()
}
