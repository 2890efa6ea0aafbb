//! Article staleness rule.

use chrono::NaiveDate;

use crate::ExpirationPolicy;

/// Returns `true` if an article last changed on `last_modified` is outdated
/// as of `today`.
///
/// An article is outdated on and after the cutoff date: with a 3-month policy
/// and `today = 2024-06-15`, anything last changed on `2024-03-15` or earlier
/// is outdated. Comparison is at day granularity.
pub fn is_outdated(last_modified: NaiveDate, policy: ExpirationPolicy, today: NaiveDate) -> bool {
    last_modified <= policy.cutoff(today)
}
