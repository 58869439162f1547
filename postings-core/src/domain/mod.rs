use chrono::{DateTime, SubsecRound, Utc};

pub mod category;
pub mod error;
pub mod listing;
pub mod posting;
pub mod user;

/// Current time at the precision Postgres stores.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
