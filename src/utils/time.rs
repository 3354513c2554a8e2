//! Wall-clock helpers. All stored timestamps are whole Unix seconds.

use chrono::Utc;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}
