// ============================================
// Presence Formatting
// ============================================
//
// Turns a "last seen" instant into the status shown next to a user in chat
// headers and member lists:
//   <= 2 min   -> Online
//   < 1 hour   -> Active 5m ago
//   < 1 day    -> Active 3h ago
//   otherwise  -> Last seen Mar 4
//   unknown    -> Offline

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

const ONLINE_WINDOW_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum OnlineStatus {
    Online,
    ActiveMinutesAgo(i64),
    ActiveHoursAgo(i64),
    LastSeenOn(NaiveDate),
    Offline,
}

impl OnlineStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, OnlineStatus::Online)
    }
}

pub fn online_status(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> OnlineStatus {
    let Some(last_seen) = last_seen else {
        return OnlineStatus::Offline;
    };

    // clock skew puts last_seen in the future
    let elapsed = (now - last_seen).num_seconds().max(0);

    if elapsed <= ONLINE_WINDOW_SECS {
        OnlineStatus::Online
    } else if elapsed < 3600 {
        OnlineStatus::ActiveMinutesAgo(elapsed / 60)
    } else if elapsed < 86_400 {
        OnlineStatus::ActiveHoursAgo(elapsed / 3600)
    } else {
        OnlineStatus::LastSeenOn(last_seen.date_naive())
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnlineStatus::Online => write!(f, "Online"),
            OnlineStatus::ActiveMinutesAgo(m) => write!(f, "Active {}m ago", m),
            OnlineStatus::ActiveHoursAgo(h) => write!(f, "Active {}h ago", h),
            OnlineStatus::LastSeenOn(date) => {
                write!(f, "Last seen {} {}", date.format("%b"), date.day())
            }
            OnlineStatus::Offline => write!(f, "Offline"),
        }
    }
}
