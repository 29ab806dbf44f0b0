use chrono::{DateTime, Local, Utc};

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub fn format_local(at: &DateTime<Utc>, pattern: &str) -> String {
    at.with_timezone(&Local).format(pattern).to_string()
}
