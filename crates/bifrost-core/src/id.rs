/// Message ID format: `msg_<ulid>`
pub fn message_id() -> String {
    format!("msg_{}", ulid::Ulid::new())
}

/// Session ID format: `ses_<ulid>`
pub fn session_id() -> String {
    format!("ses_{}", ulid::Ulid::new())
}

/// Current UTC time as an RFC3339 string.
pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .expect("RFC3339 formatting should not fail")
}
