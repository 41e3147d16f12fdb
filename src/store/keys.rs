pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn username_index_key(username: &str) -> String {
    format!("username:{}", username)
}

/// Zero-padded so that lexicographic key order equals numeric id order.
pub fn question_key(question_id: u64) -> String {
    format!("{:020}", question_id)
}

pub fn attempt_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", user_id, reverse_ts, attempt_id)
}

pub fn attempt_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}
