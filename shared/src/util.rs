use chrono::{DateTime, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Generate a local order id.
///
/// Layout: `ORD-<unix millis>-<4 hex digits>`. The timestamp keeps ids
/// roughly sortable by creation time, the random suffix keeps two orders
/// placed within the same millisecond apart.
pub fn local_order_id() -> String {
    use rand::Rng;
    let suffix: u16 = rand::thread_rng().gen_range(0..=0xFFFF);
    format!("ORD-{}-{:04X}", now_millis(), suffix)
}

/// Generate an id for profile sub-records (addresses)
pub fn record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trimmed, case-insensitive comparison (city names, emails)
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
