use serde_json::Value;

#[inline]
pub fn extras_get_str<'a>(extras: Option<&'a Value>, key: &str) -> Option<&'a str> {
    extras.and_then(|e| e.get(key)).and_then(|v| v.as_str())
}

#[inline]
pub fn extras_get_u64(extras: Option<&Value>, key: &str) -> Option<u64> {
    extras.and_then(|e| e.get(key)).and_then(|v| {
        if let Some(n) = v.as_u64() {
            Some(n)
        } else if let Some(s) = v.as_str() {
            s.parse::<u64>().ok()
        } else {
            None
        }
    })
}
