//! CORS.

/// Sent on every response.
pub const CORS_HEADERS: [&str; 3] = [
    "Access-Control-Allow-Origin: *",
    "Access-Control-Allow-Headers: Origin, X-Requested-With, Content-Type, Accept, Authorization, X-Trace-ID",
    "Access-Control-Allow-Methods: *",
];

/// `OPTIONS` requests are answered with `204` before routing.
pub fn is_preflight(method: &str) -> bool {
    method.eq_ignore_ascii_case("OPTIONS")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_detection() {
        assert!(is_preflight("OPTIONS"));
        assert!(is_preflight("options"));
        assert!(!is_preflight("GET"));
    }

    #[test]
    fn test_cors_allows_any_origin() {
        assert!(CORS_HEADERS.iter().any(|h| *h == "Access-Control-Allow-Origin: *"));
    }
}
