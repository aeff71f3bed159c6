//! Canned log messages.

/// A WARN message, and whether it reports a slow response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WarnEntry {
    /// Log line text.
    pub(crate) message: &'static str,
    /// Whether latency figures accompany it.
    pub(crate) with_latency: bool,
}

/// An ERROR message with its error code, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ErrorEntry {
    /// Log line text.
    pub(crate) message: &'static str,
    /// Machine-readable code and human detail.
    pub(crate) details: Option<(&'static str, &'static str)>,
}

const INFO: &[&str] = &[
    "Request processed successfully",
    "User session started",
    "Cache refreshed",
    "Health check passed",
    "Configuration reloaded",
    "Background job completed",
    "Connection pool resized",
];

const WARN: &[WarnEntry] = &[
    WarnEntry {
        message: "High response time detected",
        with_latency: true,
    },
    WarnEntry {
        message: "Slow database query",
        with_latency: true,
    },
    WarnEntry {
        message: "Upstream call exceeded latency budget",
        with_latency: true,
    },
    WarnEntry {
        message: "Memory usage above 80%",
        with_latency: false,
    },
    WarnEntry {
        message: "Retrying failed upstream request",
        with_latency: false,
    },
];

const ERROR: &[ErrorEntry] = &[
    ErrorEntry {
        message: "Database connection failed",
        details: Some(("DB_CONN_ERR", "Connection refused by database host")),
    },
    ErrorEntry {
        message: "Payment gateway timeout",
        details: Some(("GATEWAY_TIMEOUT", "No response from gateway within 30s")),
    },
    ErrorEntry {
        message: "Inventory lookup failed",
        details: Some(("INV_404", "Item not found in stock ledger")),
    },
    ErrorEntry {
        message: "Authentication service unreachable",
        details: Some(("AUTH_UNAVAILABLE", "DNS resolution failed for auth backend")),
    },
    ErrorEntry {
        message: "Unhandled exception in request handler",
        details: None,
    },
];

pub(crate) fn info(rng: &mut fastrand::Rng) -> &'static str {
    INFO[rng.usize(..INFO.len())]
}

pub(crate) fn warn(rng: &mut fastrand::Rng) -> WarnEntry {
    WARN[rng.usize(..WARN.len())]
}

pub(crate) fn error(rng: &mut fastrand::Rng) -> ErrorEntry {
    ERROR[rng.usize(..ERROR.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_optional_field_cases() {
        assert!(WARN.iter().any(|w| w.with_latency));
        assert!(WARN.iter().any(|w| !w.with_latency));
        assert!(ERROR.iter().any(|e| e.details.is_some()));
        assert!(ERROR.iter().any(|e| e.details.is_none()));
    }

    #[test]
    fn picks_stay_in_catalog() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..100 {
            assert!(INFO.contains(&info(&mut rng)));
            assert!(WARN.contains(&warn(&mut rng)));
            assert!(ERROR.contains(&error(&mut rng)));
        }
    }
}
