use std::time::Duration;

/// Errors from the third-party API layer.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Shopify answered 200 with a GraphQL `errors` array.
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// The service asked us to slow down.
    #[error("{service} rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        service: &'static str,
        retry_after_secs: Option<u64>,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// No credentials were configured for the service.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl IntegrationError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => err.is_timeout() || err.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            Self::GraphQl(_) | Self::Decode { .. } | Self::NotConfigured(_) => false,
        }
    }

    /// Server-requested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Turn a non-2xx response into an error, mapping 429 to
/// [`IntegrationError::RateLimited`] with its `Retry-After` header.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return Err(IntegrationError::RateLimited {
            service,
            retry_after_secs,
        });
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(IntegrationError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}

/// `Retry-After` in delta-seconds form; Shopify sends fractional values
/// such as `"2.0"`, which are rounded up.
pub(crate) fn parse_retry_after(value: &str) -> Option<u64> {
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| secs.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_parsing() {
        assert_eq!(parse_retry_after("2"), Some(2));
        assert_eq!(parse_retry_after("2.0"), Some(2));
        assert_eq!(parse_retry_after("0.4"), Some(1));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }

    #[test]
    fn retryability() {
        let server = IntegrationError::Api {
            service: "Shopify",
            status: 503,
            body: String::new(),
        };
        let client = IntegrationError::Api {
            service: "Shopify",
            status: 401,
            body: String::new(),
        };
        let limited = IntegrationError::RateLimited {
            service: "Shopify",
            retry_after_secs: Some(3),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert!(!IntegrationError::GraphQl("bad field".into()).is_retryable());
    }
}
