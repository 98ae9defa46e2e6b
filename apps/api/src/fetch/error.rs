use axum::http::StatusCode;
use thiserror::Error;

pub const NO_TEXT_WARNING: &str =
    "The page had little or no readable text. Paste the job description manually.";

/// Every way a JD-from-URL fetch can fail. Each kind maps to its own
/// caller-visible code so the UI can pick an actionable message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Only https URLs are supported")]
    UnsupportedScheme,

    #[error("Could not resolve the host")]
    DnsFailed,

    // Never say which address check fired.
    #[error("Unsupported or private address")]
    UnsupportedAddress,

    #[error("Redirect loop detected")]
    RedirectLoop,

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Redirect without a Location header")]
    RedirectNoLocation,

    // Same wording as the address policy; `kind()` still tells them apart.
    #[error("Unsupported or private address")]
    RedirectDowngraded,

    #[error("The page responded with status {status}")]
    FetchFailed { status: u16 },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("The page is larger than {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Timed out fetching the page")]
    Timeout,

    #[error("No job description text could be extracted from the page")]
    NoExtractableText,

    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Stable snake_case name used as the error code on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl => "invalid_url",
            FetchError::UnsupportedScheme => "unsupported_scheme",
            FetchError::DnsFailed => "dns_failed",
            FetchError::UnsupportedAddress => "unsupported_address",
            FetchError::RedirectLoop => "redirect_loop",
            FetchError::TooManyRedirects => "too_many_redirects",
            FetchError::RedirectNoLocation => "redirect_no_location",
            FetchError::RedirectDowngraded => "redirect_downgraded",
            FetchError::FetchFailed { .. } => "fetch_failed",
            FetchError::UnsupportedContentType(_) => "unsupported_content_type",
            FetchError::ResponseTooLarge { .. } => "response_too_large",
            FetchError::Timeout => "timeout",
            FetchError::NoExtractableText => "no_extractable_text",
            FetchError::Network(_) => "network",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::InvalidUrl
            | FetchError::UnsupportedScheme
            | FetchError::DnsFailed
            | FetchError::UnsupportedAddress
            | FetchError::RedirectLoop
            | FetchError::TooManyRedirects
            | FetchError::RedirectNoLocation
            | FetchError::RedirectDowngraded => StatusCode::BAD_REQUEST,
            FetchError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FetchError::ResponseTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FetchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FetchError::NoExtractableText => StatusCode::UNPROCESSABLE_ENTITY,
            FetchError::FetchFailed { .. } | FetchError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Hints shown next to the error; only the near-empty page has one.
    pub fn warnings(&self) -> Vec<String> {
        match self {
            FetchError::NoExtractableText => vec![NO_TEXT_WARNING.to_string()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(FetchError::UnsupportedScheme.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(FetchError::UnsupportedAddress.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(FetchError::RedirectLoop.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            FetchError::UnsupportedContentType("image/png".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            FetchError::ResponseTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(FetchError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(FetchError::NoExtractableText.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_private_address_message_is_generic() {
        assert_eq!(FetchError::UnsupportedAddress.to_string(), "Unsupported or private address");
        assert_eq!(FetchError::UnsupportedAddress.kind(), "unsupported_address");
    }

    #[test]
    fn test_downgrade_message_matches_address_policy() {
        assert_eq!(
            FetchError::RedirectDowngraded.to_string(),
            FetchError::UnsupportedAddress.to_string()
        );
        assert_eq!(FetchError::RedirectDowngraded.kind(), "redirect_downgraded");
    }

    #[test]
    fn test_only_empty_page_carries_warning() {
        assert_eq!(FetchError::NoExtractableText.warnings(), vec![NO_TEXT_WARNING.to_string()]);
        assert!(FetchError::Timeout.warnings().is_empty());
    }
}
