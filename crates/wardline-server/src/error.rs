use thiserror::Error;
use wardline_contracts::Language;
use wardline_kernel::render::{terminal, Reply};
use wardline_kernel::text::Text;
use wardline_kernel::validate::Rejection;

/// Which abuse limiter refused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Phone,
    Session,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("store backend failed: {0}")]
    Backend(String),
    #[error("store call timed out")]
    Timeout,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(inner, message)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateKey(message.unwrap_or_else(|| inner.to_string()))
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("rate limited by {0:?} limiter")]
    RateLimited(Throttle),
    #[error("national id already registered to another phone")]
    DuplicateKey,
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("draft failed validation: {0:?}")]
    Validation(Rejection),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(_) => EngineError::DuplicateKey,
            other => EngineError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl EngineError {
    /// Terminal reply shown to the caller. Internal detail never reaches the handset.
    pub fn reply(&self, language: Language) -> Reply {
        let key = match self {
            EngineError::MalformedRequest(_) => Text::InvalidRequest,
            EngineError::RateLimited(Throttle::Phone) => Text::TooManyRequests,
            EngineError::RateLimited(Throttle::Session) => Text::SessionLimit,
            EngineError::DuplicateKey => Text::DuplicateNationalId,
            EngineError::ServiceUnavailable(_) => Text::ServiceUnavailable,
            EngineError::Validation(Rejection(key)) => *key,
        };
        terminal(language, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_hide_detail_from_caller() {
        let err = EngineError::from(StoreError::Backend("disk I/O error".to_string()));
        let reply = err.reply(Language::En);
        assert!(reply.is_end());
        assert!(!reply.text.contains("disk"));
    }

    #[test]
    fn duplicate_key_maps_to_duplicate_id_message() {
        let err = EngineError::from(StoreError::DuplicateKey("national_id".to_string()));
        assert!(matches!(err, EngineError::DuplicateKey));
        assert_eq!(
            err.reply(Language::En).text,
            "This National ID is already registered to another phone."
        );
    }

    #[test]
    fn throttles_have_distinct_messages() {
        let phone = EngineError::RateLimited(Throttle::Phone).reply(Language::En);
        let session = EngineError::RateLimited(Throttle::Session).reply(Language::En);
        assert_eq!(phone.body(), "END Too many requests. Please try again later.");
        assert_eq!(
            session.body(),
            "END Session limit reached. Please start a new session."
        );
    }
}
