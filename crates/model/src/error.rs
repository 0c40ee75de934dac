use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider rejected the credentials.
    Authentication,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider answered with something we can't understand.
    InvalidResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Authentication => write!(f, "Authentication failed"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::InvalidResponse => write!(f, "Invalid response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}

impl ErrorKind {
    /// Maps an HTTP status code to the closest error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Authentication,
            429 => ErrorKind::RateLimitExceeded,
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimitExceeded);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Other);
    }
}
