/// Client error type
///
/// Failed API calls keep the server's status, error code and per-field
/// details so callers can branch on them.

use serde::Deserialize;

/// One field-level validation message from the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error body returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Vec<FieldError>>,
}

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or undecodable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Vec<FieldError>,
    },

    /// The call needs a token and none is set
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A board move referenced an index outside the list
    #[error("Cannot move item {from} to {to} in a list of {len}")]
    OutOfRange { from: usize, to: usize, len: usize },

    /// A page offset does not fit into a position
    #[error("Page offset {0} does not fit into a position")]
    PositionOverflow(i64),
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Validation messages for `field`
    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let details: &[FieldError] = match self {
            ClientError::Api { details, .. } => details,
            _ => &[],
        };
        details
            .iter()
            .filter(move |d| d.field == field)
            .map(|d| d.message.as_str())
    }

    pub(crate) fn from_body(status: u16, raw: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) => ClientError::Api {
                status,
                code: body.error,
                message: body.message,
                details: body.details.unwrap_or_default(),
            },
            Err(_) => ClientError::Api {
                status,
                code: "unknown".to_string(),
                message: raw.trim().to_string(),
                details: Vec::new(),
            },
        }
    }
}
