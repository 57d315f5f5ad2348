use std::fmt;

#[derive(Debug)]
pub enum GatewayError {
    /// Upstream answered with a non-success status; the body is kept verbatim
    /// for diagnostics.
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Upstream could not be reached, or the connection died mid-response.
    Network(reqwest::Error),
    /// Upstream answered 2xx with a body that is not JSON.
    Decode { body: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Upstream { status, body } => {
                write!(f, "gateway returned HTTP {status}: {body}")
            }
            GatewayError::Network(err) => write!(f, "gateway unreachable: {err}"),
            GatewayError::Decode { body } => {
                write!(f, "gateway response is not valid JSON: {body}")
            }
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Network(err) => Some(err),
            _ => None,
        }
    }
}
