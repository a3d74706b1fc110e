use ::std::{fmt::Display, string::FromUtf8Error, time::Duration};

use ::serde::Deserialize;

use crate::resource::{ObservedState, StateSet};

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Error body returned by the Atlas API on every non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteApiError {
    /// HTTP status code. The body repeats it in the `error` field.
    #[serde(rename = "error")]
    pub status: u16,
    pub detail: String,
    pub reason: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
}

impl Display for RemoteApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MongoDB Atlas: {} {}", self.status, self.detail)?;
        if !self.error_code.is_empty() {
            write!(f, " ({})", self.error_code)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum ProviderError {
    IllegalArgument(String),
    DeserializeError(String),
    IOError(String),
    FailToLoadConfig(String),
    /// The request never produced an HTTP response.
    TransportError(String),
    RemoteApi(RemoteApiError),
    NotFound(String),
    UnexpectedState {
        resource: String,
        state: ObservedState,
        expected: StateSet,
    },
    Timeout {
        resource: String,
        timeout: Duration,
        last_state: Option<ObservedState>,
    },
    ObservationFailed {
        resource: String,
        source: Box<ProviderError>,
    },
    Operation {
        operation: &'static str,
        resource: String,
        source: Box<ProviderError>,
    },
    Other(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalArgument(msg) => write!(f, "Illegal Argument error: {}", msg),
            Self::DeserializeError(msg) => write!(f, "Deserialize error: {}", msg),
            Self::IOError(msg) => write!(f, "IO error: {}", msg),
            Self::FailToLoadConfig(msg) => write!(f, "Failed to load config: {}", msg),
            Self::TransportError(msg) => write!(f, "Transport error: {}", msg),
            Self::RemoteApi(err) => write!(f, "Remote API error: {}", err),
            Self::NotFound(what) => write!(f, "Not found error: {} not found.", what),
            Self::UnexpectedState {
                resource,
                state,
                expected,
            } => write!(
                f,
                "Unexpected state error: {} reached state {:?}, expected one of {}",
                resource, state.as_str(), expected
            ),
            Self::Timeout {
                resource,
                timeout,
                last_state: Some(state),
            } => write!(
                f,
                "Timeout error: {} did not converge within {:?}, last observed state {:?}",
                resource,
                timeout,
                state.as_str()
            ),
            Self::Timeout {
                resource,
                timeout,
                last_state: None,
            } => write!(
                f,
                "Timeout error: {} did not converge within {:?}, no state observed",
                resource, timeout
            ),
            Self::ObservationFailed { resource, source } => {
                write!(f, "Failed to observe {}: {}", resource, source)
            }
            Self::Operation {
                operation,
                resource,
                source,
            } => write!(f, "Failed to {} {}: {}", operation, resource, source),
            Self::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl ::std::error::Error for ProviderError {}

impl ProviderError {
    pub fn illegal_argument<E: Display>(e: E) -> Self {
        Self::IllegalArgument(e.to_string())
    }

    pub fn fail_to_load_config<E: Display>(e: E) -> Self {
        Self::FailToLoadConfig(e.to_string())
    }

    pub fn transport<E: Display>(e: E) -> Self {
        Self::TransportError(e.to_string())
    }

    pub fn not_found<E: Display>(what: E) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Attach the failed operation and the resource it targeted.
    pub fn operation(operation: &'static str, resource: impl Display, source: Self) -> Self {
        Self::Operation {
            operation,
            resource: resource.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost error, with every context wrapper removed.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::ObservationFailed { source, .. } | Self::Operation { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Whether a retry of the same call may succeed:
    /// connection failures, throttling and server side errors.
    pub fn is_transient(&self) -> bool {
        match self.root_cause() {
            Self::TransportError(_) => true,
            Self::RemoteApi(err) => err.status == 429 || err.status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self.root_cause() {
            Self::NotFound(_) => true,
            Self::RemoteApi(err) => err.status == 404,
            _ => false,
        }
    }
}

impl<T> From<ProviderError> for Result<T> {
    fn from(val: ProviderError) -> Self {
        Result::Err(val)
    }
}

impl From<RemoteApiError> for ProviderError {
    fn from(value: RemoteApiError) -> Self {
        Self::RemoteApi(value)
    }
}

macro_rules! convert_to_provider_error {
    ($err_ty: ty, $constructor: expr) => {
        impl From<$err_ty> for ProviderError {
            fn from(value: $err_ty) -> Self {
                $constructor(value.to_string())
            }
        }
    };
}

convert_to_provider_error!(std::io::Error, ProviderError::IOError);
convert_to_provider_error!(anyhow::Error, ProviderError::Other);
convert_to_provider_error!(FromUtf8Error, ProviderError::Other);
convert_to_provider_error!(String, ProviderError::Other);
convert_to_provider_error!(serde_json::Error, ProviderError::DeserializeError);
