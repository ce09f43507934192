/// All possible gridmail library errors.
///
/// Transport and provider failures are deliberately absent: the dispatch
/// client normalizes those into a `sendgrid::Response`, so only
/// malformed-input conditions surface as errors.
#[derive(Clone, Debug)]
pub enum Error {
    InvalidArgument(String),
    Io(String),
    Json(String),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::InvalidArgument(ref msg) => write!(f, "InvalidArgument: {}", msg),
            Error::Io(ref msg) => write!(f, "Io: {}", msg),
            Error::Json(ref msg) => write!(f, "Json: {}", msg),
            Error::Config(ref msg) => write!(f, "Config: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::error::Error> for Error {
    fn from(err: serde_json::error::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
