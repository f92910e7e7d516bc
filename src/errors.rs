use thiserror::Error;

// --- Client/API Errors ---

/// Errors surfaced by the meme API client and everything layered on it.
///
/// `Clone` so a single pending author lookup can hand the same failure to
/// every task waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered 401. Credentials have already been cleared.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

// --- Binary Error ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("You must be logged in: run `meme-feed login` first")]
    SignedOut,

    #[error(transparent)]
    Api(ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            // The 401 redirect: the token is gone, send the user back to login.
            ApiError::Unauthorized => AppError::SignedOut,
            e => AppError::Api(e),
        }
    }
}

impl AppError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigError(_) => 78,
            AppError::SignedOut => 77,
            AppError::Api(ApiError::NotFound(_)) => 4,
            AppError::InvalidInput(_) | AppError::Api(ApiError::InvalidInput(_)) => 2,
            AppError::Api(_) | AppError::IoError(_) => 1,
        }
    }
}
