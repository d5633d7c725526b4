use thiserror::Error;

/// Errors that can occur when querying the catalog API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  /// The server answered with a non-success status.
  #[error("request failed with status {status}")]
  Status { status: u16 },

  /// The request never produced a response.
  #[error("request failed: {0}")]
  Transport(String),

  /// The response body was not a product listing.
  #[error("unexpected response body: {0}")]
  Decode(String),

  /// The endpoint URL could not be built from the configured base.
  #[error("invalid catalog URL: {0}")]
  Url(String),
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    if let Some(status) = e.status() {
      FetchError::Status {
        status: status.as_u16(),
      }
    } else if e.is_decode() {
      FetchError::Decode(e.to_string())
    } else {
      FetchError::Transport(e.to_string())
    }
  }
}

impl From<url::ParseError> for FetchError {
  fn from(e: url::ParseError) -> Self {
    FetchError::Url(e.to_string())
  }
}
