//! Defines the custom error types for the scanlens application.

use std::io;
use thiserror::Error;

/// The primary error type for classification and the surrounding scan flow.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// A payload matched the APK or URL rule but is not an absolute URL with a host.
    #[error("Malformed URL '{input}': {reason}")]
    MalformedUrl {
        /// The scanned text that failed to parse.
        input: String,
        /// Why host extraction failed.
        reason: String,
    },

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The download server answered with a non-success status.
    #[error("Download failed with status {status} for {url}")]
    DownloadStatus {
        /// HTTP status returned by the server.
        status: reqwest::StatusCode,
        /// The requested URL.
        url: String,
    },

    /// A download was requested for a result that is not an installable package.
    #[error("Scan result of type '{0}' is not an installable package")]
    NotInstallable(String),

    /// A scanned serial number is not present in the product catalog.
    #[error("Unknown product serial: {0}")]
    UnknownProduct(String),

    /// A cart operation referenced an item that is not in the cart.
    #[error("Product '{0}' is not in the cart")]
    NotInCart(String),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;
