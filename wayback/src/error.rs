/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the wayback client and parsers.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("executing request to {url}: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("request to {url} received non-2xx response status-code={status}")]
    HttpStatus { url: String, status: u16 },

    #[error("decoding JSON response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("missing 'Content-Location' header")]
    MissingLocation,

    #[error("memento parse failed on line {line}: {raw}")]
    Parse { line: usize, raw: String },
}

impl Error {
    /// Attach a 1-based input line number to a parse error.
    pub(crate) fn at_line(self, line: usize) -> Error {
        match self {
            Error::Parse { raw, .. } => Error::Parse { line, raw },
            other => other,
        }
    }
}
