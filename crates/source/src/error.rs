use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The source guild could not be resolved. Fatal for the run: the
    /// extraction aborts with no partial output and no sink calls.
    #[error("source guild {guild_id} not found or not accessible")]
    Unavailable { guild_id: u64 },

    #[error("source api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
