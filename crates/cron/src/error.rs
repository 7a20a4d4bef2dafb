use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    CronParse(#[from] cron::error::Error),

    #[error(transparent)]
    Config(#[from] guildsync_config::Error),

    #[error("ambiguous or non-existent local datetime: {value}")]
    InvalidLocalTime { value: String },

    #[error("invalid interval: {0}")]
    InvalidInterval(String),
}

pub type Result<T> = std::result::Result<T, Error>;
