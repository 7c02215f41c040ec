use thiserror::Error;

#[derive(Error, Debug)]
pub enum DroneNetError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed datagram: {0}")]
    Protocol(String),

    #[error("unknown zone: {0}")]
    UnknownZone(u32),

    #[error("unknown drone: {0}")]
    UnknownDrone(u32),

    #[error("socket bind failure: {0}")]
    BindFailure(String),

    #[error("unknown error: {0}")]
    Other(#[from] anyhow::Error),
}
