use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("State channel disconnected: {state}")]
    Disconnected { state: &'static str },
}

impl Error {
    pub fn disconnected(state: &'static str) -> Self {
        Self::Disconnected { state }
    }
}
