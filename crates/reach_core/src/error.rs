use thiserror::Error;

#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("{binding} is not assigned")]
    MissingBinding { binding: &'static str },

    #[error("Invalid binding for {binding}: {reason}")]
    InvalidBinding { binding: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State {0} is not registered")]
    UnknownState(String),

    #[error("State {0} registered twice")]
    DuplicateState(String),

    #[error("Invalid frame delta: {0}")]
    InvalidDeltaTime(f32),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

impl InteractionError {
    /// Construction-time problems; the host must fix its setup, nothing can run.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            InteractionError::MissingBinding { .. }
                | InteractionError::InvalidBinding { .. }
                | InteractionError::InvalidConfig(_)
                | InteractionError::ConfigParse(_)
        )
    }

    /// Errors that indicate a broken state registry rather than bad input.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, InteractionError::UnknownState(_) | InteractionError::DuplicateState(_))
    }
}

impl From<serde_json::Error> for InteractionError {
    fn from(err: serde_json::Error) -> Self {
        InteractionError::ConfigParse(err.to_string())
    }
}

impl From<serde_yaml::Error> for InteractionError {
    fn from(err: serde_yaml::Error) -> Self {
        InteractionError::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InteractionError>;
