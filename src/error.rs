use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallbotError {
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    IO(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Conversation worker failed: {0}")]
    Worker(String),
}

impl From<std::io::Error> for CallbotError {
    fn from(e: std::io::Error) -> Self {
        CallbotError::IO(e.to_string())
    }
}

impl From<toml::de::Error> for CallbotError {
    fn from(e: toml::de::Error) -> Self {
        CallbotError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CallbotError {
    fn from(e: serde_json::Error) -> Self {
        CallbotError::Export(e.to_string())
    }
}

impl CallbotError {
    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CallbotError::Synthesis(_) => {
                "Speech playback failed. The conversation has been stopped.".to_string()
            }
            CallbotError::EngineUnavailable(_) => {
                "Speech engine is not available. Please verify the voice model files.".to_string()
            }
            CallbotError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            CallbotError::AudioProcessing(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            CallbotError::Config(_) => "Configuration error. Please check settings.".to_string(),
            CallbotError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CallbotError::IO(_) => "File system error occurred.".to_string(),
            CallbotError::Export(_) => "Could not export the conversation log.".to_string(),
            CallbotError::Worker(_) => {
                "The conversation stopped unexpectedly. Please start it again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CallbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_fatal_synthesis() {
        let err = CallbotError::Synthesis("device lost".into());
        assert!(err.user_message().contains("stopped"));
    }

    #[test]
    fn test_io_conversion() {
        let err: CallbotError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, CallbotError::IO(ref msg) if msg.contains("missing")));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = CallbotError::Config("empty script".into());
        assert_eq!(err.to_string(), "Configuration error: empty script");
    }
}
