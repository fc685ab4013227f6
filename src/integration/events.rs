use crate::messages::TranscriptEntry;
use crate::speech::PitchFrame;
use std::path::PathBuf;

/// Commands issued by the control surface
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Begin the call (no-op while one is running)
    Start,

    /// End the call (no-op while idle)
    Stop,

    /// Typed user reply, bypassing speech input
    SendText(String),

    /// Empty the transcript without ending the call
    ClearLog,

    /// Stop and wipe all progress
    Reset,

    /// Output volume, clamped to 0.0..=1.0
    SetVolume(f32),

    /// Write the transcript to a file
    Export(PathBuf),

    /// Stop everything and exit the control loop
    Shutdown,
}

/// Notifications delivered to the control surface
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// A line was appended to the transcript
    HistoryEntry(TranscriptEntry),

    /// The transcript was emptied
    HistoryCleared,

    /// Human-readable progress message
    Status(String),

    /// Bar data for the voice meter, sent before each bot utterance
    Visualize(PitchFrame),

    /// The conversation became active or inactive
    ConversationStateChanged(bool),

    /// A failure the user should see
    Error(String),
}

impl ControlEvent {
    pub fn status(message: impl Into<String>) -> Self {
        ControlEvent::Status(message.into())
    }
}
