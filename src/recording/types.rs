// Core types for the recording subsystem

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Error types for recording operations
#[derive(Debug)]
pub enum RecordingError {
    /// Capture backend failure (start, stop or pull)
    Capture(String),

    /// The capture process did not exit within the grace period and was
    /// forcibly killed; the recording for this device is unusable
    Timeout(String),

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for RecordingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingError::Capture(msg) => write!(f, "Capture error: {}", msg),
            RecordingError::Timeout(device) => {
                write!(f, "Capture process for '{}' killed after grace period", device)
            }
            RecordingError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for RecordingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordingError::Capture(_) => None,
            RecordingError::Timeout(_) => None,
            RecordingError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RecordingError {
    fn from(err: std::io::Error) -> Self {
        RecordingError::Io(err)
    }
}
