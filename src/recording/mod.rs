pub mod backend;
pub mod coordinator;
pub mod types;

pub use backend::{AdbBackend, CaptureBackend, MockBackend};
pub use coordinator::{begin_session, end_session};
pub use types::{RecordingError, RecordingResult};
