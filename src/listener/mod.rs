pub mod state;
pub mod types;

pub use state::ListenerState;
pub use types::{
    DeviceInfo, ListenerError, ListenerResult, RunContext, TestOutcome, TestStatus,
    parse_device_list,
};
