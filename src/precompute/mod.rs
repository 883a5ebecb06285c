//! Background precomputation of task inputs.

pub mod scheduler;
pub mod types;


pub use scheduler::PrecomputeScheduler;
pub use types::{PrecomputeMode, PrecomputeSnapshot, PrecomputeStatus, Recipient, SchedulerStats};
