pub mod progress;
pub mod selector;

pub use progress::Progress;
pub use selector::{
    checkpoint_cursor, partition_outcomes, resume_offset, select_failed, RunMode, RunPlan,
    RunSelector,
};
