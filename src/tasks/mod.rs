//! Background tasks.

mod auto_publish;
mod manager;

pub use auto_publish::{
    AutoPublishError, AutoPublishJobInfo, AutoPublishRequest, AutoPublishTask, JobStatus,
};
pub use manager::AutoPublishManager;
