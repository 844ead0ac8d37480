pub mod event;
pub mod release;
pub mod release_note;
pub mod task;
pub mod task_service;

pub use event::{Event, EventType};
pub use release::Release;
pub use release_note::ReleaseNote;
pub use task::Task;
pub use task_service::{HealthStatus, TaskService};
