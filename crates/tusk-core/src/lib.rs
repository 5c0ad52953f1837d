pub mod error;
pub mod task;
pub mod user;

pub use error::CoreError;
pub use task::{Status, StatusCount, Task, TaskWithUser};
pub use user::{EmployeeSummary, Role, User};
