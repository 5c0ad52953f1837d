mod local;
mod password;
mod traits;

pub use local::LocalService;
pub use password::{hash_password, verify_password};
pub use traits::{ServiceError, TaskService, Upload, UserService};

/// Password given to accounts created through registration and to the
/// bootstrap owner.
pub const DEFAULT_PASSWORD: &str = "123456";

pub const OWNER_NAME: &str = "Owner";
pub const OWNER_EMAIL: &str = "owner@go.id";

pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
