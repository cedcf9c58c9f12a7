pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskQuery, TaskStatus};
pub use user::{User, UserCredentials};
