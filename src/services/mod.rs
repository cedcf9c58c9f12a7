pub mod auth;
pub mod tasks;

pub use auth::{IssuedToken, TokenIssuer};
pub use tasks::{TaskError, TaskService, ValidationKind};
