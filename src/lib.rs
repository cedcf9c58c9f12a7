#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Bearer-token authentication (issue, verify, admit) and the task lifecycle"]
#![doc = "(create, list, update, soft delete) over interchangeable storage backends,"]
#![doc = "plus the actix-web routes that expose them. `main.rs` wires these to a"]
#![doc = "PostgreSQL pool and serves them."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod store;

pub use crate::error::AppError;
pub use crate::services::{TaskService, TokenIssuer};
