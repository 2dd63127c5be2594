//! Core domain types, errors, and constants for `listwise`.
//!
//! This crate establishes the vocabulary shared by every other crate in the
//! workspace: the request parameters of a list query, the envelope a backend
//! answers with, and the error taxonomy that flows through the read path.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   including the structured `HttpError` a data provider fails with.
//! - **`types`**: Pagination, CRUD filter/sort descriptors, meta, the list
//!   envelope, notification parameters, and live event types.
//! - **`constants`**: Shared defaults such as the default page size and the
//!   literal action tag used in cache keys.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, HttpError, Result},
    types::*,
};
