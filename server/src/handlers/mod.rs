//! Request handling logic, kept apart from the axum plumbing in `routes`.

mod users;

pub use users::*;
