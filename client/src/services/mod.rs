//! Resource services.
//!
//! Each service method performs exactly one HTTP call and hands back the
//! parsed envelope unchanged. Failures are never caught here; they bubble up
//! to the store action that issued the call.

mod clicks;
mod users;

pub use clicks::*;
pub use users::*;
