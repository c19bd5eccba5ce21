//! Content records, their listing criteria and the bulk action model.
//!
//! Wire names are camelCase to match the admin client.

mod action;
mod blog;
mod category;
mod error_log;
mod tag;

pub use action::*;
pub use blog::*;
pub use category::*;
pub use error_log::*;
pub use tag::*;
