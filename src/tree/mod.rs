//! Client-side category tree.
//!
//! `store` keeps the flat records and derives the navigation tree, `search` prunes
//! that tree by title, `client` is the remote category API and `session` runs remote
//! calls and local updates together.

mod client;
mod search;
mod session;
mod store;

pub use client::*;
pub use search::*;
pub use session::*;
pub use store::*;
