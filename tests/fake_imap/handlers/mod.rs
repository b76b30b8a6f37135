//! IMAP command handlers for the fake server.
//!
//! Each handler lives in its own module and processes a single IMAP
//! command (AUTHENTICATE, CAPABILITY, LIST, LOGOUT, SELECT, FETCH).

mod authenticate;
mod fetch;

pub use authenticate::handle_authenticate;
pub use capability::handle_capability;
pub use fetch::handle_fetch;
pub use list::handle_list;
pub use logout::handle_logout;
pub use select::handle_select;
