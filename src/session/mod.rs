//! Named render sessions.
//!
//! A session is a server-held [`RenderState`](crate::simulator::RenderState)
//! so that callers rendering the same template repeatedly (an HTTP client, a
//! test harness) get coherent auto-increment and accumulator sequences.
//! Sessions are independent of each other, and renders within one session
//! are serialized.
//!
//! # Example
//!
//! ```ignore
//! let store = SessionStore::new(16);
//! let session = store.create()?;
//!
//! let first = store.render(&session.id, "[自增ID n 1 1]").await?;  // "1"
//! let second = store.render(&session.id, "[自增ID n 1 1]").await?; // "2"
//! ```

mod store;
mod types;

pub use store::SessionStore;
pub use types::{SessionError, SessionInfo, SessionResult, SessionSnapshot};
