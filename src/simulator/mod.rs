//! Payload template engine.
//!
//! This module provides:
//! - Bracket expression scanning (`[...]`) over free-form text
//! - Six expression resolvers tried in a fixed priority order
//! - A caller-owned [`RenderState`] that carries counters and running totals
//!   between renders
//!
//! | Expression | Result |
//! |------------|--------|
//! | `[当前时间戳-秒]` | Unix time in seconds |
//! | `[当前时间戳-毫秒]` | Unix time in milliseconds |
//! | `[随机数 -10-20]` | Random integer, inclusive |
//! | `[随机浮点数 0-1 3]` | Random float with 3 decimals (default 2) |
//! | `[日期格式 YYYY-MM-DD HH:mm:ss.SSS]` | Formatted local time |
//! | `[自增ID user 100 1]` | Per-key sequence starting at 100 |
//! | `[累计值 100 1-5]` | Running total growing by a random step |
//!
//! # Example
//!
//! ```
//! use mqtt_payload_simulator::simulator::{RenderState, TemplateEngine};
//!
//! let engine = TemplateEngine::new();
//! let mut state = RenderState::new();
//!
//! let first = engine.render(r#"{"seq": [自增ID order 100 1]}"#, &mut state);
//! let second = engine.render(r#"{"seq": [自增ID order 100 1]}"#, &mut state);
//!
//! assert_eq!(first, r#"{"seq": 100}"#);
//! assert_eq!(second, r#"{"seq": 101}"#);
//! ```

mod date_format;
mod engine;
mod resolvers;
mod state;

pub use date_format::format_datetime;
pub use engine::{render, tokenize, Clock, Segment, SystemClock, TemplateEngine};
pub use resolvers::{
    resolve_date_format, resolve_random_float, resolve_random_integer, resolve_timestamp,
    ExpressionKind, ResolveError, DEFAULT_FLOAT_PRECISION, MAX_FLOAT_PRECISION,
};
pub use state::{CounterState, RenderState};
