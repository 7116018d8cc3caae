//! Unproxied Commands
//!
//! Commands a Twemproxy pool cannot serve, implemented on top of the
//! `Dispatcher`.
//!
//! - **`blpop`**: blocking pop on one list. Uses discovery; the owning shard is
//!   the one that hands back an element.
//! - **`bgsave`**: background save on every shard, one at a time, so large
//!   instances do not all fork at once. Bypasses routing entirely.

pub mod bgsave;
pub mod blpop;

#[cfg(test)]
mod tests;
