//! Challenge service client for Scriptorium
//!
//! Some manuscripts are not opened with the previous key directly. Instead the
//! key is sent to a remote service which answers with a challenge:
//!
//! ```json
//! { "success": true, "challenge": { "vault": ["A", "B", "C", "D"], "targets": [3, 0, 2] } }
//! ```
//!
//! The derived code is the concatenation of `vault[t]` for every `t` in
//! `targets`, here `"DAC"`.

#![warn(unreachable_pub)]

pub mod client;
pub mod transform;

pub use client::{ChallengeConfig, ChallengeResolver, DEFAULT_TIMEOUT_MS};
pub use transform::derive_key;
