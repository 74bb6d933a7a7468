//! Generation pipeline stages.
//!
//! Each submodule implements exactly one step, leaves first:
//!
//! ```text
//! transport ──▶ client ──▶ chain ──▶ normalize
//! (1 request)   (retry)    (order)   (shape → artifact)
//!                             │
//!                             └─ exhausted ──▶ fallback
//! ```
//!
//! 1. [`transport`]: a single request to one provider; classifies the reply
//! 2. [`client`]: bounded retry with attempt-scaled backoff
//! 3. [`chain`]: per-task provider order, "any failure → next provider"
//! 4. [`normalize`]: per-(task, provider) parsing strategy table
//! 5. [`fallback`]: deterministic local synthesis when every provider failed
//!
//! The orchestration of these stages lives in [`crate::generate`].

pub mod chain;
pub mod client;
pub mod fallback;
pub mod normalize;
pub mod transport;
