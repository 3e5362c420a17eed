//! The agent engine and the session orchestrator.
//!
//! An [`AgentEngine`] runs one agent's turn loop:
//!
//! 1. **Append** the user input (skipped when empty, e.g. after a handoff)
//! 2. **Build context**: system prompt + full history
//! 3. **Call the model** with the agent's tools plus one `transfer_to_<agent>` tool per permitted handoff
//! 4. **If tool calls**: run them in order, append results, loop back to step 2
//! 5. **If a handoff tool is called**: stop and return a [`HandoffRequest`]
//! 6. **If text only**: append it and finish
//!
//! A [`Session`] chains engine runs across handoffs, sharing one conversation
//! and one iteration budget.
//!
//! [`HandoffRequest`]: baton_core::agent::HandoffRequest

pub mod engine;
pub mod handoff;
pub mod session;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{AgentEngine, DEFAULT_MAX_ITERATIONS, RunOutcome};
pub use session::{Overrides, Reply, Session, apply_overrides, resolve_agent};
pub use stream_event::AgentStreamEvent;
