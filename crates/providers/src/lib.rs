//! LLM provider implementations for Baton.
//!
//! All providers implement the `baton_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
