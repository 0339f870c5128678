//! Line-oriented REPL over the `rabbithole` branching conversation engine.
//!
//! ## Provider bootstrap
//!
//! The completion provider is picked from the environment:
//!
//! - `RABBITHOLE_PROVIDER=mock` (the default) answers locally with a stub reply
//! - `RABBITHOLE_PROVIDER=http` posts `{history, prompt}` to `RABBITHOLE_CHAT_URL`
//!   and expects `{header, message}` back
//!
//! ## Persistence
//!
//! State is hydrated from `RABBITHOLE_STATE_PATH` (default
//! `.rabbithole/state.json` under the working directory) and written back
//! once edits have been quiet for `RABBITHOLE_PERSIST_DEBOUNCE_MS`, even while
//! the prompt sits idle, and again on exit. Provider calls run on worker
//! threads; their replies land on the node that asked, even if another
//! session is active by then.

pub mod app;
pub mod commands;
pub mod controller;
pub mod providers;
pub mod render;
pub mod repl;
