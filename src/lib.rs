//! Resume intake: a guided interview that builds a structured resume.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod llm;
pub mod render;
pub mod session;
pub mod store;
