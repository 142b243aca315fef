//! Core pipeline orchestration and domain logic for Remix Studio.
//!
//! This crate ties together deck extraction, suggestion generation, and
//! session storage into end-to-end workflows (e.g., `import_deck`,
//! `export_dataset`).

pub mod export;
pub mod pipeline;
pub mod preview;
pub mod session;
