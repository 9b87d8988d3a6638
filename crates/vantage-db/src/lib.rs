//! Database repositories for the video access gateway.
//!
//! The gateway owns a single table: clip metadata. Everything else it talks
//! to (session cache, edge broker, streaming provider) lives behind other
//! collaborators.

pub mod clip_repository;

pub use clip_repository::ClipRepository;
