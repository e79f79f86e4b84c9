//! Data models for configuration, spans and processed postings.

pub mod config;
pub mod embedded;
pub mod entity;
pub mod result;
