//! Core types for autopojo.
//!
//! Provides the source declaration model ([`model::Declaration`]), the type
//! expression tree ([`types::TypeReference`]) and its parser, the read-only
//! [`repository::DeclarationRepository`], generator configuration, and the
//! JSON declaration manifest.

pub mod config;
pub mod model;
pub mod repository;
pub mod schema;
pub mod types;
