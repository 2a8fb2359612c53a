//! Use-case services for character creation and review.
//!
//! # Responsibility
//! - Drive the step-by-step creation session.
//! - Provide read-side access to saved characters.

pub mod roster_service;
pub mod wizard;
