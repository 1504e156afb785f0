//! Core types for the convergence engine.
//!
//! This module holds the error system shared by every component: the
//! strongly-typed [`ConvergeError`], the user-facing [`ErrorContext`]
//! wrapper, and the [`user_friendly_error`] conversion used at the CLI
//! boundary.

pub mod error;

pub use error::{ConvergeError, ErrorContext, user_friendly_error};
