//! Utility functions for the application

pub mod json;
pub mod sql;
