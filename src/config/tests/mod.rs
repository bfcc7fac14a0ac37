//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `loading`: Environment and CLI loading through `load_from_iter`
//! - `operation_mode`: Operation mode determination tests
//! - `resolution`: Repository, contributor, and token resolution tests
//! - `settings`: Derived window, pagination, and cache settings tests

mod helpers;
mod resolution;
