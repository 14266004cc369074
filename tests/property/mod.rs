//! Property-based tests
