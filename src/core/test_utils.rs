//! Test utilities for arena-based testing.
//!
//! Each test gets its own bounded arena, the same way a compiler embedding
//! the pass hands one arena to each compilation session.
