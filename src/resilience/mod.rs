//! Resilience helpers.
//!
//! The reload pipeline retries reads of a file that another process may be
//! halfway through writing. Attempts are bounded by count, not wall-clock,
//! and spaced by [`backoff::calculate_backoff`].

pub mod backoff;
