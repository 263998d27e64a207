//! Step definitions for liveness behaviour scenarios.

mod given;
