//! Intent contracts and their validation.
//!
//! A contract is the declarative document a service publishes to describe
//! which intents it handles and how it can be reached. The module follows
//! the same split as the rest of the crate:
//!
//! - Document and value types in [`domain`]
//! - The pure, fail-fast contract validator in [`validation`]

pub mod domain;
pub mod validation;
