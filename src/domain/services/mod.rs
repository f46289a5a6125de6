//! # Domain Services
//!
//! Domain services encapsulate business rules that don't naturally belong to a
//! single entity.
//!
//! ## Services
//!
//! - **AccessPolicy**: participation, authorship and channel-admin checks

mod access_policy;

pub use access_policy::*;
