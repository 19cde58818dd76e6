//! Router Module Index
//!
//! Routes are grouped by the access they require, and access control is applied
//! per group with router layers so no endpoint can be mounted unprotected by accident.

/// Routes open to anyone: health probe and logout.
pub mod public;

/// Routes behind the session check. College-only handlers verify the role themselves.
pub mod authenticated;

/// Routes nested under `/api/admin`, restricted to the `admin` role.
pub mod admin;
