//! Authentication primitives.
//!
//! - [`jwt`] -- validation of the HS256 bearer tokens issued by the auth
//!   provider (the Supabase JWT secret), plus a signer for tooling and tests.

pub mod jwt;
