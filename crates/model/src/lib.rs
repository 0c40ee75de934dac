//! A provider-agnostic chat model abstraction.
//!
//! This crate establishes a unified protocol for talking to the various
//! supported LLM providers, so that callers can switch between them
//! without touching their own code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the provider crates should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
