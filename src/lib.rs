#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod asynch;
pub mod command;
pub mod config;
pub mod error;
pub mod hex;
mod module_timing;
pub mod pdu;
pub mod response;

#[cfg(test)]
mod test_helpers;

pub use asynch::{control::Control, Resources};
pub use error::Error;
