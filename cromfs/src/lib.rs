#![no_std]

#[macro_use]
extern crate alloc;

mod byte_serializable;
mod cromix_error;
mod diagnostic;
mod disk;
mod manager;
mod utils;

pub use byte_serializable::ByteSerializable;
pub use cromix_error::{CromixError, CromixErrorConvertible};
pub use diagnostic::Diagnostic;
pub use disk::*;
pub use manager::{AppendPolicy, OSManager};
