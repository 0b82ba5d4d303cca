//! Specification discovery: locating the file that defines an operation
//! and deriving its API version from the directory layout.

pub mod index;
pub mod version;

pub use index::SpecificationIndex;
pub use version::{ApiVersion, SpecificationFile};
