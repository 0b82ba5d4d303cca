//! Specification traversal: reference resolution, operation extraction,
//! and the records handed to downstream code generators.

pub mod extractor;
pub mod models;
pub mod resolver;

pub use extractor::{extract_detailed, extract_operation, ExtractedOperation};
pub use models::{
    DefinitionCatalog, DefinitionKey, HttpMethod, OperationRecord, Parameter, ParameterLocation,
    Response,
};
pub use resolver::ReferenceResolver;
