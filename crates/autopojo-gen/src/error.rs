//! Errors raised while generating a single declaration.

use autopojo_core::types::TypeParseError;

use crate::emit::EmitError;

/// A failure of one generation task. Converted to an
/// [`ErrorReport`](crate::tasks::ErrorReport) at the task boundary.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("not an interface")]
    NotAnInterface,
    #[error("missing marker on `{0}`")]
    MissingMarker(String),
    #[error("generated name `{name}` is already taken by `{claimed_by}`")]
    NameCollision { name: String, claimed_by: String },
    #[error("invalid type on `{member}`: {source}")]
    InvalidType {
        member: String,
        #[source]
        source: TypeParseError,
    },
    #[error("accessor `{member}` maps to field `{field}`, which is already taken")]
    DuplicateField { member: String, field: String },
    #[error(transparent)]
    Emit(#[from] EmitError),
}
