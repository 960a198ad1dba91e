//! # autopojo-gen
//!
//! Generates immutable data classes from marked interface declarations.
//!
//! - **Naming** ([`names`]): derive the generated class name for a declaration
//! - **Rewriting** ([`rewrite`]): swap references to marked interfaces for
//!   their generated counterparts inside type expressions
//! - **Synthesis** ([`synth`]): build the field/accessor shape of a class tree
//! - **Rendering and emission** ([`render`], [`emit`]): Java source output
//! - **Orchestration** ([`tasks`]): run one task per declaration concurrently
//!   and aggregate every failure before reporting

pub mod emit;
pub mod error;
pub mod names;
pub mod render;
pub mod rewrite;
pub mod synth;
pub mod tasks;

pub use emit::{CompilationUnit, EmitError, Emitter, FsEmitter, MemoryEmitter};
pub use error::GenError;
pub use names::{NameResolver, ResolvedName};
pub use rewrite::TypeRewriter;
pub use synth::{ClassSynthesizer, GeneratedClass, GeneratedField};
pub use tasks::{ErrorReport, RoundReport, Severity, TaskOrchestrator};
