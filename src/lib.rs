//! styledoc: a living style guide generator.
//!
//! Reads a TypeScript component codebase, pairs decorated component classes
//! with the usage examples embedded in their test files, and emits render
//! harness modules plus a single bundle manifest a documentation viewer can
//! load. The pipeline:
//!
//! 1. discovery: walk the source tree, classify annotated test files
//! 2. extract: component/module docs, API surfaces, inheritance flattening
//! 3. testdocs: example bodies, module setup, host components, http mocks
//! 4. codegen: one harness module per example-bearing test file
//! 5. finalize: the `styledoc.bundle.ts` manifest
//!
//! Nothing is ever executed; every fact in the output comes from static
//! analysis of the source text.

pub mod codegen;
pub mod discovery;
pub mod extract;
pub mod finalize;
pub mod generator;
pub mod markers;
pub mod parse;
pub mod testdocs;
pub mod validate;

pub use extract::{ApiEntry, ComponentDoc, ModuleDoc, SourceDocs};
pub use generator::{generate, regenerate_file, GenerationSummary, GeneratorConfig};
pub use testdocs::{ExampleDoc, TestDoc};
pub use validate::GeneratorError;
