//! agentc – a compiler for the AgentC rule language, and the indexed fact
//! store its output runs against.
//!
//! An AgentC program declares *attitudes* (belief, intention, ..), typed
//! constants, initial facts and procedures. Procedures are made of guarded
//! rules: conditions over *sentences* such as `believes at(?unit, ?place)`,
//! message rules that fire on the content of an inbound message, and
//! statements that adopt or drop facts, act, ask, talk and call other
//! procedures.
//!
//! ## Pipeline
//! * [`tree`] – The [`tree::ProgramTree`] and its builder API, which an
//!   external parser (or a JSON [`tree::ProgramSource`]) drives. Inherited
//!   declarations are supplied as [`tree::InheritedDeclarations`].
//! * [`term`] – The syntax tree: literals, variables, sentences,
//!   expressions, conditions and statements.
//! * [`analyzer`] – Resolves names and classifies every variable occurrence
//!   as a definition or a use, under one of three scope modes.
//! * [`codegen`] – Emits a Rust module with one function per procedure.
//!   Sentences with fresh variables become masked queries against the store
//!   and loops over their result.
//!
//! ## Runtime
//! * [`store`] – The [`store::KnowledgeBase`]: facts indexed by category
//!   and predicate name, with point operations independent of the total
//!   number of facts and masked partial matches local to one predicate.
//! * [`datatype`] – Runtime [`datatype::Value`]s, [`datatype::Fact`]s and
//!   [`datatype::Mask`]s.
//! * [`runtime`] – The [`runtime::Agent`] trait generated code calls, and
//!   everything else it imports.
//!
//! ## Quick Start
//! ```
//! use agentc::{compile, config::GeneratorOptions, error::Position};
//! use agentc::term::{Expr, Sentence, Statement};
//! use agentc::tree::ProgramTree;
//!
//! let mut tree = ProgramTree::new();
//! tree.declare_attitude("believes", 0, Position::default()).unwrap();
//! tree.declare_procedure(
//!     "main",
//!     vec![],
//!     Some(vec![Statement::adopt(Sentence::new("believes", "ready", vec![Expr::int(1)]))]),
//!     Position::default(),
//! ).unwrap();
//! let code = compile(&mut tree, &GeneratorOptions::default()).unwrap();
//! assert!(code.contains("kb.add(0, \"ready\", &[Value::Int(1)])?;"));
//! ```
pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod datatype;
pub mod error;
pub mod runtime;
pub mod store;
pub mod term;
pub mod tree;

pub use error::{AgentcError, Result, SemanticError};

use tracing::info;

/// Checks `tree` and generates its module. The tree is annotated in place.
pub fn compile(
    tree: &mut tree::ProgramTree,
    options: &config::GeneratorOptions,
) -> std::result::Result<String, SemanticError> {
    let analysis = analyzer::check(tree)?;
    let code = codegen::generate(tree, &analysis, options);
    info!(
        procedures = tree.procedures().len(),
        symbols = analysis.symbols.len(),
        "Compiled program"
    );
    Ok(code)
}
