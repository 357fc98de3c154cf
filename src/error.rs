use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Line and column of the token a construct was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// What kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Attitude,
    Constant,
    Procedure,
    Parameter,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Attitude => "attitude",
            SymbolKind::Constant => "constant",
            SymbolKind::Procedure => "procedure",
            SymbolKind::Parameter => "parameter",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    #[error("Unknown {kind} \"{name}\"")]
    UnresolvedSymbol { kind: SymbolKind, name: String },
    #[error("Attempt to reclassify variable \"{name}\"")]
    IllegalReclassification { name: String },
    #[error("Illegal use of wildcard variable")]
    IllegalWildcard,
    #[error("{0}")]
    ScopeViolation(String),
    #[error("{kind} \"{name}\" redefined from {old} to {new}")]
    ConflictingRedefinition {
        kind: SymbolKind,
        name: String,
        old: String,
        new: String,
    },
    #[error("No body defined for procedure \"{signature}\"")]
    MissingProcedureBody { signature: String },
    #[error("Unreachable statement following RETURN")]
    UnreachableStatement,
    #[error("\"{0}\" is not a valid identifier")]
    InvalidIdentifier(String),
}

/// The single diagnostic a failed compilation produces.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at {position}.")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub position: Position,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
    pub fn scope(message: impl Into<String>, position: Position) -> Self {
        Self::new(SemanticErrorKind::ScopeViolation(message.into()), position)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid category {category}, the knowledge base holds {categories} categories")]
    InvalidCategory { category: u32, categories: usize },
    #[error("Value is not a fact: {0}")]
    NotAFact(String),
    #[error("No current fact to remove")]
    NothingToRemove,
}

#[derive(Error, Debug)]
pub enum AgentcError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Descriptor error: {0}")]
    Descriptor(String),
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentcError>;

// Helper conversions
impl From<config::ConfigError> for AgentcError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
impl From<serde_json::Error> for AgentcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Descriptor(e.to_string())
    }
}
