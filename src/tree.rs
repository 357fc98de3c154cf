//! The program tree: every declaration of an agent program, in the order it
//! was declared.
//!
//! A parser (or a [`ProgramSource`] document) drives the builder methods on
//! [`ProgramTree`]. Declarations inherited from outside the program are
//! applied first through [`ProgramTree::inherit`].
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

// we will use a fast hashing algo for the declaration indexes
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// used to validate identifiers
use lazy_static::lazy_static;
use regex::Regex;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Position, Result, SemanticError, SemanticErrorKind, SymbolKind};
use crate::term::{Literal, Sentence, Statement, Variable};

pub type SymbolHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// True if `name` can be used as an attitude, constant, procedure or
/// variable name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub(crate) fn check_identifier(
    name: &str,
    pos: Position,
) -> std::result::Result<(), SemanticError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SemanticError::new(
            SemanticErrorKind::InvalidIdentifier(name.to_owned()),
            pos,
        ))
    }
}

// ------------- DeclarationMap -------------
/// A map that iterates in insertion order. Replacing a value keeps the
/// original position of its key.
#[derive(Debug, Clone)]
pub struct DeclarationMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize, SymbolHasher>,
}

impl<K, V> Default for DeclarationMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::default(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> DeclarationMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }
    /// Inserts or replaces, returning the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ------------- Declarations -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attitude {
    pub id: u32,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: Literal,
    /// Inherited constants are referred to, never emitted.
    pub external: bool,
    pub pos: Position,
}

/// Procedures overload on parameter count only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
}

impl Signature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    /// Declared, but the body is still to come.
    Forward,
    Defined(Vec<Statement>),
    /// Inherited and may be overridden by the program.
    External,
    /// Inherited and may not be overridden.
    ExternalFinal,
}

impl Body {
    pub fn is_external(&self) -> bool {
        matches!(self, Body::External | Body::ExternalFinal)
    }
    fn describe(&self) -> &'static str {
        match self {
            Body::Forward => "forward declaration",
            Body::Defined(_) => "defined body",
            Body::External => "inherited body",
            Body::ExternalFinal => "final inherited body",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<Variable>,
    pub body: Body,
    pub pos: Position,
}

// ------------- ProgramTree -------------
#[derive(Debug, Default)]
pub struct ProgramTree {
    pub(crate) attitudes: DeclarationMap<String, Attitude>,
    pub(crate) constants: DeclarationMap<String, Constant>,
    pub(crate) facts: Vec<Sentence>,
    pub(crate) procedures: DeclarationMap<Signature, Procedure>,
}

impl ProgramTree {
    pub fn new() -> Self {
        Self::default()
    }
    /// A tree seeded with the given inherited declarations.
    pub fn with_inherited(
        inherited: &InheritedDeclarations,
    ) -> std::result::Result<Self, SemanticError> {
        let mut tree = Self::new();
        tree.inherit(inherited)?;
        Ok(tree)
    }

    /// Declares an attitude. Declaring it again with the same id is a no-op.
    pub fn declare_attitude(
        &mut self,
        name: &str,
        id: u32,
        pos: Position,
    ) -> std::result::Result<(), SemanticError> {
        check_identifier(name, pos)?;
        match self.attitudes.get(name) {
            Some(existing) if existing.id != id => Err(SemanticError::new(
                SemanticErrorKind::ConflictingRedefinition {
                    kind: SymbolKind::Attitude,
                    name: name.to_owned(),
                    old: existing.id.to_string(),
                    new: id.to_string(),
                },
                pos,
            )),
            Some(_) => Ok(()),
            None => {
                trace!("attitude {} = {}", name, id);
                self.attitudes.insert(name.to_owned(), Attitude { id, pos });
                Ok(())
            }
        }
    }

    /// Declares a constant. Declaring it again with the same value is a no-op.
    pub fn declare_constant(
        &mut self,
        name: &str,
        value: Literal,
        pos: Position,
    ) -> std::result::Result<(), SemanticError> {
        check_identifier(name, pos)?;
        self.put_constant(name, value, false, pos)
    }

    fn put_constant(
        &mut self,
        name: &str,
        value: Literal,
        external: bool,
        pos: Position,
    ) -> std::result::Result<(), SemanticError> {
        match self.constants.get(name) {
            Some(existing) if existing.value != value => Err(SemanticError::new(
                SemanticErrorKind::ConflictingRedefinition {
                    kind: SymbolKind::Constant,
                    name: name.to_owned(),
                    old: existing.value.to_string(),
                    new: value.to_string(),
                },
                pos,
            )),
            Some(_) => Ok(()),
            None => {
                trace!("constant {} = {}", name, value);
                self.constants.insert(
                    name.to_owned(),
                    Constant {
                        value,
                        external,
                        pos,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn add_ground_fact(&mut self, sentence: Sentence) {
        self.facts.push(sentence);
    }

    /// Declares a procedure (`body` is `None`) or defines it.
    ///
    /// A body may fill a forward declaration or replace an inherited,
    /// overridable one; it then brings its own parameter list. Anything else
    /// already holding a body makes the definition conflicting.
    pub fn declare_procedure(
        &mut self,
        name: &str,
        params: Vec<Variable>,
        body: Option<Vec<Statement>>,
        pos: Position,
    ) -> std::result::Result<(), SemanticError> {
        check_identifier(name, pos)?;
        let signature = Signature::new(name, params.len());
        let body = match body {
            Some(statements) => Body::Defined(statements),
            None => {
                if !self.procedures.contains_key(&signature) {
                    trace!("forward declaration of {}", signature);
                    self.procedures.insert(
                        signature,
                        Procedure {
                            name: name.to_owned(),
                            params,
                            body: Body::Forward,
                            pos,
                        },
                    );
                }
                return Ok(());
            }
        };
        if let Some(existing) = self.procedures.get(&signature) {
            if !matches!(existing.body, Body::Forward | Body::External) {
                return Err(SemanticError::new(
                    SemanticErrorKind::ConflictingRedefinition {
                        kind: SymbolKind::Procedure,
                        name: signature.to_string(),
                        old: existing.body.describe().to_owned(),
                        new: body.describe().to_owned(),
                    },
                    pos,
                ));
            }
        }
        trace!("definition of {}", signature);
        self.procedures.insert(
            signature,
            Procedure {
                name: name.to_owned(),
                params,
                body,
                pos,
            },
        );
        Ok(())
    }

    pub fn is_procedure(&self, name: &str, arity: usize) -> bool {
        self.procedures.contains_key(&Signature::new(name, arity))
    }

    /// Applies declarations the program inherits from its host.
    pub fn inherit(
        &mut self,
        inherited: &InheritedDeclarations,
    ) -> std::result::Result<(), SemanticError> {
        for constant in &inherited.constants {
            check_identifier(&constant.name, Position::default())?;
            self.put_constant(&constant.name, constant.value.clone(), true, Position::default())?;
        }
        for procedure in &inherited.procedures {
            check_identifier(&procedure.name, Position::default())?;
            let signature = Signature::new(procedure.name.as_str(), procedure.arity);
            let previous = self.procedures.get(&signature).map(|p| &p.body);
            let body = match procedure.kind {
                InheritedKind::Final => match previous {
                    None | Some(Body::ExternalFinal) => Body::ExternalFinal,
                    Some(other) => {
                        return Err(SemanticError::new(
                            SemanticErrorKind::ConflictingRedefinition {
                                kind: SymbolKind::Procedure,
                                name: signature.to_string(),
                                old: other.describe().to_owned(),
                                new: Body::ExternalFinal.describe().to_owned(),
                            },
                            Position::default(),
                        ));
                    }
                },
                _ if previous.is_some() => continue,
                InheritedKind::Abstract => Body::Forward,
                InheritedKind::Overridable => Body::External,
            };
            debug!("Inherited {} as {}", signature, body.describe());
            self.procedures.insert(
                signature,
                Procedure {
                    name: procedure.name.clone(),
                    params: Vec::new(),
                    body,
                    pos: Position::default(),
                },
            );
        }
        Ok(())
    }

    pub fn attitudes(&self) -> &DeclarationMap<String, Attitude> {
        &self.attitudes
    }
    pub fn constants(&self) -> &DeclarationMap<String, Constant> {
        &self.constants
    }
    pub fn facts(&self) -> &[Sentence] {
        &self.facts
    }
    pub fn procedures(&self) -> &DeclarationMap<Signature, Procedure> {
        &self.procedures
    }
    /// The highest attitude id, 0 for a program without attitudes.
    pub fn max_attitude(&self) -> u32 {
        self.attitudes.values().map(|a| a.id).max().unwrap_or(0)
    }
}

// ------------- Inherited declarations -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritedKind {
    Overridable,
    Final,
    /// Must be implemented by the program.
    Abstract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritedConstant {
    pub name: String,
    pub value: Literal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritedProcedure {
    pub name: String,
    pub arity: usize,
    pub kind: InheritedKind,
}

/// Constants and procedures a program gets from the host it is compiled
/// against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InheritedDeclarations {
    #[serde(default)]
    pub constants: Vec<InheritedConstant>,
    #[serde(default)]
    pub procedures: Vec<InheritedProcedure>,
}

impl InheritedDeclarations {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ------------- ProgramSource -------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudeDecl {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub pos: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,
    pub value: Literal,
    #[serde(default)]
    pub pos: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Variable>,
    /// Absent for a forward declaration.
    #[serde(default)]
    pub body: Option<Vec<Statement>>,
    #[serde(default)]
    pub pos: Position,
}

/// A whole program as a JSON document, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSource {
    #[serde(default)]
    pub attitudes: Vec<AttitudeDecl>,
    #[serde(default)]
    pub constants: Vec<ConstantDecl>,
    #[serde(default)]
    pub facts: Vec<Sentence>,
    #[serde(default)]
    pub procedures: Vec<ProcedureDecl>,
}

impl ProgramSource {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
    /// Replays the document through the builder methods of `tree`.
    pub fn build(self, tree: &mut ProgramTree) -> std::result::Result<(), SemanticError> {
        for attitude in self.attitudes {
            tree.declare_attitude(&attitude.name, attitude.id, attitude.pos)?;
        }
        for constant in self.constants {
            tree.declare_constant(&constant.name, constant.value, constant.pos)?;
        }
        for fact in self.facts {
            tree.add_ground_fact(fact);
        }
        for procedure in self.procedures {
            tree.declare_procedure(
                &procedure.name,
                procedure.params,
                procedure.body,
                procedure.pos,
            )?;
        }
        Ok(())
    }
    pub fn into_tree(
        self,
        inherited: Option<&InheritedDeclarations>,
    ) -> std::result::Result<ProgramTree, SemanticError> {
        let mut tree = match inherited {
            Some(inherited) => ProgramTree::with_inherited(inherited)?,
            None => ProgramTree::new(),
        };
        self.build(&mut tree)?;
        Ok(tree)
    }
}
