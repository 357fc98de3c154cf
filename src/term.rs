//! The syntax tree of agent programs.
//!
//! Nodes are plain tagged unions that an external parser (or a
//! [`ProgramSource`](crate::tree::ProgramSource) document) builds. The
//! analyzer annotates them in place: variable occurrences get a
//! [`Binding`] and sentences get their attitude resolved to a category.
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::Position;

/// Name of the anonymous "don't care" variable.
pub const WILDCARD: &str = "_";

// ------------- Literal -------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    /// A value supplied from outside the program, carried as its text.
    Opaque(String),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Str(a), Literal::Str(b)) => a == b,
            (Literal::Opaque(a), Literal::Opaque(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Int(i) => i.hash(state),
            Literal::Float(x) => x.to_bits().hash(state),
            Literal::Str(s) | Literal::Opaque(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Opaque(s) => write!(f, "<{}>", s),
        }
    }
}

// ------------- Variable -------------
/// Handle of an entry in the analyzer's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What the analyzer decided a variable occurrence is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Binding {
    #[default]
    Unclassified,
    /// A wildcard in a pattern: a slot that is matched but never bound.
    Wildcard,
    Definition(SymbolId),
    Use(SymbolId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub pos: Position,
    #[serde(skip)]
    pub binding: Binding,
}

impl Variable {
    pub fn new(name: impl Into<String>, pos: Position) -> Self {
        Self {
            name: name.into(),
            pos,
            binding: Binding::Unclassified,
        }
    }
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Position::default())
    }
    pub fn wildcard() -> Self {
        Self::named(WILDCARD)
    }
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
    pub fn is_classified(&self) -> bool {
        self.binding != Binding::Unclassified
    }
    /// Fresh definitions and wildcards both occupy a slot a match fills in.
    pub fn is_definition(&self) -> bool {
        matches!(self.binding, Binding::Definition(_) | Binding::Wildcard)
    }
    pub fn symbol(&self) -> Option<SymbolId> {
        match self.binding {
            Binding::Definition(id) | Binding::Use(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

// ------------- Sentence -------------
/// A predicate pattern: `attitude name(t1, .., tn) [AS ?alias]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub attitude: String,
    pub name: String,
    #[serde(default)]
    pub terms: Vec<Expr>,
    #[serde(default)]
    pub alias: Option<Variable>,
    #[serde(default)]
    pub pos: Position,
    /// Attitude id, filled in by the analyzer.
    #[serde(skip)]
    pub category: Option<u32>,
}

impl Sentence {
    pub fn new(attitude: impl Into<String>, name: impl Into<String>, terms: Vec<Expr>) -> Self {
        Self {
            attitude: attitude.into(),
            name: name.into(),
            terms,
            alias: None,
            pos: Position::default(),
            category: None,
        }
    }
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }
    /// Binds the whole matched fact to `alias`. A wildcard alias is dropped.
    pub fn aliased(mut self, alias: Variable) -> Self {
        self.alias = (!alias.is_wildcard()).then_some(alias);
        self
    }
    /// True when no direct term is a fresh definition, so the sentence can
    /// be tested as a whole.
    pub fn is_simple(&self) -> bool {
        self.slot_positions().is_empty()
    }
    /// Positions of the terms a match has to fill in: fresh definitions,
    /// wildcards, and later occurrences of a variable this sentence defines.
    pub fn slot_positions(&self) -> Vec<u32> {
        let repeats = self.repeats();
        self.terms
            .iter()
            .enumerate()
            .filter(|(i, term)| {
                matches!(term, Expr::Var(v) if v.is_definition())
                    || repeats.iter().any(|&(_, at)| at == *i as u32)
            })
            .map(|(i, _)| i as u32)
            .collect()
    }
    /// `(defined, repeated)` position pairs of a variable that occurs more
    /// than once in this sentence. A candidate only matches if the terms at
    /// both positions are equal.
    pub fn repeats(&self) -> Vec<(u32, u32)> {
        let mut defined: Vec<(SymbolId, u32)> = Vec::new();
        let mut repeats = Vec::new();
        for (i, term) in self.terms.iter().enumerate() {
            let Expr::Var(var) = term else {
                continue;
            };
            match var.binding {
                Binding::Definition(id) => defined.push((id, i as u32)),
                Binding::Use(id) => {
                    if let Some(&(_, at)) = defined.iter().find(|(d, _)| *d == id) {
                        repeats.push((at, i as u32));
                    }
                }
                _ => {}
            }
        }
        repeats
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}(", self.attitude, self.name)?;
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", term)?;
        }
        write!(f, ")")?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

// ------------- Expressions -------------
/// A named invocation with arguments: actions, queries and procedure calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub pos: Position,
}

impl Invocation {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            pos: Position::default(),
        }
    }
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    Constant {
        name: String,
        #[serde(default)]
        pos: Position,
    },
    Var(Variable),
    /// The running agent's own identity.
    #[serde(rename = "self")]
    SelfRef,
    Sentence(Box<Sentence>),
    Query(Invocation),
    Call(Invocation),
}

impl Expr {
    pub fn int(i: i64) -> Self {
        Expr::Literal(Literal::Int(i))
    }
    pub fn float(x: f64) -> Self {
        Expr::Literal(Literal::Float(x))
    }
    pub fn str(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(s.into()))
    }
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(Variable::named(name))
    }
    pub fn wildcard() -> Self {
        Expr::Var(Variable::wildcard())
    }
    pub fn constant(name: impl Into<String>) -> Self {
        Expr::Constant {
            name: name.into(),
            pos: Position::default(),
        }
    }
    pub fn sentence(sentence: Sentence) -> Self {
        Expr::Sentence(Box::new(sentence))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(l) => write!(f, "{}", l),
            Expr::Constant { name, .. } => write!(f, "{}", name),
            Expr::Var(v) => write!(f, "{}", v),
            Expr::SelfRef => write!(f, "SELF"),
            Expr::Sentence(s) => write!(f, "{}", s),
            Expr::Query(q) => write!(f, "QUERY {}(..)", q.name),
            Expr::Call(c) => write!(f, "{}(..)", c.name),
        }
    }
}

// ------------- Conditions -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Sentence(Sentence),
    Comparison {
        lhs: Expr,
        op: CompareOp,
        rhs: Expr,
        #[serde(default)]
        pos: Position,
    },
    /// An action whose success is the test.
    Action(Invocation),
}

impl Condition {
    pub fn compare(lhs: Expr, op: CompareOp, rhs: Expr) -> Self {
        Condition::Comparison {
            lhs,
            op,
            rhs,
            pos: Position::default(),
        }
    }
}

// ------------- Statements -------------
/// One `key = value` entry of a message, either sent or expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: Expr,
}

impl Field {
    pub fn new(key: impl Into<String>, value: Expr) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// One arm of an if statement. `conditions` is `None` for the else arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default)]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default)]
    pub body: Vec<Statement>,
}

impl Branch {
    pub fn when(conditions: Vec<Condition>, body: Vec<Statement>) -> Self {
        Self {
            conditions: Some(conditions),
            body,
        }
    }
    pub fn otherwise(body: Vec<Statement>) -> Self {
        Self {
            conditions: None,
            body,
        }
    }
}

/// What a message rule expects from the inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Only fires when there is no message.
    Nothing,
    /// Fires on a message holding every key, with values matching the patterns.
    Message(Vec<Field>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRule {
    pub trigger: Trigger,
    #[serde(default)]
    pub body: Vec<Statement>,
    #[serde(default)]
    pub pos: Position,
}

impl MessageRule {
    pub fn new(trigger: Trigger, body: Vec<Statement>) -> Self {
        Self {
            trigger,
            body,
            pos: Position::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    If {
        branches: Vec<Branch>,
        #[serde(default)]
        pos: Position,
    },
    /// A group of message rules of which the first that matches fires.
    Rules(Vec<MessageRule>),
    Let {
        var: Variable,
        value: Expr,
    },
    Assign {
        var: Variable,
        value: Expr,
    },
    Adopt {
        target: Expr,
        #[serde(default)]
        pos: Position,
    },
    Drop {
        target: Expr,
        #[serde(default)]
        pos: Position,
    },
    Say {
        fields: Vec<Field>,
        #[serde(default)]
        pos: Position,
    },
    Action(Invocation),
    Call(Invocation),
    Locked {
        body: Vec<Statement>,
        #[serde(default)]
        pos: Position,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        pos: Position,
    },
}

impl Statement {
    pub fn if_else(branches: Vec<Branch>) -> Self {
        Statement::If {
            branches,
            pos: Position::default(),
        }
    }
    pub fn let_(name: impl Into<String>, value: Expr) -> Self {
        Statement::Let {
            var: Variable::named(name),
            value,
        }
    }
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Statement::Assign {
            var: Variable::named(name),
            value,
        }
    }
    pub fn adopt(sentence: Sentence) -> Self {
        Statement::Adopt {
            target: Expr::sentence(sentence),
            pos: Position::default(),
        }
    }
    pub fn drop(sentence: Sentence) -> Self {
        Statement::Drop {
            target: Expr::sentence(sentence),
            pos: Position::default(),
        }
    }
    pub fn action(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Statement::Action(Invocation::new(name, args))
    }
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Statement::Call(Invocation::new(name, args))
    }
    pub fn say(fields: Vec<Field>) -> Self {
        Statement::Say {
            fields,
            pos: Position::default(),
        }
    }
    pub fn locked(body: Vec<Statement>) -> Self {
        Statement::Locked {
            body,
            pos: Position::default(),
        }
    }
    pub fn ret(value: Option<Expr>) -> Self {
        Statement::Return {
            value,
            pos: Position::default(),
        }
    }
    pub fn is_return(&self) -> bool {
        matches!(self, Statement::Return { .. })
    }
    /// The return a statement ends in: the statement itself, or the last
    /// statement of a locked block, looked up recursively.
    pub fn last_return(&self) -> Option<Position> {
        match self {
            Statement::Return { pos, .. } => Some(*pos),
            Statement::Locked { body, .. } => body.last().and_then(Statement::last_return),
            _ => None,
        }
    }
}
