//! Semantic checks over a [`ProgramTree`].
//!
//! The analyzer resolves attitudes, constants and procedure calls, and
//! classifies every variable occurrence as either a definition or a use of
//! an earlier definition. What is legal depends on the [`ScopeMode`] a
//! construct is checked under:
//!
//! - `DefUse`: unknown names become new definitions (procedure bodies,
//!   condition sentences, guard patterns, dropped sentences).
//! - `UseOnly`: every name must already be defined (right hand sides,
//!   comparisons, arguments, and anything nested inside a term).
//! - `NoVars`: no variable may appear at all (initial facts).
//!
//! The first error found aborts the check.
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::error::{Position, SemanticError, SemanticErrorKind, SymbolKind};
use crate::term::{
    Binding, Condition, Expr, Invocation, Sentence, Statement, SymbolId, Trigger, Variable,
};
use crate::tree::{
    check_identifier, Attitude, Body, Constant, DeclarationMap, Procedure, ProgramTree, Signature,
    SymbolHasher,
};

type Check = std::result::Result<(), SemanticError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    DefUse,
    UseOnly,
    NoVars,
}

impl ScopeMode {
    /// The mode terms nested inside a term are checked under.
    pub fn restrict(self) -> Self {
        match self {
            ScopeMode::NoVars => ScopeMode::NoVars,
            _ => ScopeMode::UseOnly,
        }
    }
}

// ------------- Symbols -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Unique within one compilation, in order of definition.
    pub ordinal: u32,
    /// Only `let` bindings and parameters may be assigned to.
    pub assignable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }
}

/// The outcome of a successful check.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub symbols: SymbolTable,
}

/// Names visible at some point of a procedure body.
pub type Scope = HashMap<String, SymbolId, SymbolHasher>;

// ------------- Analyzer -------------
pub struct Analyzer<'t> {
    attitudes: &'t DeclarationMap<String, Attitude>,
    constants: &'t DeclarationMap<String, Constant>,
    signatures: HashSet<Signature, SymbolHasher>,
    symbols: SymbolTable,
    next_ordinal: u32,
}

/// Checks a whole program, annotating it in place.
pub fn check(tree: &mut ProgramTree) -> std::result::Result<Analysis, SemanticError> {
    let ProgramTree {
        attitudes,
        constants,
        facts,
        procedures,
    } = tree;
    let signatures = procedures.iter().map(|(s, _)| s.clone());
    let mut analyzer = Analyzer::new(attitudes, constants, signatures);

    for fact in facts.iter_mut() {
        analyzer.check_sentence(fact, &mut Scope::default(), ScopeMode::NoVars, false)?;
    }
    for (signature, procedure) in procedures.iter_mut() {
        analyzer.check_procedure(signature, procedure)?;
    }
    debug!(
        "Checked {} facts and {} procedures, {} symbols defined",
        facts.len(),
        procedures.len(),
        analyzer.symbols.len()
    );
    Ok(Analysis {
        symbols: analyzer.symbols,
    })
}

impl<'t> Analyzer<'t> {
    pub fn new(
        attitudes: &'t DeclarationMap<String, Attitude>,
        constants: &'t DeclarationMap<String, Constant>,
        signatures: impl IntoIterator<Item = Signature>,
    ) -> Self {
        Self {
            attitudes,
            constants,
            signatures: signatures.into_iter().collect(),
            symbols: SymbolTable::default(),
            next_ordinal: 0,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn check_procedure(&mut self, signature: &Signature, procedure: &mut Procedure) -> Check {
        let Procedure {
            params, body, pos, ..
        } = procedure;
        let statements = match body {
            Body::External | Body::ExternalFinal => return Ok(()),
            Body::Forward => {
                return Err(SemanticError::new(
                    SemanticErrorKind::MissingProcedureBody {
                        signature: signature.to_string(),
                    },
                    *pos,
                ));
            }
            Body::Defined(statements) => statements,
        };
        trace!("checking {}", signature);
        let mut scope = Scope::default();
        for param in params.iter_mut() {
            if param.is_wildcard() {
                return Err(SemanticError::new(SemanticErrorKind::IllegalWildcard, param.pos));
            }
            if let Some(previous) = scope.get(&param.name) {
                let old = self
                    .symbols
                    .get(*previous)
                    .map(|s| format!("parameter {}", s.ordinal))
                    .unwrap_or_default();
                return Err(SemanticError::new(
                    SemanticErrorKind::ConflictingRedefinition {
                        kind: SymbolKind::Parameter,
                        name: param.name.clone(),
                        old,
                        new: format!("parameter {}", self.next_ordinal),
                    },
                    param.pos,
                ));
            }
            self.define(param, true, &mut scope)?;
        }
        self.check_block(statements, &mut scope)
    }

    // ------------- variables -------------
    fn define(
        &mut self,
        var: &mut Variable,
        assignable: bool,
        scope: &mut Scope,
    ) -> Result<SymbolId, SemanticError> {
        check_identifier(&var.name, var.pos)?;
        let id = self.symbols.push(Symbol {
            name: var.name.clone(),
            ordinal: self.next_ordinal,
            assignable,
        });
        self.next_ordinal += 1;
        scope.insert(var.name.clone(), id);
        var.binding = Binding::Definition(id);
        Ok(id)
    }

    /// Classifies one occurrence as a definition or a use.
    pub fn classify(&mut self, var: &mut Variable, scope: &mut Scope, mode: ScopeMode) -> Check {
        if var.is_classified() {
            return Err(SemanticError::new(
                SemanticErrorKind::IllegalReclassification {
                    name: var.name.clone(),
                },
                var.pos,
            ));
        }
        if mode == ScopeMode::NoVars {
            return Err(SemanticError::scope(
                format!("Variable \"{}\" is not allowed in a ground fact", var.name),
                var.pos,
            ));
        }
        if var.is_wildcard() {
            return match mode {
                ScopeMode::DefUse => {
                    var.binding = Binding::Wildcard;
                    Ok(())
                }
                _ => Err(SemanticError::new(SemanticErrorKind::IllegalWildcard, var.pos)),
            };
        }
        if let Some(&id) = scope.get(&var.name) {
            var.binding = Binding::Use(id);
            return Ok(());
        }
        match mode {
            ScopeMode::DefUse => self.define(var, false, scope).map(|_| ()),
            _ => Err(unresolved(SymbolKind::Variable, &var.name, var.pos)),
        }
    }

    // ------------- expressions -------------
    pub fn check_expr(&mut self, expr: &mut Expr, scope: &mut Scope, mode: ScopeMode) -> Check {
        match expr {
            Expr::Literal(_) | Expr::SelfRef => Ok(()),
            Expr::Constant { name, pos } => {
                if self.constants.contains_key(name.as_str()) {
                    Ok(())
                } else {
                    Err(unresolved(SymbolKind::Constant, name, *pos))
                }
            }
            Expr::Var(var) => self.classify(var, scope, mode),
            Expr::Sentence(sentence) => self.check_sentence(sentence, scope, mode, false),
            Expr::Query(query) => self.check_args(query, scope, mode.restrict()),
            Expr::Call(call) => self.check_call(call, scope, mode.restrict()),
        }
    }

    fn check_args(
        &mut self,
        invocation: &mut Invocation,
        scope: &mut Scope,
        mode: ScopeMode,
    ) -> Check {
        for arg in invocation.args.iter_mut() {
            self.check_expr(arg, scope, mode)?;
        }
        Ok(())
    }

    fn check_call(&mut self, call: &mut Invocation, scope: &mut Scope, mode: ScopeMode) -> Check {
        let signature = Signature::new(call.name.as_str(), call.args.len());
        if !self.signatures.contains(&signature) {
            return Err(unresolved(SymbolKind::Procedure, &signature.to_string(), call.pos));
        }
        self.check_args(call, scope, mode)
    }

    /// Resolves the attitude, classifies the direct terms under `mode` and
    /// nested ones, first, under the restricted mode. An alias is only accepted
    /// where `alias_allowed`, and always defines a fresh variable.
    pub fn check_sentence(
        &mut self,
        sentence: &mut Sentence,
        scope: &mut Scope,
        mode: ScopeMode,
        alias_allowed: bool,
    ) -> Check {
        let attitude = self
            .attitudes
            .get(sentence.attitude.as_str())
            .ok_or_else(|| unresolved(SymbolKind::Attitude, &sentence.attitude, sentence.pos))?;
        sentence.category = Some(attitude.id);

        // nested terms only see what was bound before this sentence
        for term in sentence.terms.iter_mut() {
            if !matches!(term, Expr::Var(_)) {
                self.check_expr(term, scope, mode.restrict())?;
            }
        }
        for term in sentence.terms.iter_mut() {
            if let Expr::Var(var) = term {
                self.classify(var, scope, mode)?;
            }
        }

        if sentence.alias.as_ref().is_some_and(Variable::is_wildcard) {
            sentence.alias = None;
        }
        if let Some(alias) = sentence.alias.as_mut() {
            if !alias_allowed || mode == ScopeMode::NoVars {
                return Err(SemanticError::scope(
                    format!("Alias {} is only allowed on conditions and guards", alias),
                    alias.pos,
                ));
            }
            if alias.is_classified() {
                return Err(SemanticError::new(
                    SemanticErrorKind::IllegalReclassification {
                        name: alias.name.clone(),
                    },
                    alias.pos,
                ));
            }
            self.define(alias, false, scope)?;
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut Condition, scope: &mut Scope) -> Check {
        match condition {
            Condition::Sentence(sentence) => {
                self.check_sentence(sentence, scope, ScopeMode::DefUse, true)
            }
            Condition::Comparison { lhs, rhs, .. } => {
                self.check_expr(lhs, scope, ScopeMode::UseOnly)?;
                self.check_expr(rhs, scope, ScopeMode::UseOnly)
            }
            Condition::Action(action) => self.check_args(action, scope, ScopeMode::UseOnly),
        }
    }

    fn check_guard(&mut self, pattern: &mut Expr, scope: &mut Scope) -> Check {
        match pattern {
            Expr::Sentence(sentence) => {
                self.check_sentence(sentence, scope, ScopeMode::DefUse, true)
            }
            other => self.check_expr(other, scope, ScopeMode::DefUse),
        }
    }

    // ------------- statements -------------
    /// Checks a statement list, threading `scope` through it.
    pub fn check_block(&mut self, statements: &mut [Statement], scope: &mut Scope) -> Check {
        if let Some((_, preceding)) = statements.split_last() {
            if let Some(pos) = preceding.iter().find_map(Statement::last_return) {
                return Err(SemanticError::new(SemanticErrorKind::UnreachableStatement, pos));
            }
        }
        for statement in statements.iter_mut() {
            self.check_statement(statement, scope)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &mut Statement, scope: &mut Scope) -> Check {
        match statement {
            Statement::If { branches, .. } => {
                for branch in branches.iter_mut() {
                    let mut inner = scope.clone();
                    if let Some(conditions) = branch.conditions.as_mut() {
                        for condition in conditions.iter_mut() {
                            self.check_condition(condition, &mut inner)?;
                        }
                    }
                    self.check_block(&mut branch.body, &mut inner)?;
                }
                Ok(())
            }
            Statement::Rules(rules) => {
                for rule in rules.iter_mut() {
                    let mut inner = scope.clone();
                    if let Trigger::Message(fields) = &mut rule.trigger {
                        for field in fields.iter_mut() {
                            self.check_guard(&mut field.value, &mut inner)?;
                        }
                    }
                    self.check_block(&mut rule.body, &mut inner)?;
                }
                Ok(())
            }
            Statement::Let { var, value } => {
                self.check_expr(value, scope, ScopeMode::UseOnly)?;
                if var.is_classified() {
                    return Err(SemanticError::new(
                        SemanticErrorKind::IllegalReclassification {
                            name: var.name.clone(),
                        },
                        var.pos,
                    ));
                }
                if var.is_wildcard() {
                    var.binding = Binding::Wildcard;
                    return Ok(());
                }
                self.define(var, true, scope).map(|_| ())
            }
            Statement::Assign { var, value } => {
                self.check_assignment_target(var, scope)?;
                self.check_expr(value, scope, ScopeMode::UseOnly)
            }
            Statement::Adopt { target, .. } => self.check_expr(target, scope, ScopeMode::UseOnly),
            Statement::Drop { target, .. } => match target {
                Expr::Sentence(sentence) => {
                    // fresh variables only mark match slots of the removal
                    let visible = scope.clone();
                    self.check_sentence(sentence, scope, ScopeMode::DefUse, false)?;
                    *scope = visible;
                    Ok(())
                }
                other => self.check_expr(other, scope, ScopeMode::UseOnly),
            },
            Statement::Say { fields, .. } => {
                for field in fields.iter_mut() {
                    self.check_expr(&mut field.value, scope, ScopeMode::UseOnly)?;
                }
                Ok(())
            }
            Statement::Action(action) => self.check_args(action, scope, ScopeMode::UseOnly),
            Statement::Call(call) => self.check_call(call, scope, ScopeMode::UseOnly),
            Statement::Locked { body, .. } => {
                let mut inner = scope.clone();
                self.check_block(body, &mut inner)
            }
            Statement::Return { value, .. } => match value {
                Some(value) => self.check_expr(value, scope, ScopeMode::UseOnly),
                None => Ok(()),
            },
        }
    }

    fn check_assignment_target(&mut self, var: &mut Variable, scope: &Scope) -> Check {
        if var.is_wildcard() {
            return Err(SemanticError::new(SemanticErrorKind::IllegalWildcard, var.pos));
        }
        if var.is_classified() {
            return Err(SemanticError::new(
                SemanticErrorKind::IllegalReclassification {
                    name: var.name.clone(),
                },
                var.pos,
            ));
        }
        let id = *scope
            .get(&var.name)
            .ok_or_else(|| unresolved(SymbolKind::Variable, &var.name, var.pos))?;
        if !self.symbols.get(id).is_some_and(|s| s.assignable) {
            return Err(SemanticError::scope(
                format!("Variable \"{}\" is bound by a match and cannot be assigned", var.name),
                var.pos,
            ));
        }
        var.binding = Binding::Use(id);
        Ok(())
    }
}

fn unresolved(kind: SymbolKind, name: &str, pos: Position) -> SemanticError {
    SemanticError::new(
        SemanticErrorKind::UnresolvedSymbol {
            kind,
            name: name.to_owned(),
        },
        pos,
    )
}
