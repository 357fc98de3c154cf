//! Translates a checked program into a Rust module.
//!
//! Each procedure becomes a function over an [`Agent`](crate::runtime::Agent).
//! The interesting part is how conditions are compiled. A sentence whose
//! terms are all known is a single `contains` test. A sentence with fresh
//! variables becomes a masked `match_facts` query and a loop over its
//! result; the variables are bound from each candidate and the remaining
//! conditions are compiled inside the loop.
//!
//! Conditions commit: a failed test outside any loop abandons the whole
//! branch, while inside a loop it only moves on to the next candidate. The
//! body runs once for every candidate binding that gets through, and the
//! branch counts as taken if that happened at least once.
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::analyzer::{Analysis, SymbolTable};
use crate::config::GeneratorOptions;
use crate::term::{
    Binding, CompareOp, Condition, Expr, Field, Invocation, Literal, MessageRule, Sentence,
    Statement, Trigger, Variable,
};
use crate::tree::{Body, ProgramTree, Signature, SymbolHasher};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// names that cannot be raw identifiers, or that the generated module defines itself
const TAKEN: &[&str] = &[
    "self", "Self", "super", "crate", "compare", "is_equal", "new_knowledge_base",
    "init_knowledge_base",
];

/// A Rust identifier for a program name.
pub fn rust_ident(name: &str) -> String {
    if TAKEN.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_owned()
    }
}

/// Temporaries a procedure declares up front when its body needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Temporary {
    KnowledgeBase,
}

/// Where control goes when a test fails.
#[derive(Debug, Clone)]
enum Fail {
    Break(String),
    Continue,
}

impl Fail {
    fn statement(&self) -> String {
        match self {
            Fail::Break(label) => format!("break '{};", label),
            Fail::Continue => "continue;".to_owned(),
        }
    }
}

struct Code {
    text: String,
    unit: String,
}

impl Code {
    fn new(indent: usize) -> Self {
        Self {
            text: String::new(),
            unit: " ".repeat(indent),
        }
    }
    fn line(&mut self, depth: usize, line: impl AsRef<str>) {
        for _ in 0..depth {
            self.text.push_str(&self.unit);
        }
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }
    fn blank(&mut self) {
        self.text.push('\n');
    }
}

/// Generates the module for a program that passed [`check`](crate::analyzer::check).
pub fn generate(tree: &ProgramTree, analysis: &Analysis, options: &GeneratorOptions) -> String {
    let mut generator = Generator::new(tree, &analysis.symbols, options);
    generator.module()
}

struct Generator<'a> {
    tree: &'a ProgramTree,
    symbols: &'a SymbolTable,
    options: &'a GeneratorOptions,
    functions: HashMap<Signature, String, SymbolHasher>,
    labels: u32,
    temps: u32,
    temporaries: BTreeSet<Temporary>,
}

impl<'a> Generator<'a> {
    fn new(
        tree: &'a ProgramTree,
        symbols: &'a SymbolTable,
        options: &'a GeneratorOptions,
    ) -> Self {
        // rust has no overloading, so names declared with several arities get the arity appended
        let mut arities: HashMap<&str, usize, SymbolHasher> = HashMap::default();
        for (signature, _) in tree.procedures().iter() {
            *arities.entry(signature.name.as_str()).or_default() += 1;
        }
        // a mangled name may still meet a declared one, later declarations step aside
        let mut used: HashSet<String, SymbolHasher> = HashSet::default();
        let mut functions = HashMap::default();
        for (signature, _) in tree.procedures().iter() {
            let name = if arities.get(signature.name.as_str()).copied().unwrap_or(0) > 1 {
                format!("{}_{}", signature.name, signature.arity)
            } else {
                signature.name.clone()
            };
            let mut ident = rust_ident(&name);
            while used.contains(&ident) {
                ident.push('_');
            }
            used.insert(ident.clone());
            functions.insert(signature.clone(), ident);
        }
        Self {
            tree,
            symbols,
            options,
            functions,
            labels: 0,
            temps: 0,
            temporaries: BTreeSet::new(),
        }
    }

    fn module(&mut self) -> String {
        let tree = self.tree;
        let mut code = Code::new(self.options.indent);
        match &self.options.source_name {
            Some(source) => {
                code.line(0, format!("// Generated by acc from {}. Do not edit.", source))
            }
            None => code.line(0, "// Generated by acc. Do not edit."),
        }
        code.line(0, "#[allow(unused_imports)]");
        code.line(
            0,
            format!(
                "use {}::{{{}}};",
                self.options.runtime_path,
                "compare, is_equal, Agent, Fact, KnowledgeBase, Mask, Message, StoreError, Value"
            ),
        );
        code.blank();
        code.line(0, format!("pub const MAX_ATTITUDE: u32 = {};", tree.max_attitude()));

        let mut constants = tree.constants().iter().filter(|(_, c)| !c.external).peekable();
        if constants.peek().is_some() {
            code.blank();
        }
        for (name, constant) in constants {
            if name.chars().any(|c| c.is_ascii_lowercase()) {
                code.line(0, "#[allow(non_upper_case_globals)]");
            }
            let (ty, value) = match &constant.value {
                Literal::Int(i) => ("i64", int_literal(*i)),
                Literal::Float(x) => ("f64", float_literal(*x)),
                Literal::Str(s) | Literal::Opaque(s) => ("&str", format!("{:?}", s)),
            };
            code.line(0, format!("pub const C_{}: {} = {};", name, ty, value));
        }

        code.blank();
        code.line(0, "pub fn new_knowledge_base() -> KnowledgeBase {");
        code.line(1, "KnowledgeBase::new(MAX_ATTITUDE as usize + 1)");
        code.line(0, "}");
        code.blank();
        // ground facts may mention SELF, queries and calls, so they are adopted by an agent
        code.line(0, "#[allow(unused_variables)]");
        code.line(0, "pub fn init_knowledge_base(agent: &dyn Agent) -> Result<(), StoreError> {");
        code.line(1, "let kb = agent.knowledge_base();");
        code.line(1, "let msg: Option<&Message> = None;");
        for fact in tree.facts() {
            let terms = self.terms(&fact.terms);
            code.line(
                1,
                format!("kb.add({}, {:?}, &[{}])?;", category(fact), fact.name, terms),
            );
        }
        code.line(1, "Ok(())");
        code.line(0, "}");

        let mut generated = 0;
        for (signature, procedure) in tree.procedures().iter() {
            let Body::Defined(statements) = &procedure.body else {
                continue;
            };
            code.blank();
            self.procedure(signature, &procedure.params, statements, &mut code);
            generated += 1;
        }
        debug!(
            procedures = generated,
            bytes = code.text.len(),
            "Generated module"
        );
        code.text
    }

    fn procedure(
        &mut self,
        signature: &Signature,
        params: &[Variable],
        statements: &[Statement],
        code: &mut Code,
    ) {
        self.labels = 0;
        self.temps = 0;
        self.temporaries.clear();

        let mut body = Code::new(self.options.indent);
        self.block(statements, 1, &mut body);
        if !statements.last().is_some_and(Statement::is_return) {
            body.line(1, "Ok(Value::Null)");
        }

        let mut header = String::from("pub fn ");
        header.push_str(&self.function(signature));
        header.push_str("(agent: &dyn Agent, msg: Option<&Message>");
        for param in params {
            header.push_str(&format!(", mut {}: Value", self.variable(param)));
        }
        header.push_str(") -> Result<Value, StoreError> {");

        code.line(
            0,
            format!(
                "#[allow({})]",
                "unused_labels, unused_mut, unused_variables, unused_assignments, \
                 unreachable_code, non_snake_case"
            ),
        );
        code.line(0, header);
        for temporary in &self.temporaries {
            match temporary {
                Temporary::KnowledgeBase => code.line(1, "let kb = agent.knowledge_base();"),
            }
        }
        code.text.push_str(&body.text);
        code.line(0, "}");
    }

    // ------------- names -------------
    fn function(&self, signature: &Signature) -> String {
        self.functions
            .get(signature)
            .cloned()
            .unwrap_or_else(|| rust_ident(&signature.name))
    }

    fn call_path(&self, call: &Invocation) -> String {
        let signature = Signature::new(call.name.as_str(), call.args.len());
        let function = self.function(&signature);
        let external = self
            .tree
            .procedures()
            .get(&signature)
            .is_some_and(|p| p.body.is_external());
        if external {
            format!("{}::{}", self.options.base_path, function)
        } else {
            function
        }
    }

    fn variable(&self, var: &Variable) -> String {
        match var.symbol().and_then(|id| self.symbols.get(id)) {
            Some(symbol) => format!("v{}_{}", symbol.ordinal, symbol.name),
            None => format!("v_{}", var.name),
        }
    }

    fn kb(&mut self) -> &'static str {
        self.temporaries.insert(Temporary::KnowledgeBase);
        "kb"
    }

    fn label(&mut self, kind: &str) -> String {
        let label = format!("{}{}", kind, self.labels);
        self.labels += 1;
        label
    }

    fn temp(&mut self, kind: &str) -> String {
        let temp = format!("{}{}", kind, self.temps);
        self.temps += 1;
        temp
    }

    // ------------- expressions -------------
    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => literal_value(literal),
            Expr::Constant { name, .. } => match self.tree.constants().get(name.as_str()) {
                Some(constant) if constant.external => {
                    format!("Value::from({}::{})", self.options.base_path, name)
                }
                _ => format!("Value::from(C_{})", name),
            },
            Expr::Var(var) => match var.binding {
                Binding::Use(_) | Binding::Definition(_) => {
                    format!("{}.clone()", self.variable(var))
                }
                Binding::Wildcard | Binding::Unclassified => "Value::Null".to_owned(),
            },
            Expr::SelfRef => "agent.id()".to_owned(),
            Expr::Sentence(sentence) => format!(
                "Value::from(Fact::new({}, {:?}, &[{}]))",
                category(sentence),
                sentence.name,
                self.terms(&sentence.terms)
            ),
            Expr::Query(query) => {
                format!("agent.query({:?}, &[{}])", query.name, self.terms(&query.args))
            }
            Expr::Call(call) => {
                format!("{}(agent, msg{})?", self.call_path(call), self.args(&call.args))
            }
        }
    }

    /// A `&Value` for the expression, borrowing variables instead of cloning them.
    fn reference(&self, expr: &Expr) -> String {
        match expr {
            Expr::Var(var) if matches!(var.binding, Binding::Use(_)) => {
                format!("&{}", self.variable(var))
            }
            other => format!("&{}", self.expr(other)),
        }
    }

    fn terms(&self, terms: &[Expr]) -> String {
        terms
            .iter()
            .map(|term| self.expr(term))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn args(&self, args: &[Expr]) -> String {
        args.iter().map(|arg| format!(", {}", self.expr(arg))).collect()
    }

    /// Terms of a pattern, with `Value::Null` in every slot the match fills.
    fn pattern(&self, sentence: &Sentence) -> String {
        let slots = sentence.slot_positions();
        sentence
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| {
                if slots.contains(&(i as u32)) {
                    "Value::Null".to_owned()
                } else {
                    self.expr(term)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn mask(sentence: &Sentence) -> String {
        let positions = sentence
            .slot_positions()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Mask::from_positions(&[{}])", positions)
    }

    /// Rejects a candidate whose repeated variable matched different terms.
    fn check_repeats(
        sentence: &Sentence,
        fact: &str,
        depth: usize,
        fail: &Fail,
        code: &mut Code,
    ) {
        for (defined, repeated) in sentence.repeats() {
            code.line(
                depth,
                format!(
                    "if !is_equal({}.term({}), {}.term({})) {{ {} }}",
                    fact,
                    repeated,
                    fact,
                    defined,
                    fail.statement()
                ),
            );
        }
    }

    /// Binds the fresh variables of `sentence` from `fact`, and the alias to the fact itself.
    fn bind(&self, sentence: &Sentence, fact: &str, depth: usize, fail: &Fail, code: &mut Code) {
        Self::check_repeats(sentence, fact, depth, fail, code);
        for (i, term) in sentence.terms.iter().enumerate() {
            if let Expr::Var(var) = term {
                if matches!(var.binding, Binding::Definition(_)) {
                    code.line(
                        depth,
                        format!("let {} = {}.term({}).clone();", self.variable(var), fact, i),
                    );
                }
            }
        }
        if let Some(alias) = &sentence.alias {
            code.line(
                depth,
                format!("let {} = Value::from({}.clone());", self.variable(alias), fact),
            );
        }
    }

    // ------------- conditions -------------
    /// Compiles one condition at `depth`. A sentence with fresh variables
    /// opens a loop, which deepens `depth` and turns failures into `continue`.
    fn condition(
        &mut self,
        condition: &Condition,
        depth: &mut usize,
        fail: &mut Fail,
        code: &mut Code,
    ) {
        match condition {
            Condition::Sentence(sentence) if sentence.is_simple() => {
                let kb = self.kb();
                match &sentence.alias {
                    None => code.line(
                        *depth,
                        format!(
                            "if !{}.contains({}, {:?}, &[{}]) {{ {} }}",
                            kb,
                            category(sentence),
                            sentence.name,
                            self.terms(&sentence.terms),
                            fail.statement()
                        ),
                    ),
                    Some(alias) => {
                        let fact = self.temp("fact");
                        code.line(
                            *depth,
                            format!(
                                "let {} = Fact::new({}, {:?}, &[{}]);",
                                fact,
                                category(sentence),
                                sentence.name,
                                self.terms(&sentence.terms)
                            ),
                        );
                        code.line(
                            *depth,
                            format!(
                                "if !{}.contains_fact(&{}) {{ {} }}",
                                kb,
                                fact,
                                fail.statement()
                            ),
                        );
                        code.line(
                            *depth,
                            format!("let {} = Value::from({});", self.variable(alias), fact),
                        );
                    }
                }
            }
            Condition::Sentence(sentence) => {
                let kb = self.kb();
                let fact = self.temp("fact");
                code.line(
                    *depth,
                    format!(
                        "for {} in {}.match_facts({}, {:?}, &[{}], Some(&{})) {{",
                        fact,
                        kb,
                        category(sentence),
                        sentence.name,
                        self.pattern(sentence),
                        Self::mask(sentence)
                    ),
                );
                *depth += 1;
                *fail = Fail::Continue;
                self.bind(sentence, &fact, *depth, fail, code);
            }
            Condition::Comparison { lhs, op, rhs, .. } => {
                let (lhs, rhs) = (self.reference(lhs), self.reference(rhs));
                let test = match op {
                    CompareOp::Eq => format!("!is_equal({}, {})", lhs, rhs),
                    CompareOp::Ne => format!("is_equal({}, {})", lhs, rhs),
                    CompareOp::Lt => ordered(&lhs, &rhs, "is_lt"),
                    CompareOp::Le => ordered(&lhs, &rhs, "is_le"),
                    CompareOp::Gt => ordered(&lhs, &rhs, "is_gt"),
                    CompareOp::Ge => ordered(&lhs, &rhs, "is_ge"),
                };
                code.line(*depth, format!("if {} {{ {} }}", test, fail.statement()));
            }
            Condition::Action(action) => code.line(
                *depth,
                format!(
                    "if !agent.execute({:?}, &[{}]) {{ {} }}",
                    action.name,
                    self.terms(&action.args),
                    fail.statement()
                ),
            ),
        }
    }

    fn guard(&mut self, field: &Field, depth: usize, fail: &Fail, code: &mut Code) {
        let key = format!("{:?}", field.key);
        match &field.value {
            Expr::Var(var) if var.is_wildcard() => code.line(
                depth,
                format!("if !message.contains_key({}) {{ {} }}", key, fail.statement()),
            ),
            Expr::Var(var) if matches!(var.binding, Binding::Definition(_)) => code.line(
                depth,
                format!(
                    "let Some({}) = message.get({}).cloned() else {{ {} }};",
                    self.variable(var),
                    key,
                    fail.statement()
                ),
            ),
            Expr::Sentence(sentence) => {
                let fact = self.temp("fact");
                code.line(
                    depth,
                    format!(
                        "let Some({}) = message.get({}).and_then(Value::as_fact) else {{ {} }};",
                        fact,
                        key,
                        fail.statement()
                    ),
                );
                let test = if sentence.is_simple() {
                    format!(
                        "{}.equals({}, {:?}, &[{}])",
                        fact,
                        category(sentence),
                        sentence.name,
                        self.terms(&sentence.terms)
                    )
                } else {
                    format!(
                        "{}.matches({}, {:?}, &[{}], &{})",
                        fact,
                        category(sentence),
                        sentence.name,
                        self.pattern(sentence),
                        Self::mask(sentence)
                    )
                };
                code.line(depth, format!("if !{} {{ {} }}", test, fail.statement()));
                self.bind(sentence, &fact, depth, fail, code);
            }
            other => {
                let value = self.temp("field");
                code.line(
                    depth,
                    format!(
                        "let Some({}) = message.get({}) else {{ {} }};",
                        value,
                        key,
                        fail.statement()
                    ),
                );
                code.line(
                    depth,
                    format!(
                        "if !is_equal({}, {}) {{ {} }}",
                        value,
                        self.reference(other),
                        fail.statement()
                    ),
                );
            }
        }
    }

    // ------------- statements -------------
    fn block(&mut self, statements: &[Statement], depth: usize, code: &mut Code) {
        for statement in statements {
            self.statement(statement, depth, code);
        }
    }

    fn statement(&mut self, statement: &Statement, depth: usize, code: &mut Code) {
        match statement {
            Statement::If { branches, .. } => {
                let label = self.label("if");
                code.line(depth, format!("'{}: {{", label));
                for (k, branch) in branches.iter().enumerate() {
                    let last = k + 1 == branches.len();
                    match &branch.conditions {
                        Some(conditions) => {
                            let arm = format!("{}_{}", label, k);
                            let body = &branch.body;
                            self.branch(conditions, body, &label, &arm, last, depth + 1, code);
                        }
                        None => {
                            code.line(depth + 1, "{");
                            self.block(&branch.body, depth + 2, code);
                            if !last && !ends_in_return(&branch.body) {
                                code.line(depth + 2, format!("break '{};", label));
                            }
                            code.line(depth + 1, "}");
                        }
                    }
                }
                code.line(depth, "}");
            }
            Statement::Rules(rules) => {
                let label = self.label("rules");
                code.line(depth, format!("'{}: {{", label));
                for (k, rule) in rules.iter().enumerate() {
                    let last = k + 1 == rules.len();
                    self.rule(rule, &label, k, last, depth + 1, code);
                }
                code.line(depth, "}");
            }
            Statement::Let { var, value } => {
                let value = self.expr(value);
                if matches!(var.binding, Binding::Definition(_)) {
                    code.line(depth, format!("let mut {} = {};", self.variable(var), value));
                } else {
                    code.line(depth, format!("let _ = {};", value));
                }
            }
            Statement::Assign { var, value } => {
                code.line(depth, format!("{} = {};", self.variable(var), self.expr(value)));
            }
            Statement::Adopt { target, .. } => {
                let kb = self.kb();
                match target {
                    Expr::Sentence(sentence) => code.line(
                        depth,
                        format!(
                            "{}.add({}, {:?}, &[{}])?;",
                            kb,
                            category(sentence),
                            sentence.name,
                            self.terms(&sentence.terms)
                        ),
                    ),
                    other => {
                        let value = self.reference(other);
                        code.line(depth, format!("{}.add_value({})?;", kb, value))
                    }
                }
            }
            Statement::Drop { target, .. } => {
                let kb = self.kb();
                match target {
                    Expr::Sentence(sentence) if sentence.is_simple() => code.line(
                        depth,
                        format!(
                            "{}.remove({}, {:?}, &[{}])?;",
                            kb,
                            category(sentence),
                            sentence.name,
                            self.terms(&sentence.terms)
                        ),
                    ),
                    Expr::Sentence(sentence) if sentence.repeats().is_empty() => code.line(
                        depth,
                        format!(
                            "{}.remove_matching({}, {:?}, &[{}], &{})?;",
                            kb,
                            category(sentence),
                            sentence.name,
                            self.pattern(sentence),
                            Self::mask(sentence)
                        ),
                    ),
                    // a mask cannot tie two slots together, so candidates are removed one by one
                    Expr::Sentence(sentence) => {
                        let fact = self.temp("fact");
                        code.line(
                            depth,
                            format!(
                                "for {} in {}.match_facts({}, {:?}, &[{}], Some(&{})) {{",
                                fact,
                                kb,
                                category(sentence),
                                sentence.name,
                                self.pattern(sentence),
                                Self::mask(sentence)
                            ),
                        );
                        Self::check_repeats(sentence, &fact, depth + 1, &Fail::Continue, code);
                        code.line(depth + 1, format!("{}.remove_fact(&{})?;", kb, fact));
                        code.line(depth, "}");
                    }
                    other => {
                        let value = self.reference(other);
                        code.line(depth, format!("{}.remove_value({})?;", kb, value))
                    }
                }
            }
            Statement::Say { fields, .. } => {
                code.line(depth, "{");
                code.line(depth + 1, "let mut message = Message::new();");
                for field in fields {
                    code.line(
                        depth + 1,
                        format!("message.insert({:?}, {});", field.key, self.expr(&field.value)),
                    );
                }
                code.line(depth + 1, "agent.send(message);");
                code.line(depth, "}");
            }
            Statement::Action(action) => code.line(
                depth,
                format!("agent.execute({:?}, &[{}]);", action.name, self.terms(&action.args)),
            ),
            Statement::Call(call) => code.line(
                depth,
                format!("{}(agent, msg{})?;", self.call_path(call), self.args(&call.args)),
            ),
            Statement::Locked { body, .. } => {
                let kb = self.kb();
                code.line(depth, "{");
                code.line(depth + 1, format!("let _guard = {}.lock();", kb));
                self.block(body, depth + 1, code);
                code.line(depth, "}");
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.expr(value),
                    None => "Value::Null".to_owned(),
                };
                code.line(depth, format!("return Ok({});", value));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn branch(
        &mut self,
        conditions: &[Condition],
        body: &[Statement],
        label: &str,
        arm: &str,
        last: bool,
        depth: usize,
        code: &mut Code,
    ) {
        let opens_loop = conditions
            .iter()
            .any(|c| matches!(c, Condition::Sentence(s) if !s.is_simple()));
        let matched = (opens_loop && !last).then(|| format!("matched_{}", arm));

        code.line(depth, format!("'{}: {{", arm));
        let inner = depth + 1;
        if let Some(matched) = &matched {
            code.line(inner, format!("let mut {} = false;", matched));
        }
        let mut level = inner;
        let mut fail = Fail::Break(arm.to_owned());
        for condition in conditions {
            self.condition(condition, &mut level, &mut fail, code);
        }
        if let Some(matched) = &matched {
            code.line(level, format!("{} = true;", matched));
        }
        self.block(body, level, code);
        if !opens_loop && !last && !ends_in_return(body) {
            code.line(level, format!("break '{};", label));
        }
        while level > inner {
            level -= 1;
            code.line(level, "}");
        }
        if let Some(matched) = &matched {
            code.line(inner, format!("if {} {{ break '{}; }}", matched, label));
        }
        code.line(depth, "}");
    }

    fn rule(
        &mut self,
        rule: &MessageRule,
        label: &str,
        k: usize,
        last: bool,
        depth: usize,
        code: &mut Code,
    ) {
        let arm = format!("{}_{}", label, k);
        let fail = Fail::Break(arm.clone());
        code.line(depth, format!("'{}: {{", arm));
        let inner = depth + 1;
        match &rule.trigger {
            Trigger::Nothing => {
                code.line(inner, format!("if msg.is_some() {{ {} }}", fail.statement()))
            }
            Trigger::Message(fields) => {
                code.line(
                    inner,
                    format!("let Some(message) = msg else {{ {} }};", fail.statement()),
                );
                for field in fields {
                    self.guard(field, inner, &fail, code);
                }
            }
        }
        self.block(&rule.body, inner, code);
        if !last && !ends_in_return(&rule.body) {
            code.line(inner, format!("break '{};", label));
        }
        code.line(depth, "}");
    }
}

fn ends_in_return(body: &[Statement]) -> bool {
    body.last().is_some_and(|s| s.last_return().is_some())
}

// the negated ordering test of a comparison; incomparable values fail it
fn ordered(lhs: &str, rhs: &str, test: &str) -> String {
    format!("!compare({}, {}).is_some_and(|o| o.{}())", lhs, rhs, test)
}

fn category(sentence: &Sentence) -> u32 {
    sentence.category.unwrap_or_default()
}

fn int_literal(i: i64) -> String {
    if i == i64::MIN {
        "i64::MIN".to_owned()
    } else {
        i.to_string()
    }
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        "f64::NAN".to_owned()
    } else if x == f64::INFINITY {
        "f64::INFINITY".to_owned()
    } else if x == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_owned()
    } else {
        format!("{:?}", x)
    }
}

fn literal_value(literal: &Literal) -> String {
    match literal {
        Literal::Int(i) => format!("Value::Int({})", int_literal(*i)),
        Literal::Float(x) => format!("Value::Float({})", float_literal(*x)),
        Literal::Str(s) | Literal::Opaque(s) => format!("Value::from({:?})", s),
    }
}
