// A second checked-in module, exercising the matching paths the committed
// choice module leaves out: nested loops, repeated variables, masked drops,
// guards over known variables and initial facts that need the agent.
use agentc::compile;
use agentc::config::GeneratorOptions;
use agentc::error::Position;
use agentc::runtime::{Agent, Fact, KnowledgeBase, Mask, Message, Value};
use agentc::term::{
    Branch, CompareOp, Condition, Expr, Field, Invocation, MessageRule, Sentence, Statement,
    Trigger, Variable,
};
use agentc::tree::ProgramTree;
use parking_lot::Mutex;

mod generated {
    include!("fixtures/matching.rs");
}

fn link(from: Expr, to: Expr) -> Sentence {
    Sentence::new("believes", "link", vec![from, to])
}

fn program() -> ProgramTree {
    let at = Position::default();
    let mut tree = ProgramTree::new();
    tree.declare_attitude("believes", 0, at).unwrap();
    tree.declare_attitude("intends", 1, at).unwrap();
    tree.add_ground_fact(Sentence::new(
        "believes",
        "home",
        vec![Expr::SelfRef, Expr::Query(Invocation::new("weather", vec![]))],
    ));
    for (from, to) in [("a", "b"), ("b", "c"), ("c", "c"), ("a", "c")] {
        tree.add_ground_fact(link(Expr::str(from), Expr::str(to)));
    }
    tree.add_ground_fact(Sentence::new(
        "believes",
        "start",
        vec![Expr::Call(Invocation::new("origin", vec![]))],
    ));

    let origin = vec![Statement::ret(Some(Expr::str("a")))];
    tree.declare_procedure("origin", vec![], Some(origin), at).unwrap();

    let walk = vec![
        Statement::let_("last", Expr::str("none")),
        Statement::if_else(vec![Branch::when(
            vec![
                Condition::Sentence(link(Expr::var("x"), Expr::var("y"))),
                Condition::Sentence(link(Expr::var("y"), Expr::var("z"))),
                Condition::compare(Expr::var("x"), CompareOp::Ne, Expr::var("z")),
            ],
            vec![
                Statement::action("path", vec![Expr::var("x"), Expr::var("z")]),
                Statement::assign("last", Expr::var("z")),
            ],
        )]),
        Statement::if_else(vec![Branch::when(
            vec![Condition::Sentence(
                link(Expr::str("c"), Expr::str("c")).aliased(Variable::named("cyc")),
            )],
            vec![Statement::Drop {
                target: Expr::var("cyc"),
                pos: at,
            }],
        )]),
        Statement::ret(Some(Expr::var("last"))),
    ];
    tree.declare_procedure("walk", vec![], Some(walk), at).unwrap();

    let cycles = vec![
        Statement::if_else(vec![Branch::when(
            vec![Condition::Sentence(link(Expr::var("n"), Expr::var("n")))],
            vec![Statement::action("cycle", vec![Expr::var("n")])],
        )]),
        Statement::drop(link(Expr::var("m"), Expr::var("m"))),
        Statement::drop(link(Expr::str("a"), Expr::var("to"))),
    ];
    tree.declare_procedure("cycles", vec![], Some(cycles), at).unwrap();

    let about = Sentence::new("believes", "home", vec![Expr::var("me"), Expr::var("w")]);
    let greet = vec![
        Statement::let_("me", Expr::SelfRef),
        Statement::Rules(vec![
            MessageRule::new(
                Trigger::Message(vec![
                    Field::new("from", Expr::var("sender")),
                    Field::new("about", Expr::sentence(about)),
                ]),
                vec![
                    Statement::adopt(Sentence::new(
                        "intends",
                        "told",
                        vec![Expr::var("sender"), Expr::var("w")],
                    )),
                    Statement::ret(Some(Expr::var("w"))),
                ],
            ),
            MessageRule::new(Trigger::Nothing, vec![Statement::ret(Some(Expr::str("quiet")))]),
        ]),
    ];
    tree.declare_procedure("greet", vec![], Some(greet), at).unwrap();
    tree
}

struct TestAgent {
    kb: KnowledgeBase,
    actions: Mutex<Vec<(String, Value)>>,
}

impl TestAgent {
    fn new() -> Self {
        let agent = Self {
            kb: generated::new_knowledge_base(),
            actions: Mutex::new(Vec::new()),
        };
        generated::init_knowledge_base(&agent).unwrap();
        agent
    }
    fn actions(&self, name: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .actions
            .lock()
            .iter()
            .filter(|(action, _)| action == name)
            .map(|(_, param)| param.to_string())
            .collect();
        found.sort();
        found
    }
    fn links(&self) -> Vec<(String, String)> {
        let mut links: Vec<(String, String)> = self
            .kb
            .match_facts(0, "link", &[Value::Null, Value::Null], Some(&Mask::all(2)))
            .iter()
            .map(|f| (f.term(0).to_string(), f.term(1).to_string()))
            .collect();
        links.sort();
        links
    }
}

impl Agent for TestAgent {
    fn id(&self) -> Value {
        Value::from("agent-7")
    }
    fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }
    fn execute(&self, action: &str, params: &[Value]) -> bool {
        let last = params.last().cloned().unwrap_or_default();
        self.actions.lock().push((action.to_owned(), last));
        true
    }
    fn query(&self, name: &str, _params: &[Value]) -> Value {
        match name {
            "weather" => Value::from("sunny"),
            _ => Value::Null,
        }
    }
    fn send(&self, _message: Message) {}
}

fn strip(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

fn pair(a: &str, b: &str) -> (String, String) {
    (Value::from(a).to_string(), Value::from(b).to_string())
}

#[test]
fn generated_module_matches_checked_in_copy() {
    let mut tree = program();
    let code = compile(&mut tree, &GeneratorOptions::default()).unwrap();
    assert_eq!(strip(&code), strip(include_str!("fixtures/matching.rs")));
}

#[test]
fn initial_facts_come_from_the_agent() {
    let agent = TestAgent::new();
    assert_eq!(agent.kb.size(), 6);
    assert!(agent.kb.contains(0, "home", &[Value::from("agent-7"), Value::from("sunny")]));
    assert!(agent.kb.contains(0, "start", &[Value::from("a")]));
}

#[test]
fn nested_loops_see_the_outer_binding() {
    let agent = TestAgent::new();
    let last = generated::walk(&agent, None).unwrap();
    // every two step path that does not end where it started
    let paths = agent.actions.lock().clone();
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|(action, z)| action == "path" && *z == Value::from("c")));
    // the assignment reached the variable declared outside the loops
    assert_eq!(last, Value::from("c"));
    // the aliased condition found the self link and dropped it
    assert!(!agent.kb.contains(0, "link", &[Value::from("c"), Value::from("c")]));
    assert_eq!(agent.kb.size(), 5);
}

#[test]
fn repeated_variables_only_match_equal_terms() {
    let agent = TestAgent::new();
    agent.kb.add(0, "link", &[Value::from("b"), Value::from("b")]).unwrap();
    generated::cycles(&agent, None).unwrap();
    assert_eq!(
        agent.actions("cycle"),
        vec![Value::from("b").to_string(), Value::from("c").to_string()]
    );
    // both self links went, then everything leaving a
    assert_eq!(agent.links(), vec![pair("b", "c")]);
    assert_eq!(agent.kb.size(), 3);
}

#[test]
fn guard_pattern_uses_a_known_variable() {
    let agent = TestAgent::new();
    assert_eq!(generated::greet(&agent, None).unwrap(), Value::from("quiet"));

    let mut message = Message::new();
    message.insert("from", Value::from("u1"));
    message.insert(
        "about",
        Value::from(Fact::new(0, "home", &[Value::from("agent-7"), Value::from("rainy")])),
    );
    assert_eq!(generated::greet(&agent, Some(&message)).unwrap(), Value::from("rainy"));
    assert!(agent.kb.contains(1, "told", &[Value::from("u1"), Value::from("rainy")]));

    // someone else's home does not match, and no later rule takes a message
    let mut other = Message::new();
    other.insert("from", Value::from("u2"));
    other.insert(
        "about",
        Value::from(Fact::new(0, "home", &[Value::from("u2"), Value::from("snow")])),
    );
    assert_eq!(generated::greet(&agent, Some(&other)).unwrap(), Value::Null);
    assert!(!agent.kb.contains(1, "told", &[Value::from("u2"), Value::from("snow")]));
}
