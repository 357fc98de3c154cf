use std::sync::Arc;

use agentc::runtime::{Actuator, Agent, Host, Investigator, Message, Messenger, Value};
use parking_lot::Mutex;

mod generated {
    include!("fixtures/committed_choice.rs");
}

#[derive(Default)]
struct Recorder {
    actions: Mutex<Vec<String>>,
    outbox: Mutex<Vec<Message>>,
}

impl Actuator for Recorder {
    fn execute(&self, action: &str, _params: &[Value]) -> bool {
        self.actions.lock().push(action.to_owned());
        action != "fail"
    }
}

impl Investigator for Recorder {
    fn query(&self, name: &str, params: &[Value]) -> Value {
        Value::from(format!("{}/{}", name, params.len()))
    }
}

impl Messenger for Recorder {
    fn send(&self, message: Message) {
        self.outbox.lock().push(message);
    }
}

fn setup() -> (Host, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let host = Host::new(
        Value::from("h1"),
        generated::new_knowledge_base(),
        recorder.clone(),
        recorder.clone(),
        recorder.clone(),
    );
    generated::init_knowledge_base(&host).expect("initial facts");
    (host, recorder)
}

#[test]
fn host_forwards_capabilities() {
    let (host, recorder) = setup();
    assert_eq!(host.id(), Value::from("h1"));
    assert_eq!(host.knowledge_base().size(), 4);
    assert_eq!(host.knowledge_base().categories(), 2);
    assert!(host.execute("move", &[]));
    assert!(!host.execute("fail", &[]));
    assert_eq!(host.query("weather", &[Value::Int(1)]), Value::from("weather/1"));
    assert_eq!(*recorder.actions.lock(), vec!["move".to_owned(), "fail".to_owned()]);
}

#[test]
fn generated_procedure_runs_on_a_host() {
    let (host, recorder) = setup();
    let result = generated::announce(&host, None, Value::from("u7")).expect("runs");
    assert_eq!(result, Value::Null);
    assert!(host.knowledge_base().contains(0, "seen", &[Value::from("u7")]));

    let outbox = recorder.outbox.lock();
    assert_eq!(outbox.len(), 1);
    let sent: Vec<(&str, &Value)> = outbox[0].iter().collect();
    assert_eq!(sent, vec![("to", &Value::from("u7")), ("from", &Value::from("h1"))]);
}

#[test]
fn message_keys_keep_their_place() {
    let mut message = Message::new();
    assert!(message.is_empty());
    assert_eq!(message.insert("a", Value::Int(1)), None);
    message.insert("b", Value::Int(2));
    assert_eq!(message.insert("a", Value::Int(3)), Some(Value::Int(1)));
    let keys: Vec<&str> = message.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(message.get("a"), Some(&Value::Int(3)));
    assert!(message.contains_key("b"));
    assert!(!message.contains_key("c"));
    assert_eq!(message.len(), 2);
}
