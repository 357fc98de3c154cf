//! Everything generated code refers to.
//!
//! A generated procedure only sees an [`Agent`]: its identity, its
//! knowledge base, and the three capabilities of acting, asking and
//! talking. [`Host`] assembles an agent from separate implementations of
//! those capabilities.
use std::sync::Arc;

pub use crate::datatype::{compare, is_equal, Fact, Mask, Value};
pub use crate::error::StoreError;
pub use crate::store::KnowledgeBase;

/// Carries out named actions, such as moving a unit.
pub trait Actuator: Send + Sync {
    /// Returns whether the action succeeded.
    fn execute(&self, action: &str, params: &[Value]) -> bool;
}

/// Answers named queries about the world outside the knowledge base.
pub trait Investigator: Send + Sync {
    fn query(&self, name: &str, params: &[Value]) -> Value;
}

/// Delivers messages to other agents.
pub trait Messenger: Send + Sync {
    fn send(&self, message: Message);
}

pub trait Agent {
    fn id(&self) -> Value;
    fn knowledge_base(&self) -> &KnowledgeBase;
    fn execute(&self, action: &str, params: &[Value]) -> bool;
    fn query(&self, name: &str, params: &[Value]) -> Value;
    fn send(&self, message: Message);
}

// ------------- Message -------------
/// A message between agents: string keys in insertion order, each with a
/// value. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    entries: Vec<(Arc<str>, Value)>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut message = Message::new();
        for (key, value) in iter {
            message.insert(key, value);
        }
        message
    }
}

// ------------- Host -------------
/// An agent made of a knowledge base and pluggable capabilities.
pub struct Host {
    id: Value,
    knowledge_base: KnowledgeBase,
    actuator: Arc<dyn Actuator>,
    investigator: Arc<dyn Investigator>,
    messenger: Arc<dyn Messenger>,
}

impl Host {
    pub fn new(
        id: Value,
        knowledge_base: KnowledgeBase,
        actuator: Arc<dyn Actuator>,
        investigator: Arc<dyn Investigator>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            id,
            knowledge_base,
            actuator,
            investigator,
            messenger,
        }
    }
}

impl Agent for Host {
    fn id(&self) -> Value {
        self.id.clone()
    }
    fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }
    fn execute(&self, action: &str, params: &[Value]) -> bool {
        self.actuator.execute(action, params)
    }
    fn query(&self, name: &str, params: &[Value]) -> Value {
        self.investigator.query(name, params)
    }
    fn send(&self, message: Message) {
        self.messenger.send(message)
    }
}
