//! The indexed fact store generated code runs against.
//!
//! Facts are kept per category, and within a category per predicate name,
//! as sets of term tuples. The category and name form the index key and are
//! not repeated in the tuple, so point operations only ever touch one bucket:
//!
//! ```text
//! category -> name -> { (t1, t2, ..), (t1, t2, ..), .. }
//! ```
//!
//! Every operation runs under one reentrant lock. The same lock is handed
//! out through [`KnowledgeBase::lock`] so that a sequence of operations can
//! be made atomic, while the operations themselves still go through.
use std::cell::RefCell;

// we will use a fast hashing algo for the name index and the tuple sets
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// one coarse lock that the owning thread may take again
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use tracing::{debug, trace};

use crate::datatype::{match_terms, Fact, Mask, Tuple, Value};
use crate::error::StoreError;

pub type NameHasher = BuildHasherDefault<SeaHasher>;
pub type TupleHasher = BuildHasherDefault<SeaHasher>;

type Bucket = HashSet<Tuple, TupleHasher>;
type Category = HashMap<Arc<str>, Bucket, NameHasher>;

// ------------- Base -------------
#[derive(Debug)]
struct Base {
    categories: Vec<Category>,
    size: usize,
    mutations: u64,
}

impl Base {
    fn new(categories: usize) -> Self {
        Self {
            categories: (0..categories).map(|_| Category::default()).collect(),
            size: 0,
            mutations: 0,
        }
    }
    fn category(&self, category: u32) -> Option<&Category> {
        self.categories.get(category as usize)
    }
    fn category_mut(&mut self, category: u32) -> Result<&mut Category, StoreError> {
        let categories = self.categories.len();
        self.categories
            .get_mut(category as usize)
            .ok_or(StoreError::InvalidCategory {
                category,
                categories,
            })
    }
    fn add(&mut self, category: u32, name: &str, terms: &[Value]) -> Result<bool, StoreError> {
        let index = self.category_mut(category)?;
        let added = match index.get_mut(name) {
            Some(bucket) => {
                if bucket.contains(terms) {
                    false
                } else {
                    bucket.insert(Tuple::from(terms))
                }
            }
            None => {
                let mut bucket = Bucket::default();
                bucket.insert(Tuple::from(terms));
                index.insert(Arc::from(name), bucket);
                true
            }
        };
        if added {
            self.size += 1;
            self.mutations += 1;
        }
        Ok(added)
    }
    fn remove(&mut self, category: u32, name: &str, terms: &[Value]) -> Result<bool, StoreError> {
        let index = self.category_mut(category)?;
        let Some(bucket) = index.get_mut(name) else {
            return Ok(false);
        };
        let removed = bucket.remove(terms);
        if bucket.is_empty() {
            index.remove(name);
        }
        if removed {
            self.size -= 1;
            self.mutations += 1;
        }
        Ok(removed)
    }
    fn remove_matching(
        &mut self,
        category: u32,
        name: &str,
        terms: &[Value],
        mask: &Mask,
    ) -> Result<usize, StoreError> {
        let index = self.category_mut(category)?;
        let Some(bucket) = index.get_mut(name) else {
            return Ok(0);
        };
        let before = bucket.len();
        bucket.retain(|tuple| !match_terms(tuple, terms, mask));
        let removed = before - bucket.len();
        if bucket.is_empty() {
            index.remove(name);
        }
        self.size -= removed;
        self.mutations += removed as u64;
        Ok(removed)
    }
    fn contains(&self, category: u32, name: &str, terms: &[Value]) -> bool {
        self.category(category)
            .and_then(|index| index.get(name))
            .is_some_and(|bucket| bucket.contains(terms))
    }
    fn match_facts(
        &self,
        category: u32,
        name: &str,
        terms: &[Value],
        mask: Option<&Mask>,
    ) -> Vec<Fact> {
        let Some((key, bucket)) = self
            .category(category)
            .and_then(|index| index.get_key_value(name))
        else {
            return Vec::new();
        };
        match mask {
            Some(mask) => bucket
                .iter()
                .filter(|tuple| match_terms(tuple, terms, mask))
                .map(|tuple| Fact::from_parts(category, Arc::clone(key), Arc::clone(tuple)))
                .collect(),
            None => bucket
                .get(terms)
                .map(|tuple| Fact::from_parts(category, Arc::clone(key), Arc::clone(tuple)))
                .into_iter()
                .collect(),
        }
    }
    fn facts(&self) -> Vec<Fact> {
        let mut facts = Vec::with_capacity(self.size);
        for (category, index) in self.categories.iter().enumerate() {
            for (name, bucket) in index {
                for tuple in bucket {
                    facts.push(Fact::from_parts(
                        category as u32,
                        Arc::clone(name),
                        Arc::clone(tuple),
                    ));
                }
            }
        }
        facts
    }
}

// ------------- KnowledgeBase -------------
/// An agent's fact store.
///
/// Categories are the attitude ids of the program and must be below the
/// count given at construction. Queries against an unknown category or name
/// simply find nothing; mutations against an unknown category fail.
#[derive(Debug)]
pub struct KnowledgeBase {
    state: ReentrantMutex<RefCell<Base>>,
}

impl KnowledgeBase {
    pub fn new(categories: usize) -> Self {
        debug!("Creating knowledge base with {} categories", categories);
        Self {
            state: ReentrantMutex::new(RefCell::new(Base::new(categories))),
        }
    }
    /// Adds a fact, returning false if it was already present.
    pub fn add(&self, category: u32, name: &str, terms: &[Value]) -> Result<bool, StoreError> {
        let state = self.state.lock();
        let added = state.borrow_mut().add(category, name, terms)?;
        trace!("add [{}]{} {:?} -> {}", category, name, terms, added);
        Ok(added)
    }
    /// Removes a fact, returning false if it was not present.
    pub fn remove(&self, category: u32, name: &str, terms: &[Value]) -> Result<bool, StoreError> {
        let state = self.state.lock();
        let removed = state.borrow_mut().remove(category, name, terms)?;
        trace!("remove [{}]{} {:?} -> {}", category, name, terms, removed);
        Ok(removed)
    }
    /// Removes every fact of the bucket that matches `terms` outside `mask`
    /// and returns how many went.
    pub fn remove_matching(
        &self,
        category: u32,
        name: &str,
        terms: &[Value],
        mask: &Mask,
    ) -> Result<usize, StoreError> {
        let state = self.state.lock();
        let removed = state
            .borrow_mut()
            .remove_matching(category, name, terms, mask)?;
        trace!("remove_matching [{}]{} -> {}", category, name, removed);
        Ok(removed)
    }
    pub fn contains(&self, category: u32, name: &str, terms: &[Value]) -> bool {
        let state = self.state.lock();
        let found = state.borrow().contains(category, name, terms);
        found
    }
    /// Every stored fact of the bucket whose arity equals the pattern's and
    /// whose terms equal it at every position not set in `mask`.
    ///
    /// Without a mask this is an existence check and the result holds at
    /// most one fact.
    pub fn match_facts(
        &self,
        category: u32,
        name: &str,
        terms: &[Value],
        mask: Option<&Mask>,
    ) -> Vec<Fact> {
        let state = self.state.lock();
        let facts = state.borrow().match_facts(category, name, terms, mask);
        facts
    }

    pub fn add_fact(&self, fact: &Fact) -> Result<bool, StoreError> {
        self.add(fact.category(), fact.name(), fact.terms())
    }
    pub fn remove_fact(&self, fact: &Fact) -> Result<bool, StoreError> {
        self.remove(fact.category(), fact.name(), fact.terms())
    }
    pub fn contains_fact(&self, fact: &Fact) -> bool {
        self.contains(fact.category(), fact.name(), fact.terms())
    }
    pub fn match_fact(&self, fact: &Fact, mask: Option<&Mask>) -> Vec<Fact> {
        self.match_facts(fact.category(), fact.name(), fact.terms(), mask)
    }
    pub fn remove_matching_fact(&self, fact: &Fact, mask: &Mask) -> Result<usize, StoreError> {
        self.remove_matching(fact.category(), fact.name(), fact.terms(), mask)
    }
    /// Adds a value that has to hold a fact.
    pub fn add_value(&self, value: &Value) -> Result<bool, StoreError> {
        match value {
            Value::Fact(fact) => self.add_fact(fact),
            other => Err(StoreError::NotAFact(other.to_string())),
        }
    }
    /// Removes a value that has to hold a fact.
    pub fn remove_value(&self, value: &Value) -> Result<bool, StoreError> {
        match value {
            Value::Fact(fact) => self.remove_fact(fact),
            other => Err(StoreError::NotAFact(other.to_string())),
        }
    }

    pub fn size(&self) -> usize {
        let state = self.state.lock();
        let size = state.borrow().size;
        size
    }
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
    pub fn categories(&self) -> usize {
        let state = self.state.lock();
        let categories = state.borrow().categories.len();
        categories
    }
    /// Number of facts added or removed since construction.
    pub fn mutations(&self) -> u64 {
        let state = self.state.lock();
        let mutations = state.borrow().mutations;
        mutations
    }
    pub fn clear(&self) {
        let state = self.state.lock();
        let mut base = state.borrow_mut();
        let dropped = base.size;
        base.categories.iter_mut().for_each(Category::clear);
        base.size = 0;
        base.mutations += dropped as u64;
        debug!("Cleared {} facts", dropped);
    }
    /// Takes the store lock until the guard is dropped. Operations on the
    /// store from the same thread still go through while it is held.
    pub fn lock(&self) -> KbGuard<'_> {
        KbGuard {
            kb: self,
            _lock: self.state.lock(),
        }
    }
}

// ------------- KbGuard -------------
pub struct KbGuard<'a> {
    kb: &'a KnowledgeBase,
    _lock: ReentrantMutexGuard<'a, RefCell<Base>>,
}

impl<'a> KbGuard<'a> {
    pub fn knowledge_base(&self) -> &'a KnowledgeBase {
        self.kb
    }
    /// Walks every fact in the store. The facts are taken when the cursor
    /// is created; the lock stays held for as long as the guard lives.
    pub fn cursor(&self) -> Cursor<'a> {
        let pending = self.kb.state.lock().borrow().facts();
        Cursor {
            kb: self.kb,
            pending: pending.into_iter(),
            current: None,
        }
    }
}

// ------------- Cursor -------------
pub struct Cursor<'a> {
    kb: &'a KnowledgeBase,
    pending: std::vec::IntoIter<Fact>,
    current: Option<Fact>,
}

impl Cursor<'_> {
    /// Removes the fact most recently returned by `next`.
    pub fn remove(&mut self) -> Result<(), StoreError> {
        let fact = self.current.take().ok_or(StoreError::NothingToRemove)?;
        self.kb.remove_fact(&fact)?;
        Ok(())
    }
}

impl Iterator for Cursor<'_> {
    type Item = Fact;

    fn next(&mut self) -> Option<Fact> {
        self.current = self.pending.next();
        self.current.clone()
    }
}
