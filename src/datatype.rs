// used to hash names and strings into the fact hash fold
use seahash::hash as sea;

// masks are small sets of term positions
use roaring::RoaringBitmap;

// used to print out readable forms of a value
use std::fmt;
// values and facts need hand written equality, ordering and hashing
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A stored term list. Shared between the bucket that holds it and every
/// fact handed out for it.
pub type Tuple = Arc<[Value]>;

/// A runtime term: what facts are made of and what variables hold.
///
/// Equality is structural and null-safe. Floats are compared by bit pattern,
/// so `NaN` equals itself and `0.0` differs from `-0.0`; this keeps `Eq` and
/// `Hash` consistent for use as set members.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Fact(Fact),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Value::Fact(f) => Some(f),
            _ => None,
        }
    }
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    /// Contribution of this value to a fact's hash fold. Null contributes 0.
    pub fn fold_hash(&self) -> u64 {
        match self {
            Value::Null => 0,
            Value::Int(i) => *i as u64,
            Value::Float(x) => x.to_bits(),
            Value::Str(s) => sea(s.as_bytes()),
            Value::Fact(f) => f.hash_code(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Fact(a), Value::Fact(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fold_hash());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Fact(fact) => write!(f, "{}", fact),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}
impl From<Fact> for Value {
    fn from(f: Fact) -> Self {
        Value::Fact(f)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

/// Orders two values when they are comparable: numbers with numbers
/// (ints and floats mix), strings with strings. Anything else is `None`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Null-safe structural equality, as used by guards and `==` comparisons.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    a == b
}

// ------------- Mask -------------
/// Term positions to leave out of a match. A set bit marks a variable
/// position; clear positions must equal the pattern.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mask {
    positions: RoaringBitmap,
}

impl Mask {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_positions(positions: &[u32]) -> Self {
        Self {
            positions: positions.iter().copied().collect(),
        }
    }
    /// A mask with every position below `arity` set.
    pub fn all(arity: usize) -> Self {
        Self {
            positions: (0..arity as u32).collect(),
        }
    }
    pub fn set(&mut self, position: u32) {
        self.positions.insert(position);
    }
    pub fn is_set(&self, position: usize) -> bool {
        u32::try_from(position).is_ok_and(|p| self.positions.contains(p))
    }
    pub fn clear(&mut self) {
        self.positions.clear();
    }
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
    pub fn len(&self) -> u64 {
        self.positions.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.positions.iter()
    }
}

/// Compares two term lists, skipping the positions set in `mask`.
/// Lists of different length never match.
pub fn match_terms(stored: &[Value], pattern: &[Value], mask: &Mask) -> bool {
    if stored.len() != pattern.len() {
        return false;
    }
    stored
        .iter()
        .zip(pattern.iter())
        .enumerate()
        .all(|(i, (s, p))| mask.is_set(i) || s == p)
}

// ------------- Fact -------------
#[derive(Debug)]
struct FactData {
    category: u32,
    name: Arc<str>,
    terms: Tuple,
    hash: u64,
}

/// An immutable ground fact: category, interned predicate name and terms.
///
/// The structural hash is computed once, when the fact is created, as a
/// base 31 polynomial fold over category, name and terms.
#[derive(Clone, Debug)]
pub struct Fact {
    data: Arc<FactData>,
}

impl Fact {
    pub fn new(category: u32, name: &str, terms: &[Value]) -> Self {
        Self::from_parts(category, Arc::from(name), Tuple::from(terms))
    }
    /// Builds a fact around a name and tuple that are already shared.
    pub(crate) fn from_parts(category: u32, name: Arc<str>, terms: Tuple) -> Self {
        let hash = fold(category, &name, &terms);
        Self {
            data: Arc::new(FactData {
                category,
                name,
                terms,
                hash,
            }),
        }
    }
    pub fn category(&self) -> u32 {
        self.data.category
    }
    pub fn name(&self) -> &str {
        &self.data.name
    }
    pub fn interned_name(&self) -> &Arc<str> {
        &self.data.name
    }
    pub fn arity(&self) -> usize {
        self.data.terms.len()
    }
    /// # Panics
    /// If `index` is not below the arity.
    pub fn term(&self, index: usize) -> &Value {
        &self.data.terms[index]
    }
    pub fn terms(&self) -> &[Value] {
        &self.data.terms
    }
    pub fn tuple(&self) -> &Tuple {
        &self.data.terms
    }
    pub fn hash_code(&self) -> u64 {
        self.data.hash
    }
    /// True if this fact has the given category, name and exactly these terms.
    pub fn equals(&self, category: u32, name: &str, terms: &[Value]) -> bool {
        self.data.category == category && &*self.data.name == name && *self.data.terms == *terms
    }
    /// True if category and name are equal and the terms match outside `mask`.
    pub fn matches(&self, category: u32, name: &str, terms: &[Value], mask: &Mask) -> bool {
        self.data.category == category
            && &*self.data.name == name
            && match_terms(&self.data.terms, terms, mask)
    }
}

fn fold(category: u32, name: &str, terms: &[Value]) -> u64 {
    let mut hash = (category as u64)
        .wrapping_mul(31)
        .wrapping_add(sea(name.as_bytes()));
    for term in terms {
        hash = hash.wrapping_mul(31).wrapping_add(term.fold_hash());
    }
    hash
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.data, &other.data) {
            return true;
        }
        self.data.hash == other.data.hash
            && self.equals(other.data.category, &other.data.name, &other.data.terms)
    }
}
impl Eq for Fact {}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.data.hash);
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]{}(", self.data.category, self.data.name)?;
        for (i, term) in self.data.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", term)?;
        }
        write!(f, ")")
    }
}
