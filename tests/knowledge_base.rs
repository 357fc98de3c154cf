use agentc::error::StoreError;
use agentc::runtime::{Fact, KnowledgeBase, Mask, Value};

fn at(x: i64, y: i64) -> [Value; 3] {
    [Value::from("unit"), Value::Int(x), Value::Int(y)]
}

fn setup() -> KnowledgeBase {
    let kb = KnowledgeBase::new(2);
    kb.add(0, "at", &at(1, 1)).expect("add ok");
    kb.add(0, "at", &at(1, 2)).expect("add ok");
    kb.add(0, "at", &at(2, 2)).expect("add ok");
    kb.add(0, "owner", &[Value::from("unit"), Value::from("red")]).expect("add ok");
    kb.add(1, "at", &at(9, 9)).expect("add ok");
    kb
}

#[test]
fn add_contains_remove() {
    let kb = setup();
    assert_eq!(kb.size(), 5);
    assert!(kb.contains(0, "at", &at(1, 2)));
    // same predicate under another category is a different fact
    assert!(!kb.contains(1, "at", &at(1, 2)));
    assert!(kb.remove(0, "at", &at(1, 2)).unwrap());
    assert!(!kb.contains(0, "at", &at(1, 2)));
    assert!(!kb.remove(0, "at", &at(1, 2)).unwrap());
    assert_eq!(kb.size(), 4);
}

#[test]
fn duplicate_add_is_a_no_op() {
    let kb = setup();
    let before = kb.mutations();
    assert!(!kb.add(0, "at", &at(1, 1)).unwrap());
    assert_eq!(kb.size(), 5);
    assert_eq!(kb.mutations(), before);
}

#[test]
fn null_terms_are_ordinary_values() {
    let kb = KnowledgeBase::new(1);
    assert!(kb.add(0, "maybe", &[Value::Null, Value::Int(1)]).unwrap());
    assert!(kb.contains(0, "maybe", &[Value::Null, Value::Int(1)]));
    assert!(!kb.contains(0, "maybe", &[Value::Int(1), Value::Null]));
}

#[test]
fn invalid_category() {
    let kb = setup();
    let err = kb.add(7, "at", &at(1, 1)).unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidCategory {
            category: 7,
            categories: 2
        }
    );
    assert!(kb.remove(2, "at", &at(1, 1)).is_err());
    // queries simply find nothing
    assert!(!kb.contains(7, "at", &at(1, 1)));
    assert!(kb.match_facts(7, "at", &at(1, 1), Some(&Mask::all(3))).is_empty());
    assert_eq!(kb.size(), 5);
}

#[test]
fn masked_match() {
    let kb = setup();
    let mut xs: Vec<i64> = kb
        .match_facts(
            0,
            "at",
            &[Value::from("unit"), Value::Null, Value::Int(2)],
            Some(&Mask::from_positions(&[1])),
        )
        .iter()
        .map(|f| f.term(1).as_int().unwrap())
        .collect();
    xs.sort();
    assert_eq!(xs, vec![1, 2]);

    // every fact has the queried category and name
    for fact in kb.match_facts(0, "at", &at(0, 0), Some(&Mask::from_positions(&[1, 2]))) {
        assert_eq!(fact.category(), 0);
        assert_eq!(fact.name(), "at");
    }
}

#[test]
fn mask_extremes() {
    let kb = setup();
    // nothing masked is an existence check
    let found = kb.match_facts(0, "at", &at(2, 2), Some(&Mask::new()));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0], Fact::new(0, "at", &at(2, 2)));
    assert!(kb.match_facts(0, "at", &at(3, 3), Some(&Mask::new())).is_empty());
    // everything masked is the whole bucket
    assert_eq!(kb.match_facts(0, "at", &at(0, 0), Some(&Mask::all(3))).len(), 3);
    // without a mask at most one fact comes back
    assert_eq!(kb.match_facts(0, "at", &at(1, 1), None).len(), 1);
    assert!(kb.match_facts(0, "at", &at(0, 0), None).is_empty());
}

#[test]
fn arity_must_agree() {
    let kb = setup();
    let short = [Value::from("unit"), Value::Null];
    assert!(kb.match_facts(0, "at", &short, Some(&Mask::all(2))).is_empty());
    assert!(kb.match_facts(0, "nowhere", &at(0, 0), Some(&Mask::all(3))).is_empty());
}

#[test]
fn masked_removal() {
    let kb = setup();
    let pattern = [Value::from("unit"), Value::Int(1), Value::Null];
    let removed = kb
        .remove_matching(0, "at", &pattern, &Mask::from_positions(&[2]))
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(kb.size(), 3);
    assert!(kb.contains(0, "at", &at(2, 2)));
    // an emptied bucket goes away, and matching it again removes nothing
    assert_eq!(kb.remove_matching(0, "at", &at(0, 0), &Mask::all(3)).unwrap(), 1);
    assert_eq!(kb.remove_matching(0, "at", &at(0, 0), &Mask::all(3)).unwrap(), 0);
    assert_eq!(kb.size(), 2);
}

#[test]
fn fact_and_value_overloads() {
    let kb = setup();
    let fact = Fact::new(1, "goal", &[Value::from("paris")]);
    assert!(kb.add_fact(&fact).unwrap());
    assert!(kb.contains_fact(&fact));
    assert_eq!(kb.match_fact(&fact, None), vec![fact.clone()]);
    assert!(kb.remove_value(&Value::from(fact.clone())).unwrap());
    assert!(!kb.contains_fact(&fact));
    assert!(kb.add_value(&Value::from(fact.clone())).unwrap());
    assert_eq!(kb.remove_matching_fact(&fact, &Mask::all(1)).unwrap(), 1);

    let err = kb.add_value(&Value::Int(3)).unwrap_err();
    assert!(matches!(err, StoreError::NotAFact(_)));
    assert!(kb.remove_value(&Value::Null).is_err());
}

#[test]
fn cursor_walks_and_removes() {
    let kb = setup();
    {
        let guard = kb.lock();
        let mut cursor = guard.cursor();
        assert_eq!(cursor.remove().unwrap_err(), StoreError::NothingToRemove);
        let mut seen = 0;
        while let Some(fact) = cursor.next() {
            seen += 1;
            if fact.name() == "at" && fact.category() == 0 {
                cursor.remove().expect("remove ok");
                assert_eq!(cursor.remove().unwrap_err(), StoreError::NothingToRemove);
            }
        }
        assert_eq!(seen, 5);
    }
    assert_eq!(kb.size(), 2);
    assert!(kb.match_facts(0, "at", &at(0, 0), Some(&Mask::all(3))).is_empty());
    assert!(kb.contains(1, "at", &at(9, 9)));
}

#[test]
fn lock_is_reentrant() {
    let kb = setup();
    let _guard = kb.lock();
    // operations on the same thread still go through while the guard is held
    assert!(kb.add(1, "done", &[]).unwrap());
    let _again = kb.lock();
    assert_eq!(kb.size(), 6);
}

#[test]
fn clear_resets_size() {
    let kb = setup();
    kb.clear();
    assert!(kb.is_empty());
    assert!(!kb.contains(0, "at", &at(1, 1)));
    assert_eq!(kb.categories(), 2);
}

#[test]
fn fact_identity() {
    let a = Fact::new(0, "at", &at(1, 2));
    let b = Fact::new(0, "at", &at(1, 2));
    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
    assert_ne!(a, Fact::new(1, "at", &at(1, 2)));
    assert_ne!(a, Fact::new(0, "to", &at(1, 2)));
    assert!(a.equals(0, "at", &at(1, 2)));
    assert!(a.matches(0, "at", &at(7, 2), &Mask::from_positions(&[1])));
    assert!(!a.matches(0, "at", &at(7, 7), &Mask::from_positions(&[1])));
    assert_eq!(a.to_string(), "[0]at(\"unit\", 1, 2)");
}

#[test]
fn value_comparisons() {
    use agentc::runtime::{compare, is_equal};
    use std::cmp::Ordering;
    assert_eq!(compare(&Value::Int(1), &Value::Float(1.5)), Some(Ordering::Less));
    assert_eq!(compare(&Value::from("b"), &Value::from("a")), Some(Ordering::Greater));
    assert_eq!(compare(&Value::from("b"), &Value::Int(1)), None);
    assert_eq!(compare(&Value::Null, &Value::Null), None);
    assert!(is_equal(&Value::Null, &Value::Null));
    assert!(!is_equal(&Value::Int(1), &Value::Float(1.0)));
    assert!(is_equal(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
}

#[test]
fn masks_are_built_up_and_reset() {
    let kb = setup();
    let mut mask = Mask::new();
    mask.set(2);
    mask.set(1);
    mask.set(1);
    assert_eq!(mask.len(), 2);
    assert!(mask.is_set(1) && mask.is_set(2));
    assert!(!mask.is_set(0));
    assert!(!mask.is_set(usize::MAX));
    assert_eq!(mask.iter().collect::<Vec<u32>>(), vec![1, 2]);
    assert_eq!(mask, Mask::from_positions(&[1, 2]));
    assert_eq!(kb.match_facts(0, "at", &at(0, 0), Some(&mask)).len(), 3);

    mask.clear();
    assert!(mask.is_empty());
    assert_eq!(mask.len(), 0);
    // a cleared mask is an existence check again
    assert_eq!(kb.match_facts(0, "at", &at(1, 2), Some(&mask)).len(), 1);
}

#[test]
fn guard_hands_out_its_store() {
    let kb = setup();
    let guard = kb.lock();
    let locked = guard.knowledge_base();
    assert!(std::ptr::eq(locked, &kb));
    // the store stays usable through the guard on the owning thread
    assert!(locked.add(1, "held", &[Value::Int(1)]).unwrap());
    assert!(locked.contains(1, "held", &[Value::Int(1)]));
    drop(guard);
    assert_eq!(kb.size(), 6);
}
