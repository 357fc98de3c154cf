// Generated by acc. Do not edit.
#[allow(unused_imports)]
use agentc::runtime::{compare, is_equal, Agent, Fact, KnowledgeBase, Mask, Message, StoreError, Value};

pub const MAX_ATTITUDE: u32 = 1;

pub const C_LIMIT: i64 = 2;

pub fn new_knowledge_base() -> KnowledgeBase {
    KnowledgeBase::new(MAX_ATTITUDE as usize + 1)
}

#[allow(unused_variables)]
pub fn init_knowledge_base(agent: &dyn Agent) -> Result<(), StoreError> {
    let kb = agent.knowledge_base();
    let msg: Option<&Message> = None;
    kb.add(0, "unit", &[Value::from("a"), Value::Int(1)])?;
    kb.add(0, "unit", &[Value::from("b"), Value::Int(3)])?;
    kb.add(0, "unit", &[Value::from("c"), Value::Int(4)])?;
    kb.add(0, "owns", &[Value::from("b")])?;
    Ok(())
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn pick(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    'if0: {
        'if0_0: {
            let mut matched_if0_0 = false;
            for fact0 in kb.match_facts(0, "unit", &[Value::Null, Value::Null], Some(&Mask::from_positions(&[0, 1]))) {
                let v0_u = fact0.term(0).clone();
                let v1_s = fact0.term(1).clone();
                if !compare(&v1_s, &Value::from(C_LIMIT)).is_some_and(|o| o.is_gt()) { continue; }
                if !kb.contains(0, "owns", &[v0_u.clone()]) { continue; }
                matched_if0_0 = true;
                agent.execute("report", &[v0_u.clone(), v1_s.clone()]);
                kb.add(1, "guard", &[v0_u.clone()])?;
            }
            if matched_if0_0 { break 'if0; }
        }
        'if0_1: {
            let mut matched_if0_1 = false;
            for fact1 in kb.match_facts(0, "unit", &[Value::Null, Value::Null], Some(&Mask::from_positions(&[0, 1]))) {
                let v2_u = fact1.term(0).clone();
                matched_if0_1 = true;
                agent.execute("report", &[v2_u.clone(), Value::Int(0)]);
            }
            if matched_if0_1 { break 'if0; }
        }
        {
            announce(agent, msg, Value::from("nobody"))?;
        }
    }
    Ok(Value::Null)
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn handle(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    'rules0: {
        'rules0_0: {
            let Some(message) = msg else { break 'rules0_0; };
            let Some(field0) = message.get("kind") else { break 'rules0_0; };
            if !is_equal(field0, &Value::from("move")) { break 'rules0_0; }
            let Some(fact1) = message.get("fact").and_then(Value::as_fact) else { break 'rules0_0; };
            if !fact1.matches(0, "unit", &[Value::Null, Value::Null], &Mask::from_positions(&[0, 1])) { break 'rules0_0; }
            let v3_who = fact1.term(0).clone();
            let v4_f = Value::from(fact1.clone());
            kb.remove_value(&v4_f)?;
            return Ok(v3_who.clone());
        }
        'rules0_1: {
            let Some(message) = msg else { break 'rules0_1; };
            if !message.contains_key("kind") { break 'rules0_1; }
            return Ok(Value::from("other"));
        }
        'rules0_2: {
            if msg.is_some() { break 'rules0_2; }
            return Ok(Value::from("nothing"));
        }
    }
    Ok(Value::Null)
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn announce(agent: &dyn Agent, msg: Option<&Message>, mut v5_who: Value) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    {
        let _guard = kb.lock();
        kb.add(0, "seen", &[v5_who.clone()])?;
    }
    {
        let mut message = Message::new();
        message.insert("to", v5_who.clone());
        message.insert("from", agent.id());
        agent.send(message);
    }
    Ok(Value::Null)
}
