// Generated by acc. Do not edit.
#[allow(unused_imports)]
use agentc::runtime::{compare, is_equal, Agent, Fact, KnowledgeBase, Mask, Message, StoreError, Value};

pub const MAX_ATTITUDE: u32 = 1;

pub fn new_knowledge_base() -> KnowledgeBase {
    KnowledgeBase::new(MAX_ATTITUDE as usize + 1)
}

#[allow(unused_variables)]
pub fn init_knowledge_base(agent: &dyn Agent) -> Result<(), StoreError> {
    let kb = agent.knowledge_base();
    let msg: Option<&Message> = None;
    kb.add(0, "home", &[agent.id(), agent.query("weather", &[])])?;
    kb.add(0, "link", &[Value::from("a"), Value::from("b")])?;
    kb.add(0, "link", &[Value::from("b"), Value::from("c")])?;
    kb.add(0, "link", &[Value::from("c"), Value::from("c")])?;
    kb.add(0, "link", &[Value::from("a"), Value::from("c")])?;
    kb.add(0, "start", &[origin(agent, msg)?])?;
    Ok(())
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn origin(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    return Ok(Value::from("a"));
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn walk(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    let mut v0_last = Value::from("none");
    'if0: {
        'if0_0: {
            for fact0 in kb.match_facts(0, "link", &[Value::Null, Value::Null], Some(&Mask::from_positions(&[0, 1]))) {
                let v1_x = fact0.term(0).clone();
                let v2_y = fact0.term(1).clone();
                for fact1 in kb.match_facts(0, "link", &[v2_y.clone(), Value::Null], Some(&Mask::from_positions(&[1]))) {
                    let v3_z = fact1.term(1).clone();
                    if is_equal(&v1_x, &v3_z) { continue; }
                    agent.execute("path", &[v1_x.clone(), v3_z.clone()]);
                    v0_last = v3_z.clone();
                }
            }
        }
    }
    'if1: {
        'if1_0: {
            let fact2 = Fact::new(0, "link", &[Value::from("c"), Value::from("c")]);
            if !kb.contains_fact(&fact2) { break 'if1_0; }
            let v4_cyc = Value::from(fact2);
            kb.remove_value(&v4_cyc)?;
        }
    }
    return Ok(v0_last.clone());
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn cycles(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    'if0: {
        'if0_0: {
            for fact0 in kb.match_facts(0, "link", &[Value::Null, Value::Null], Some(&Mask::from_positions(&[0, 1]))) {
                if !is_equal(fact0.term(1), fact0.term(0)) { continue; }
                let v5_n = fact0.term(0).clone();
                agent.execute("cycle", &[v5_n.clone()]);
            }
        }
    }
    for fact1 in kb.match_facts(0, "link", &[Value::Null, Value::Null], Some(&Mask::from_positions(&[0, 1]))) {
        if !is_equal(fact1.term(1), fact1.term(0)) { continue; }
        kb.remove_fact(&fact1)?;
    }
    kb.remove_matching(0, "link", &[Value::from("a"), Value::Null], &Mask::from_positions(&[1]))?;
    Ok(Value::Null)
}

#[allow(unused_labels, unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn greet(agent: &dyn Agent, msg: Option<&Message>) -> Result<Value, StoreError> {
    let kb = agent.knowledge_base();
    let mut v8_me = agent.id();
    'rules0: {
        'rules0_0: {
            let Some(message) = msg else { break 'rules0_0; };
            let Some(v9_sender) = message.get("from").cloned() else { break 'rules0_0; };
            let Some(fact0) = message.get("about").and_then(Value::as_fact) else { break 'rules0_0; };
            if !fact0.matches(0, "home", &[v8_me.clone(), Value::Null], &Mask::from_positions(&[1])) { break 'rules0_0; }
            let v10_w = fact0.term(1).clone();
            kb.add(1, "told", &[v9_sender.clone(), v10_w.clone()])?;
            return Ok(v10_w.clone());
        }
        'rules0_1: {
            if msg.is_some() { break 'rules0_1; }
            return Ok(Value::from("quiet"));
        }
    }
    Ok(Value::Null)
}
