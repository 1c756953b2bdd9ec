use crate::language::ir::Var;
use crate::runtime::emitter::TraceVal;
use crate::runtime::error::{IrError, IrResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Bindings = Rc<RefCell<HashMap<Var, TraceVal>>>;

thread_local! {
    static REPLAY_SCOPES: RefCell<Vec<Bindings>> = const { RefCell::new(Vec::new()) };
}

/// Bindings of one program replay.
pub struct Environment {
    bindings: Bindings,
}

impl Environment {
    pub fn push_scope() -> Self {
        let bindings: Bindings = Rc::new(RefCell::new(HashMap::new()));
        REPLAY_SCOPES.with(|scopes| scopes.borrow_mut().push(bindings.clone()));
        Self { bindings }
    }

    pub fn declare(&self, var: &Var, value: TraceVal) {
        self.bindings.borrow_mut().insert(var.clone(), value);
    }

    pub fn get(&self, var: &Var) -> IrResult<TraceVal> {
        if let Some(value) = self.bindings.borrow().get(var) {
            return Ok(value.clone());
        }
        // Captures of a sub-program resolve in the enclosing replays.
        lookup_enclosing(var).ok_or_else(|| IrError::MissingBinding {
            var: var.to_string(),
        })
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        REPLAY_SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if let Some(idx) = scopes
                .iter()
                .rposition(|frame| Rc::ptr_eq(frame, &self.bindings))
            {
                scopes.truncate(idx);
            }
        });
    }
}

fn lookup_enclosing(var: &Var) -> Option<TraceVal> {
    REPLAY_SCOPES.with(|scopes| {
        scopes
            .borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(var).cloned())
    })
}

pub fn is_bound_in_replay(var: &Var) -> bool {
    lookup_enclosing(var).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::types::Type;
    use crate::runtime::value::Value;

    #[test]
    fn inner_scopes_see_outer_bindings() {
        let x = Var::fresh(Type::float());
        let outer = Environment::push_scope();
        outer.declare(&x, Value::f32(1.0).into());
        {
            let inner = Environment::push_scope();
            assert_eq!(inner.get(&x).unwrap(), TraceVal::Value(Value::f32(1.0)));
            inner.declare(&x, Value::f32(2.0).into());
            assert_eq!(inner.get(&x).unwrap(), TraceVal::Value(Value::f32(2.0)));
        }
        assert_eq!(outer.get(&x).unwrap(), TraceVal::Value(Value::f32(1.0)));
    }

    #[test]
    fn bindings_vanish_with_their_scope() {
        let x = Var::fresh(Type::float());
        {
            let env = Environment::push_scope();
            env.declare(&x, Value::f32(1.0).into());
            assert!(is_bound_in_replay(&x));
        }
        assert!(!is_bound_in_replay(&x));
        let env = Environment::push_scope();
        assert!(matches!(env.get(&x), Err(IrError::MissingBinding { .. })));
    }
}
