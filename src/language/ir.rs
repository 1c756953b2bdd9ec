use crate::language::primitive::{IrLevel, Primitive};
use crate::language::types::{ProgramType, Type};
use crate::runtime::error::{IrError, IrResult};
use crate::runtime::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_VAR_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl VarId {
    fn fresh() -> Self {
        VarId(NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// A symbolic placeholder with a fixed type.
///
/// Two variables are equal only if they come from the same allocation; the
/// type plays no part in equality or hashing.
#[derive(Clone, Debug)]
pub struct Var {
    id: VarId,
    ty: Type,
}

impl Var {
    pub fn fresh(ty: Type) -> Self {
        Self {
            id: VarId::fresh(),
            ty,
        }
    }

    pub fn id(&self) -> VarId {
        self.id
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}:{}", self.id.0, self.ty)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Var(Var),
    Value(Value),
}

impl Atom {
    pub fn ty(&self) -> Type {
        match self {
            Atom::Var(var) => var.ty().clone(),
            Atom::Value(value) => value.ty(),
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Atom::Var(var) => Some(var),
            Atom::Value(_) => None,
        }
    }
}

impl From<Var> for Atom {
    fn from(var: Var) -> Self {
        Atom::Var(var)
    }
}

impl From<Value> for Atom {
    fn from(value: Value) -> Self {
        Atom::Value(value)
    }
}

#[derive(Clone, Debug)]
pub struct Equation {
    pub binder: Var,
    pub primitive: Primitive,
    pub args: Vec<Atom>,
    pub subprograms: Vec<Arc<Program>>,
}

#[derive(Clone, Debug)]
pub struct Program {
    pub params: Vec<Var>,
    pub equations: Vec<Equation>,
    pub result: Atom,
}

impl Program {
    pub fn new(params: Vec<Var>, equations: Vec<Equation>, result: Atom) -> Self {
        Self {
            params,
            equations,
            result,
        }
    }

    pub fn ty(&self) -> ProgramType {
        ProgramType {
            arg_types: self.params.iter().map(|var| var.ty().clone()).collect(),
            result_type: self.result.ty(),
        }
    }

    pub fn free_vars(&self) -> Vec<Var> {
        let mut bound: HashSet<Var> = self.params.iter().cloned().collect();
        let mut seen = HashSet::new();
        let mut free = Vec::new();
        let mut note = |var: &Var, bound: &HashSet<Var>| {
            if !bound.contains(var) && seen.insert(var.clone()) {
                free.push(var.clone());
            }
        };
        for eqn in &self.equations {
            for var in eqn.args.iter().filter_map(Atom::as_var) {
                note(var, &bound);
            }
            for sub in &eqn.subprograms {
                for var in sub.free_vars() {
                    note(&var, &bound);
                }
            }
            bound.insert(eqn.binder.clone());
        }
        if let Some(var) = self.result.as_var() {
            note(var, &bound);
        }
        free
    }

    pub fn level(&self) -> IrLevel {
        self.equations
            .iter()
            .map(|eqn| {
                eqn.subprograms
                    .iter()
                    .map(|sub| sub.level())
                    .fold(eqn.primitive.level(), IrLevel::max)
            })
            .max()
            .unwrap_or(IrLevel::Backend)
    }

    /// Checks single assignment and topological order. `outer` holds the
    /// variables an enclosing program has bound before this one is used;
    /// references to them are legal captures.
    pub fn validate(&self, outer: &HashSet<Var>) -> IrResult<()> {
        let mut bound_here: HashSet<Var> = HashSet::new();
        for param in &self.params {
            if !bound_here.insert(param.clone()) {
                return Err(IrError::InvalidProgram {
                    message: format!("parameter {param} is declared twice"),
                });
            }
        }
        let in_scope = |var: &Var, bound_here: &HashSet<Var>| {
            bound_here.contains(var) || outer.contains(var)
        };
        for eqn in &self.equations {
            for var in eqn.args.iter().filter_map(Atom::as_var) {
                if !in_scope(var, &bound_here) {
                    return Err(IrError::InvalidProgram {
                        message: format!(
                            "{var} is used by the equation binding {} before it is bound",
                            eqn.binder
                        ),
                    });
                }
            }
            if !eqn.subprograms.is_empty() {
                let visible: HashSet<Var> = outer.union(&bound_here).cloned().collect();
                for sub in &eqn.subprograms {
                    sub.validate(&visible)?;
                }
            }
            if outer.contains(&eqn.binder) || !bound_here.insert(eqn.binder.clone()) {
                return Err(IrError::InvalidProgram {
                    message: format!("{} is bound more than once", eqn.binder),
                });
            }
        }
        if let Some(var) = self.result.as_var() {
            if !in_scope(var, &bound_here) {
                return Err(IrError::InvalidProgram {
                    message: format!("result {var} is not bound"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Add, Neg};

    fn add_eqn(binder: &Var, x: Atom, y: Atom) -> Equation {
        Equation {
            binder: binder.clone(),
            primitive: Primitive::op(Add),
            args: vec![x, y],
            subprograms: Vec::new(),
        }
    }

    #[test]
    fn variables_compare_by_allocation() {
        let a = Var::fresh(Type::float());
        let b = Var::fresh(Type::float());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        let set: HashSet<Var> = [a.clone(), a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn program_type_is_derived() {
        let x = Var::fresh(Type::float());
        let y = Var::fresh(Type::float());
        let program = Program::new(
            vec![x.clone()],
            vec![add_eqn(&y, x.clone().into(), Value::f32(1.0).into())],
            y.into(),
        );
        let ty = program.ty();
        assert_eq!(ty.arg_types, vec![Type::float()]);
        assert_eq!(ty.result_type, Type::float());
        assert!(program.validate(&HashSet::new()).is_ok());
        assert!(program.free_vars().is_empty());
    }

    #[test]
    fn detects_use_before_binding() {
        let x = Var::fresh(Type::float());
        let y = Var::fresh(Type::float());
        let z = Var::fresh(Type::float());
        let program = Program::new(
            vec![x.clone()],
            vec![
                add_eqn(&y, x.clone().into(), z.clone().into()),
                add_eqn(&z, x.clone().into(), x.into()),
            ],
            y.into(),
        );
        let err = program.validate(&HashSet::new()).unwrap_err();
        assert!(matches!(err, IrError::InvalidProgram { .. }));
    }

    #[test]
    fn detects_double_binding() {
        let x = Var::fresh(Type::float());
        let y = Var::fresh(Type::float());
        let program = Program::new(
            vec![x.clone()],
            vec![
                add_eqn(&y, x.clone().into(), x.clone().into()),
                add_eqn(&y, x.clone().into(), x.into()),
            ],
            y.into(),
        );
        assert!(program.validate(&HashSet::new()).is_err());
    }

    #[test]
    fn captures_are_free_and_legal_only_in_scope() {
        let outer = Var::fresh(Type::float());
        let y = Var::fresh(Type::float());
        let inner = Program::new(
            Vec::new(),
            vec![Equation {
                binder: y.clone(),
                primitive: Primitive::op(Neg),
                args: vec![outer.clone().into()],
                subprograms: Vec::new(),
            }],
            y.into(),
        );
        assert_eq!(inner.free_vars(), vec![outer.clone()]);
        assert!(inner.validate(&HashSet::new()).is_err());
        let scope: HashSet<Var> = [outer].into_iter().collect();
        assert!(inner.validate(&scope).is_ok());
    }
}
