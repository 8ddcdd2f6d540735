use skim_core::{check_arity, Cell, Env, Intern, Number, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "vector?", Intern::OpIsVec);
    bind(env, "make-vector", Intern::OpMakeVec);
    bind(env, "vector", Intern::OpVec);
    bind(env, "vector-length", Intern::OpVecLen);
    bind(env, "vector-ref", Intern::OpVecRef);
    bind(env, "vector-set!", Intern::OpVecSet);
    bind(env, "vector->list", Intern::OpVecList);
    bind(env, "list->vector", Intern::OpListVec);
    bind(env, "vector-fill!", Intern::OpVecFill);
    bind(env, "vector-copy", Intern::OpVecCopy);
    bind(env, "vector-append", Intern::OpVecAppend);
}

fn index(name: &str, cell: &Cell, len: usize) -> Result<usize, SkimError> {
    match cell.as_number()? {
        Number::Int(k) if k >= 0 && (k as usize) < len => Ok(k as usize),
        Number::Int(k) => Err(SkimError::range(name, k, len)),
        _ => Err(SkimError::type_error("integer index", "number")),
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpIsVec => {
            check_arity!(args, "vector?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Vector(_))))
        }
        OpMakeVec => {
            check_arity!(args, "make-vector", 1..=2);
            let n = match args[0].as_number()? {
                Number::Int(k) if k >= 0 => k as usize,
                _ => return Err(SkimError::type_error("non-negative integer", "number")),
            };
            let fill = args.get(1).cloned().unwrap_or(Cell::None);
            Ok(Cell::vector(vec![fill; n]))
        }
        OpVec => Ok(Cell::vector(args.to_vec())),
        OpVecLen => {
            check_arity!(args, "vector-length", 1);
            let v = args[0].as_vector()?;
            let len = v.borrow().len();
            Ok(Cell::int(len as i64))
        }
        OpVecRef => {
            check_arity!(args, "vector-ref", 2);
            let v = args[0].as_vector()?;
            let items = v.borrow();
            let k = index("vector-ref", &args[1], items.len())?;
            Ok(items[k].clone())
        }
        OpVecSet => {
            check_arity!(args, "vector-set!", 3);
            let v = args[0].as_vector()?;
            let mut items = v.borrow_mut();
            let k = index("vector-set!", &args[1], items.len())?;
            items[k] = args[2].clone();
            Ok(Cell::None)
        }
        OpVecList => {
            check_arity!(args, "vector->list", 1);
            let v = args[0].as_vector()?;
            let items = v.borrow().clone();
            Ok(Cell::list_from_vec(items))
        }
        OpListVec => {
            check_arity!(args, "list->vector", 1);
            Ok(Cell::vector(args[0].list_to_vec()?))
        }
        OpVecFill => {
            check_arity!(args, "vector-fill!", 2);
            let v = args[0].as_vector()?;
            for slot in v.borrow_mut().iter_mut() {
                *slot = args[1].clone();
            }
            Ok(Cell::None)
        }
        OpVecCopy => {
            check_arity!(args, "vector-copy", 1);
            let v = args[0].as_vector()?;
            let items = v.borrow().clone();
            Ok(Cell::vector(items))
        }
        OpVecAppend => {
            let mut out = Vec::new();
            for arg in args {
                out.extend(arg.as_vector()?.borrow().iter().cloned());
            }
            Ok(Cell::vector(out))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_and_mutate() {
        let v = call(Intern::OpMakeVec, &[Cell::int(3), Cell::int(0)]).unwrap();
        call(Intern::OpVecSet, &[v.clone(), Cell::int(1), Cell::int(9)]).unwrap();
        assert_eq!(
            call(Intern::OpVecRef, &[v.clone(), Cell::int(1)]).unwrap(),
            Cell::int(9)
        );
        assert!(call(Intern::OpVecRef, &[v, Cell::int(3)]).is_err());
    }

    #[test]
    fn conversions_and_append() {
        let v = call(Intern::OpVec, &[Cell::int(1), Cell::int(2)]).unwrap();
        let l = call(Intern::OpVecList, &[v.clone()]).unwrap();
        assert_eq!(l.to_string(), "(1 2)");
        let joined = call(Intern::OpVecAppend, &[v.clone(), v]).unwrap();
        assert_eq!(joined.to_string(), "#(1 2 1 2)");
    }

    #[test]
    fn copy_is_detached() {
        let v = call(Intern::OpVec, &[Cell::int(1)]).unwrap();
        let copy = call(Intern::OpVecCopy, &[v.clone()]).unwrap();
        call(Intern::OpVecSet, &[v, Cell::int(0), Cell::int(9)]).unwrap();
        assert_eq!(
            call(Intern::OpVecRef, &[copy, Cell::int(0)]).unwrap(),
            Cell::int(1)
        );
    }
}
