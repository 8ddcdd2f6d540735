use skim_core::{check_arity, is_equal, Cell, Env, Intern, Number, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "eq?", Intern::OpEq);
    bind(env, "eqv?", Intern::OpEqv);
    bind(env, "equal?", Intern::OpEqual);
    bind(env, "not", Intern::OpNot);
    bind(env, "boolean?", Intern::OpIsBool);
    bind(env, "boolean=?", Intern::OpIsBoolEq);
    bind(env, "number?", Intern::OpIsNum);
    bind(env, "complex?", Intern::OpIsComplex);
    bind(env, "real?", Intern::OpIsReal);
    bind(env, "integer?", Intern::OpIsInt);
    bind(env, "exact?", Intern::OpIsExact);
    bind(env, "inexact?", Intern::OpIsInexact);
    bind(env, "exact-integer?", Intern::OpIsExactInt);
    bind(env, "procedure?", Intern::OpIsProc);
    bind(env, "macro?", Intern::OpIsMacro);
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpEq => {
            check_arity!(args, "eq?", 2);
            Ok(Cell::Bool(args[0] == args[1]))
        }
        OpEqv => {
            check_arity!(args, "eqv?", 2);
            Ok(Cell::Bool(args[0] == args[1]))
        }
        OpEqual => {
            check_arity!(args, "equal?", 2);
            Ok(Cell::Bool(is_equal(&args[0], &args[1])))
        }
        OpNot => {
            check_arity!(args, "not", 1);
            Ok(Cell::Bool(args[0].is_false()))
        }
        OpIsBool => {
            check_arity!(args, "boolean?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Bool(_))))
        }
        OpIsBoolEq => {
            check_arity!(args, "boolean=?", 2..);
            let mut bools = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Cell::Bool(b) => bools.push(*b),
                    other => {
                        return Err(SkimError::type_error("boolean", other.type_name()));
                    }
                }
            }
            Ok(Cell::Bool(bools.windows(2).all(|w| w[0] == w[1])))
        }
        OpIsNum => {
            check_arity!(args, "number?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Number(_))))
        }
        OpIsComplex => {
            // every number is a complex number
            check_arity!(args, "complex?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Number(_))))
        }
        OpIsReal => {
            check_arity!(args, "real?", 1);
            Ok(Cell::Bool(matches!(
                args[0],
                Cell::Number(Number::Int(_)) | Cell::Number(Number::Real(_))
            )))
        }
        OpIsInt => {
            check_arity!(args, "integer?", 1);
            Ok(Cell::Bool(match &args[0] {
                Cell::Number(n) => n.is_integer(),
                _ => false,
            }))
        }
        OpIsExact => {
            check_arity!(args, "exact?", 1);
            Ok(Cell::Bool(matches!(
                args[0],
                Cell::Number(Number::Int(_))
            )))
        }
        OpIsInexact => {
            check_arity!(args, "inexact?", 1);
            Ok(Cell::Bool(matches!(
                args[0],
                Cell::Number(Number::Real(_)) | Cell::Number(Number::Complex(_))
            )))
        }
        OpIsExactInt => {
            check_arity!(args, "exact-integer?", 1);
            Ok(Cell::Bool(matches!(
                args[0],
                Cell::Number(Number::Int(_))
            )))
        }
        OpIsProc => {
            check_arity!(args, "procedure?", 1);
            Ok(Cell::Bool(match &args[0] {
                Cell::Procedure(p) => !p.is_macro(),
                Cell::Function(_) => true,
                Cell::Intern(op) => !op.is_syntax(),
                _ => false,
            }))
        }
        OpIsMacro => {
            check_arity!(args, "macro?", 1);
            Ok(Cell::Bool(args[0].is_macro()))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_tiers() {
        let a = Cell::list_from_vec(vec![Cell::int(1)]);
        let b = Cell::list_from_vec(vec![Cell::int(1)]);
        assert_eq!(
            call(Intern::OpEq, &[a.clone(), b.clone()]).unwrap(),
            Cell::Bool(false)
        );
        assert_eq!(
            call(Intern::OpEqual, &[a.clone(), b]).unwrap(),
            Cell::Bool(true)
        );
        assert_eq!(
            call(Intern::OpEq, &[a.clone(), a]).unwrap(),
            Cell::Bool(true)
        );
    }

    #[test]
    fn numeric_predicates() {
        assert_eq!(
            call(Intern::OpIsInt, &[Cell::real(2.0)]).unwrap(),
            Cell::Bool(true)
        );
        assert_eq!(
            call(Intern::OpIsExact, &[Cell::real(2.0)]).unwrap(),
            Cell::Bool(false)
        );
        assert_eq!(
            call(Intern::OpIsExactInt, &[Cell::int(2)]).unwrap(),
            Cell::Bool(true)
        );
    }

    #[test]
    fn not_is_strict_about_false() {
        assert_eq!(call(Intern::OpNot, &[Cell::Bool(false)]).unwrap(), Cell::Bool(true));
        assert_eq!(call(Intern::OpNot, &[Cell::int(0)]).unwrap(), Cell::Bool(false));
        assert_eq!(call(Intern::OpNot, &[Cell::Nil]).unwrap(), Cell::Bool(false));
    }
}
