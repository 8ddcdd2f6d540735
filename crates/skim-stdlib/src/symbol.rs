use skim_core::{check_arity, gensym, intern, Cell, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "symbol?", Intern::OpIsSym);
    bind(env, "symbol->string", Intern::OpSymStr);
    bind(env, "string->symbol", Intern::OpStrSym);
    bind(env, "gensym", Intern::OpGensym);
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpIsSym => {
            check_arity!(args, "symbol?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Symbol(_))))
        }
        OpSymStr => {
            check_arity!(args, "symbol->string", 1);
            Ok(Cell::string(args[0].as_symbol()?.name()))
        }
        OpStrSym => {
            check_arity!(args, "string->symbol", 1);
            let s = args[0].as_string()?;
            let name = s.borrow().clone();
            Ok(Cell::Symbol(intern(&name)))
        }
        OpGensym => {
            check_arity!(args, "gensym", 0);
            Ok(Cell::Symbol(gensym()))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_symbol_roundtrip() {
        let s = call(Intern::OpSymStr, &[Cell::symbol("foo")]).unwrap();
        assert_eq!(s.to_string(), "\"foo\"");
        let sym = call(Intern::OpStrSym, &[s]).unwrap();
        assert_eq!(sym, Cell::symbol("foo"));
    }

    #[test]
    fn gensym_never_collides() {
        let a = call(Intern::OpGensym, &[]).unwrap();
        let b = call(Intern::OpGensym, &[]).unwrap();
        assert_ne!(a, b);
    }
}
