use skim_core::{check_arity, Cell, Dict, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "make-dict", Intern::OpMakeDict);
    bind(env, "dict-empty?", Intern::OpDictIsEmpty);
    bind(env, "dict-size", Intern::OpDictSize);
    bind(env, "dict-clear!", Intern::OpDictClear);
    bind(env, "dict-erase!", Intern::OpDictErase);
    bind(env, "dict-insert!", Intern::OpDictInsert);
    bind(env, "dict-find", Intern::OpDictFind);
    bind(env, "dict-has?", Intern::OpDictHas);
    bind(env, "dict->list", Intern::OpDictList);
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpMakeDict => {
            check_arity!(args, "make-dict", 0);
            Ok(Cell::dict(Dict::new()))
        }
        OpDictIsEmpty => {
            check_arity!(args, "dict-empty?", 1);
            let d = args[0].as_dict()?;
            let empty = d.borrow().is_empty();
            Ok(Cell::Bool(empty))
        }
        OpDictSize => {
            check_arity!(args, "dict-size", 1);
            let d = args[0].as_dict()?;
            let len = d.borrow().len();
            Ok(Cell::int(len as i64))
        }
        OpDictClear => {
            check_arity!(args, "dict-clear!", 1);
            args[0].as_dict()?.borrow_mut().clear();
            Ok(Cell::None)
        }
        OpDictErase => {
            check_arity!(args, "dict-erase!", 2);
            let removed = args[0].as_dict()?.borrow_mut().remove(&args[1]).is_some();
            Ok(Cell::Bool(removed))
        }
        OpDictInsert => {
            check_arity!(args, "dict-insert!", 3);
            args[0]
                .as_dict()?
                .borrow_mut()
                .insert(args[1].clone(), args[2].clone());
            Ok(Cell::None)
        }
        OpDictFind => {
            check_arity!(args, "dict-find", 2..=3);
            let d = args[0].as_dict()?;
            let found = d.borrow().get(&args[1]).cloned();
            Ok(match found {
                Some(v) => v,
                None => args.get(2).cloned().unwrap_or(Cell::Bool(false)),
            })
        }
        OpDictHas => {
            check_arity!(args, "dict-has?", 2);
            let d = args[0].as_dict()?;
            let has = d.borrow().contains_key(&args[1]);
            Ok(Cell::Bool(has))
        }
        OpDictList => {
            check_arity!(args, "dict->list", 1);
            let d = args[0].as_dict()?;
            let items: Vec<Cell> = d
                .borrow()
                .iter()
                .map(|(k, v)| Cell::cons(k.clone(), v.clone()))
                .collect();
            Ok(Cell::list_from_vec(items))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}
