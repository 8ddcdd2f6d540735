use skim_core::{check_arity, is_equal, Cell, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "cons", Intern::OpCons);
    bind(env, "car", Intern::OpCar);
    bind(env, "cdr", Intern::OpCdr);
    bind(env, "caar", Intern::OpCaar);
    bind(env, "cadr", Intern::OpCadr);
    bind(env, "cdar", Intern::OpCdar);
    bind(env, "cddr", Intern::OpCddr);
    bind(env, "caddr", Intern::OpCaddr);
    bind(env, "set-car!", Intern::OpSetCar);
    bind(env, "set-cdr!", Intern::OpSetCdr);
    bind(env, "list", Intern::OpList);
    bind(env, "null?", Intern::OpIsNull);
    bind(env, "pair?", Intern::OpIsPair);
    bind(env, "list?", Intern::OpIsList);
    bind(env, "make-list", Intern::OpMakeList);
    bind(env, "length", Intern::OpLength);
    bind(env, "append", Intern::OpAppend);
    bind(env, "reverse", Intern::OpReverse);
    bind(env, "list-ref", Intern::OpListRef);
    bind(env, "list-tail", Intern::OpListTail);
    bind(env, "list-copy", Intern::OpListCopy);
    bind(env, "memq", Intern::OpMemq);
    bind(env, "member", Intern::OpMember);
    bind(env, "assq", Intern::OpAssq);
    bind(env, "assoc", Intern::OpAssoc);
}

fn index_of(name: &str, cell: &Cell) -> Result<i64, SkimError> {
    match cell.as_number()? {
        skim_core::Number::Int(k) if k >= 0 => Ok(k),
        _ => Err(SkimError::type_error(
            format!("non-negative integer for {name}"),
            "number",
        )),
    }
}

/// Walk `k` cdrs from a list head.
fn tail(name: &str, list: &Cell, k: i64) -> Result<Cell, SkimError> {
    let mut cur = list.clone();
    for i in 0..k {
        match cur.clone() {
            Cell::Pair(p) => cur = p.borrow().cdr.clone(),
            _ => return Err(SkimError::range(name, i, k as usize)),
        }
    }
    Ok(cur)
}

fn scan(list: &Cell, mut hit: impl FnMut(&Cell) -> bool) -> Result<Cell, SkimError> {
    let mut cur = list.clone();
    loop {
        match cur {
            Cell::Nil => return Ok(Cell::Bool(false)),
            Cell::Pair(p) => {
                let (car, cdr) = {
                    let pair = p.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                };
                if hit(&car) {
                    return Ok(Cell::Pair(p));
                }
                cur = cdr;
            }
            other => return Err(SkimError::type_error("proper list", other.type_name())),
        }
    }
}

fn scan_assoc(list: &Cell, mut hit: impl FnMut(&Cell) -> bool) -> Result<Cell, SkimError> {
    let mut cur = list.clone();
    loop {
        match cur {
            Cell::Nil => return Ok(Cell::Bool(false)),
            Cell::Pair(p) => {
                let (car, cdr) = {
                    let pair = p.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                };
                if hit(&car.car()?) {
                    return Ok(car);
                }
                cur = cdr;
            }
            other => return Err(SkimError::type_error("association list", other.type_name())),
        }
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpCons => {
            check_arity!(args, "cons", 2);
            Ok(Cell::cons(args[0].clone(), args[1].clone()))
        }
        OpCar => {
            check_arity!(args, "car", 1);
            args[0].car()
        }
        OpCdr => {
            check_arity!(args, "cdr", 1);
            args[0].cdr()
        }
        OpCaar => {
            check_arity!(args, "caar", 1);
            args[0].caar()
        }
        OpCadr => {
            check_arity!(args, "cadr", 1);
            args[0].cadr()
        }
        OpCdar => {
            check_arity!(args, "cdar", 1);
            args[0].cdar()
        }
        OpCddr => {
            check_arity!(args, "cddr", 1);
            args[0].cddr()
        }
        OpCaddr => {
            check_arity!(args, "caddr", 1);
            args[0].caddr()
        }
        OpSetCar => {
            check_arity!(args, "set-car!", 2);
            args[0].set_car(args[1].clone())?;
            Ok(Cell::None)
        }
        OpSetCdr => {
            check_arity!(args, "set-cdr!", 2);
            args[0].set_cdr(args[1].clone())?;
            Ok(Cell::None)
        }
        OpList => Ok(Cell::list_from_vec(args.to_vec())),
        OpIsNull => {
            check_arity!(args, "null?", 1);
            Ok(Cell::Bool(args[0].is_nil()))
        }
        OpIsPair => {
            check_arity!(args, "pair?", 1);
            Ok(Cell::Bool(args[0].is_pair()))
        }
        OpIsList => {
            check_arity!(args, "list?", 1);
            Ok(Cell::Bool(args[0].is_list()))
        }
        OpMakeList => {
            check_arity!(args, "make-list", 1..=2);
            let k = index_of("make-list", &args[0])?;
            let fill = args.get(1).cloned().unwrap_or(Cell::None);
            Ok(Cell::list_from_vec(vec![fill; k as usize]))
        }
        OpLength => {
            check_arity!(args, "length", 1);
            if args[0].is_nil() {
                return Ok(Cell::int(0));
            }
            Ok(Cell::int(args[0].list_length()?))
        }
        OpAppend => {
            if args.is_empty() {
                return Ok(Cell::Nil);
            }
            // all but the last argument must be proper lists; the last
            // becomes the tail as-is
            let mut items = Vec::new();
            for arg in &args[..args.len() - 1] {
                items.extend(arg.list_to_vec()?);
            }
            let mut out = args[args.len() - 1].clone();
            for item in items.into_iter().rev() {
                out = Cell::cons(item, out);
            }
            Ok(out)
        }
        OpReverse => {
            check_arity!(args, "reverse", 1);
            let mut items = args[0].list_to_vec()?;
            items.reverse();
            Ok(Cell::list_from_vec(items))
        }
        OpListRef => {
            check_arity!(args, "list-ref", 2);
            let k = index_of("list-ref", &args[1])?;
            tail("list-ref", &args[0], k)?.car()
        }
        OpListTail => {
            check_arity!(args, "list-tail", 2);
            let k = index_of("list-tail", &args[1])?;
            tail("list-tail", &args[0], k)
        }
        OpListCopy => {
            check_arity!(args, "list-copy", 1);
            if args[0].is_nil() {
                return Ok(Cell::Nil);
            }
            Ok(Cell::list_from_vec(args[0].list_to_vec()?))
        }
        OpMemq => {
            check_arity!(args, "memq", 2);
            scan(&args[1], |c| *c == args[0])
        }
        OpMember => {
            check_arity!(args, "member", 2);
            scan(&args[1], |c| is_equal(c, &args[0]))
        }
        OpAssq => {
            check_arity!(args, "assq", 2);
            scan_assoc(&args[1], |k| *k == args[0])
        }
        OpAssoc => {
            check_arity!(args, "assoc", 2);
            scan_assoc(&args[1], |k| is_equal(k, &args[0]))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}
