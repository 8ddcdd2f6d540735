use skim_core::{intern, Cell, Env, Intern, Procedure, SkimError};

use crate::eval::{
    apply_cell, eval, eval_args_spread, eval_body, Trampoline,
};

/// Evaluate a special form over its unevaluated argument forms. Tail
/// positions (`if` branches, `cond`/`when`/`unless` bodies, `and`/`or`
/// final operands, `begin` sequences) return `Trampoline::Eval`.
pub fn eval_syntax(tag: Intern, args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    match tag {
        Intern::Quote => Ok(Trampoline::Value(args.car()?)),
        Intern::Quasiquote => quasi(&args.car()?, 1, env).map(Trampoline::Value),
        Intern::Unquote | Intern::UnquoteSplice => {
            Err(SkimError::eval("unquote outside quasiquote"))
        }
        Intern::If => syntax_if(args, env),
        Intern::Cond => syntax_cond(args, env),
        Intern::When => syntax_when(args, env, true),
        Intern::Unless => syntax_when(args, env, false),
        Intern::And => syntax_and(args, env),
        Intern::Or => syntax_or(args, env),
        Intern::Begin => eval_body(args, env),
        Intern::Define => syntax_define(args, env, false),
        Intern::DefineMacro => syntax_define(args, env, true),
        Intern::SetBang => syntax_set(args, env),
        Intern::Lambda => Ok(Trampoline::Value(Cell::Procedure(Procedure::new(
            env.clone(),
            args.car()?,
            args.cdr()?,
            false,
        )))),
        Intern::Apply => {
            let proc = eval(&args.car()?, env)?;
            let argv = eval_args_spread(&args.cdr()?, env)?;
            apply_cell(proc, argv, env)
        }
        // `else` and `=>` are only meaningful inside cond clauses
        Intern::Else | Intern::Arrow => {
            Err(SkimError::eval("misplaced cond keyword"))
        }
        _ => Err(SkimError::eval("not a special form")),
    }
}

fn syntax_if(args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let test = eval(&args.car()?, env)?;
    let rest = args.cdr()?;
    if test.is_true() {
        Ok(Trampoline::Eval(rest.car()?, env.clone()))
    } else {
        match rest.cdr()? {
            Cell::Nil => Ok(Trampoline::Value(Cell::None)),
            alt => Ok(Trampoline::Eval(alt.car()?, env.clone())),
        }
    }
}

/// Does this unevaluated clause element denote `=>`?
fn is_arrow(cell: &Cell, env: &Env) -> bool {
    match cell {
        Cell::Intern(Intern::Arrow) => true,
        Cell::Symbol(sym) => {
            sym.with_name(|n| n == "=>")
                || matches!(env.get(*sym), Some(Cell::Intern(Intern::Arrow)))
        }
        _ => false,
    }
}

fn syntax_cond(args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let mut clauses = args.clone();
    while let Cell::Pair(p) = clauses {
        let (clause, rest) = {
            let pair = p.borrow();
            (pair.car.clone(), pair.cdr.clone())
        };
        let test = eval(&clause.car()?, env)?;
        // `else` evaluates to its tag and matches unconditionally
        let matched = matches!(test, Cell::Intern(Intern::Else)) || test.is_true();
        if matched {
            let body = clause.cdr()?;
            if body.is_nil() {
                return Ok(Trampoline::Value(test));
            }
            if is_arrow(&body.car()?, env) {
                let recv = eval(&body.cadr()?, env)?;
                return apply_cell(recv, vec![test], env);
            }
            return eval_body(&body, env);
        }
        clauses = rest;
    }
    Ok(Trampoline::Value(Cell::None))
}

fn syntax_when(args: &Cell, env: &Env, want: bool) -> Result<Trampoline, SkimError> {
    let test = eval(&args.car()?, env)?;
    if test.is_true() == want {
        eval_body(&args.cdr()?, env)
    } else {
        Ok(Trampoline::Value(Cell::None))
    }
}

fn syntax_and(args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let mut cur = args.clone();
    if cur.is_nil() {
        return Ok(Trampoline::Value(Cell::Bool(true)));
    }
    loop {
        let (car, cdr) = match cur {
            Cell::Pair(ref p) => {
                let pair = p.borrow();
                (pair.car.clone(), pair.cdr.clone())
            }
            other => return Err(SkimError::type_error("expression list", other.type_name())),
        };
        if cdr.is_nil() {
            return Ok(Trampoline::Eval(car, env.clone()));
        }
        let val = eval(&car, env)?;
        if val.is_false() {
            return Ok(Trampoline::Value(val));
        }
        cur = cdr;
    }
}

fn syntax_or(args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let mut cur = args.clone();
    if cur.is_nil() {
        return Ok(Trampoline::Value(Cell::Bool(false)));
    }
    loop {
        let (car, cdr) = match cur {
            Cell::Pair(ref p) => {
                let pair = p.borrow();
                (pair.car.clone(), pair.cdr.clone())
            }
            other => return Err(SkimError::type_error("expression list", other.type_name())),
        };
        if cdr.is_nil() {
            return Ok(Trampoline::Eval(car, env.clone()));
        }
        let val = eval(&car, env)?;
        if val.is_true() {
            return Ok(Trampoline::Value(val));
        }
        cur = cdr;
    }
}

/// `(define name expr)`, `(define (name . params) body…)`, and the
/// macro-defining variant.
fn syntax_define(args: &Cell, env: &Env, is_macro: bool) -> Result<Trampoline, SkimError> {
    let target = args.car()?;
    match target {
        Cell::Symbol(sym) => {
            if is_macro {
                return Err(SkimError::eval(
                    "define-macro expects a (name . params) head",
                ));
            }
            let val = eval(&args.cadr()?, env)?;
            env.define(sym, val);
            Ok(Trampoline::Value(Cell::None))
        }
        Cell::Pair(_) => {
            let name = target.car()?.as_symbol()?;
            let params = target.cdr()?;
            let body = args.cdr()?;
            let proc = Procedure::new(env.clone(), params, body, is_macro);
            env.define(name, Cell::Procedure(proc));
            Ok(Trampoline::Value(Cell::None))
        }
        other => Err(SkimError::type_error(
            "symbol or (name . params)",
            other.type_name(),
        )),
    }
}

fn syntax_set(args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let sym = args.car()?.as_symbol()?;
    let val = eval(&args.cadr()?, env)?;
    if env.set_existing(sym, val) {
        Ok(Trampoline::Value(Cell::None))
    } else {
        Err(SkimError::Unbound(sym.name()))
    }
}

// ── Quasiquotation ────────────────────────────────────────────────

fn is_named(cell: &Cell, name: &str) -> bool {
    matches!(cell, Cell::Symbol(sym) if *sym == intern(name))
}

fn one_arg(form: &Cell) -> Result<Cell, SkimError> {
    form.cadr()
}

fn two(head: Cell, arg: Cell) -> Cell {
    Cell::cons(head, Cell::cons(arg, Cell::Nil))
}

/// Splice `list` in front of `tail`.
fn splice(list: Cell, tail: Cell) -> Result<Cell, SkimError> {
    let mut out = tail;
    let items = match list {
        Cell::Nil => Vec::new(),
        other => other.list_to_vec()?,
    };
    for item in items.into_iter().rev() {
        out = Cell::cons(item, out);
    }
    Ok(out)
}

/// Rebuild a template, evaluating `unquote` forms at depth one and
/// splicing `unquote-splicing` results into the surrounding list. Nested
/// quasiquotes track their depth.
fn quasi(template: &Cell, depth: usize, env: &Env) -> Result<Cell, SkimError> {
    match template {
        Cell::Pair(_) => {
            let car = template.car()?;
            let cdr = template.cdr()?;
            if is_named(&car, "unquote") {
                if depth == 1 {
                    return eval(&one_arg(template)?, env);
                }
                return Ok(two(car, quasi(&one_arg(template)?, depth - 1, env)?));
            }
            if is_named(&car, "quasiquote") {
                return Ok(two(car, quasi(&one_arg(template)?, depth + 1, env)?));
            }
            // element position: an (unquote-splicing x) car splices
            if car.is_pair() && is_named(&car.car()?, "unquote-splicing") {
                if depth == 1 {
                    let spliced = eval(&one_arg(&car)?, env)?;
                    let rest = quasi(&cdr, depth, env)?;
                    return splice(spliced, rest);
                }
                let inner = two(car.car()?, quasi(&one_arg(&car)?, depth - 1, env)?);
                return Ok(Cell::cons(inner, quasi(&cdr, depth, env)?));
            }
            Ok(Cell::cons(
                quasi(&car, depth, env)?,
                quasi(&cdr, depth, env)?,
            ))
        }
        Cell::Vector(items) => {
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                if item.is_pair() && is_named(&item.car()?, "unquote-splicing") && depth == 1 {
                    let spliced = eval(&one_arg(item)?, env)?;
                    if !spliced.is_nil() {
                        out.extend(spliced.list_to_vec()?);
                    }
                } else {
                    out.push(quasi(item, depth, env)?);
                }
            }
            Ok(Cell::vector(out))
        }
        other => Ok(other.clone()),
    }
}
