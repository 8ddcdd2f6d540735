use std::rc::Rc;

use skim_core::{Cell, Env, Intern, Procedure, SkimError};
use skim_reader::Reader;

use crate::special_forms;

/// Trampoline state: either a finished value, or an `(env, expr)` pair to
/// evaluate next. Tail-position subforms return the latter so that tail
/// recursion runs in bounded stack.
pub enum Trampoline {
    Value(Cell),
    Eval(Cell, Env),
}

pub type EvalResult = Result<Cell, SkimError>;

/// The interpreter: a top environment seeded with the primitive table.
/// Top-level `define`s land in the same frame, so definitions persist
/// across `eval_str` calls.
pub struct Interpreter {
    pub global_env: Env,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let env = Env::new();
        skim_stdlib::register_stdlib(&env);
        Interpreter { global_env: env }
    }

    pub fn eval(&self, expr: &Cell) -> EvalResult {
        eval(expr, &self.global_env)
    }

    /// Read and evaluate every expression in `input`; the last value is
    /// the result. Top-level lists are rooted in the global environment
    /// while the reader builds them.
    pub fn eval_str(&self, input: &str) -> EvalResult {
        let mut reader = Reader::with_root(input, self.global_env.clone());
        let mut result = Cell::None;
        loop {
            let expr = reader.read()?;
            if expr.is_eof() {
                return Ok(result);
            }
            result = eval(&expr, &self.global_env)?;
        }
    }
}

/// Evaluate an expression to a value, looping over tail calls.
pub fn eval(expr: &Cell, env: &Env) -> EvalResult {
    let mut current_expr = expr.clone();
    let mut current_env = env.clone();
    loop {
        match eval_step(&current_expr, &current_env)? {
            Trampoline::Value(v) => return Ok(v),
            Trampoline::Eval(next_expr, next_env) => {
                current_expr = next_expr;
                current_env = next_env;
            }
        }
    }
}

/// Run a trampoline to completion.
pub(crate) fn run(t: Trampoline) -> EvalResult {
    match t {
        Trampoline::Value(v) => Ok(v),
        Trampoline::Eval(expr, env) => eval(&expr, &env),
    }
}

fn eval_step(expr: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    match expr {
        Cell::Symbol(sym) => env
            .get(*sym)
            .map(Trampoline::Value)
            .ok_or_else(|| SkimError::Unbound(sym.name())),
        Cell::Pair(_) => {
            let head = expr.car()?;
            let tail = expr.cdr()?;
            let op = eval(&head, env)?;
            apply_cell_form(op, &tail, env)
        }
        // everything else is self-evaluating
        other => Ok(Trampoline::Value(other.clone())),
    }
}

/// Apply an already-evaluated head to its unevaluated argument forms.
fn apply_cell_form(op: Cell, args: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    match op {
        Cell::Intern(tag) if tag.is_syntax() => special_forms::eval_syntax(tag, args, env),
        Cell::Intern(opcode) => {
            let argv = eval_args(args, env)?;
            dispatch_opcode(opcode, argv, env).map(Trampoline::Value)
        }
        Cell::Procedure(proc) => {
            if proc.is_macro() {
                // expand on the unevaluated forms, then evaluate the
                // expansion in the caller's environment
                let expanded = expand_macro(&proc, args)?;
                Ok(Trampoline::Eval(expanded, env.clone()))
            } else {
                let argv = eval_args(args, env)?;
                apply_procedure(&proc, argv)
            }
        }
        Cell::Function(func) => {
            let argv = eval_args(args, env)?;
            (func.func)(&argv).map(Trampoline::Value)
        }
        other => Err(SkimError::eval(format!(
            "not callable: {} ({})",
            other,
            other.type_name()
        ))),
    }
}

/// Apply an evaluated callable to evaluated arguments. Shared by `apply`,
/// `map`, `for-each` and `cond`'s `=>` clauses.
pub(crate) fn apply_cell(op: Cell, argv: Vec<Cell>, env: &Env) -> Result<Trampoline, SkimError> {
    match op {
        Cell::Intern(opcode) if !opcode.is_syntax() => {
            dispatch_opcode(opcode, argv, env).map(Trampoline::Value)
        }
        Cell::Procedure(proc) if !proc.is_macro() => apply_procedure(&proc, argv),
        Cell::Function(func) => (func.func)(&argv).map(Trampoline::Value),
        other => Err(SkimError::eval(format!(
            "not callable: {} ({})",
            other,
            other.type_name()
        ))),
    }
}

/// Evaluate a procedure-call argument list left to right.
pub(crate) fn eval_args(args: &Cell, env: &Env) -> Result<Vec<Cell>, SkimError> {
    let items = args.list_to_vec()?;
    let mut out = Vec::with_capacity(items.len());
    for item in &items {
        out.push(eval(item, env)?);
    }
    Ok(out)
}

/// Evaluate an `apply`-style argument list: the final expression must
/// evaluate to a list, which is spread into the arguments.
pub(crate) fn eval_args_spread(args: &Cell, env: &Env) -> Result<Vec<Cell>, SkimError> {
    let items = args.list_to_vec()?;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let val = eval(item, env)?;
        if i + 1 == items.len() {
            match val {
                Cell::Nil => {}
                Cell::Pair(_) => out.extend(val.list_to_vec()?),
                other => {
                    return Err(SkimError::type_error("argument list", other.type_name()));
                }
            }
        } else {
            out.push(val);
        }
    }
    Ok(out)
}

/// Extend the closure's captured environment and trampoline into its
/// body; the final body expression evaluates in tail position.
pub(crate) fn apply_procedure(
    proc: &Procedure,
    argv: Vec<Cell>,
) -> Result<Trampoline, SkimError> {
    let env = Env::extend(Rc::new(proc.env().clone()), proc.params(), argv)?;
    eval_body(proc.body(), &env)
}

/// Evaluate a `(expr …)` sequence, returning the last expression as the
/// tail continuation.
pub(crate) fn eval_body(body: &Cell, env: &Env) -> Result<Trampoline, SkimError> {
    let mut cur = body.clone();
    if cur.is_nil() {
        return Ok(Trampoline::Value(Cell::None));
    }
    loop {
        let (car, cdr) = match cur {
            Cell::Pair(ref p) => {
                let pair = p.borrow();
                (pair.car.clone(), pair.cdr.clone())
            }
            other => {
                return Err(SkimError::type_error("expression sequence", other.type_name()));
            }
        };
        if cdr.is_nil() {
            return Ok(Trampoline::Eval(car, env.clone()));
        }
        eval(&car, env)?;
        cur = cdr;
    }
}

/// Expand a macro: bind the unevaluated argument forms in a child of the
/// captured environment and evaluate the body; the result is the
/// expansion.
pub(crate) fn expand_macro(mac: &Procedure, args: &Cell) -> Result<Cell, SkimError> {
    let argv = args.list_to_vec()?;
    let menv = Env::extend(Rc::new(mac.env().clone()), mac.params(), argv)?;
    let mut result = Cell::None;
    let mut cur = mac.body().clone();
    while let Cell::Pair(p) = cur {
        let (car, cdr) = {
            let pair = p.borrow();
            (pair.car.clone(), pair.cdr.clone())
        };
        result = eval(&car, &menv)?;
        cur = cdr;
    }
    Ok(result)
}

/// Primitive dispatch, with the opcodes that re-enter the evaluator
/// handled here; everything else goes to the pure table.
fn dispatch_opcode(op: Intern, argv: Vec<Cell>, env: &Env) -> EvalResult {
    match op {
        Intern::OpMap => {
            if argv.len() < 2 {
                return Err(SkimError::arity("map", "2+", argv.len()));
            }
            let f = argv[0].clone();
            let lists: Vec<Vec<Cell>> = argv[1..]
                .iter()
                .map(|l| l.list_to_vec())
                .collect::<Result<_, _>>()?;
            let n = lists.iter().map(Vec::len).min().unwrap_or(0);
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                let row: Vec<Cell> = lists.iter().map(|l| l[i].clone()).collect();
                out.push(run(apply_cell(f.clone(), row, env)?)?);
            }
            Ok(Cell::list_from_vec(out))
        }
        Intern::OpForEach => {
            if argv.len() < 2 {
                return Err(SkimError::arity("for-each", "2+", argv.len()));
            }
            let f = argv[0].clone();
            let lists: Vec<Vec<Cell>> = argv[1..]
                .iter()
                .map(|l| l.list_to_vec())
                .collect::<Result<_, _>>()?;
            let n = lists.iter().map(Vec::len).min().unwrap_or(0);
            for i in 0..n {
                let row: Vec<Cell> = lists.iter().map(|l| l[i].clone()).collect();
                run(apply_cell(f.clone(), row, env)?)?;
            }
            Ok(Cell::None)
        }
        Intern::OpEval => {
            if argv.is_empty() || argv.len() > 2 {
                return Err(SkimError::arity("eval", "1-2", argv.len()));
            }
            let target = match argv.get(1) {
                Some(Cell::Env(e)) => e.clone(),
                Some(other) => {
                    return Err(SkimError::type_error("environment", other.type_name()));
                }
                None => env.clone(),
            };
            eval(&argv[0], &target)
        }
        Intern::OpMacroExpand => {
            if argv.len() != 1 {
                return Err(SkimError::arity("macro-expand", "1", argv.len()));
            }
            let form = &argv[0];
            if !form.is_pair() {
                return Ok(form.clone());
            }
            let head = eval(&form.car()?, env)?;
            match head {
                Cell::Procedure(p) if p.is_macro() => expand_macro(&p, &form.cdr()?),
                _ => Ok(form.clone()),
            }
        }
        Intern::OpLoad => {
            if argv.len() != 1 {
                return Err(SkimError::arity("load", "1", argv.len()));
            }
            let s = argv[0].as_string()?;
            let path = s.borrow().clone();
            let source = std::fs::read_to_string(&path)
                .map_err(|e| SkimError::Io(format!("{path}: {e}")))?;
            let mut reader = Reader::with_root(&source, env.clone());
            loop {
                let expr = reader.read()?;
                if expr.is_eof() {
                    return Ok(Cell::None);
                }
                eval(&expr, env)?;
            }
        }
        other => skim_stdlib::call(other, &argv),
    }
}
