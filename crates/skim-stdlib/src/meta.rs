use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use skim_core::{check_arity, Cell, DisplayForm, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "error", Intern::OpError);
    bind(env, "use-count", Intern::OpUseCount);
    bind(env, "hash", Intern::OpHash);
    bind(env, "exit", Intern::OpExit);
    // eval-dependent opcodes; the evaluator intercepts these before the
    // pure dispatch table
    bind(env, "map", Intern::OpMap);
    bind(env, "for-each", Intern::OpForEach);
    bind(env, "eval", Intern::OpEval);
    bind(env, "macro-expand", Intern::OpMacroExpand);
    bind(env, "load", Intern::OpLoad);
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpError => {
            check_arity!(args, "error", 1..);
            let mut msg = format!("{}", DisplayForm(&args[0]));
            for irritant in &args[1..] {
                msg.push(' ');
                msg.push_str(&irritant.to_string());
            }
            Err(SkimError::eval(msg))
        }
        OpUseCount => {
            check_arity!(args, "use-count", 1);
            Ok(Cell::int(args[0].use_count() as i64))
        }
        OpHash => {
            check_arity!(args, "hash", 1);
            let mut hasher = DefaultHasher::new();
            args[0].hash(&mut hasher);
            Ok(Cell::int(hasher.finish() as i64))
        }
        // evaluates to its own opcode; the REPL driver recognizes it and
        // terminates the session
        OpExit => Ok(Cell::Intern(Intern::OpExit)),
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}
