//! Skim, an embeddable Scheme interpreter.
//!
//! # Quick start
//!
//! ```
//! use skim::{Cell, Interpreter};
//!
//! let interp = Interpreter::new();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(result, Cell::int(3));
//! ```

pub use skim_core::{
    gensym, intern, is_equal, Cell, Clock, Complex, Dict, DisplayForm, Env, Function, Intern,
    Number, Port, Procedure, SkimError, Symbol, EOF_CHAR,
};
pub use skim_eval::{eval, EvalResult, Interpreter};
pub use skim_reader::{read_many, read_str, Reader};
pub use skim_stdlib::register_stdlib;

/// Install a named host function into an environment.
///
/// ```
/// use skim::{define_function, Cell, Interpreter};
///
/// let interp = Interpreter::new();
/// define_function(&interp.global_env, "twice", |args| {
///     let n = args[0].as_number()?;
///     Ok(Cell::Number(n.add(&n)))
/// });
/// assert_eq!(interp.eval_str("(twice 21)").unwrap(), Cell::int(42));
/// ```
pub fn define_function(
    env: &Env,
    name: &str,
    f: impl Fn(&[Cell]) -> Result<Cell, SkimError> + 'static,
) {
    let sym = intern(name);
    env.define(sym, Cell::Function(Function::new(sym, f)));
}
