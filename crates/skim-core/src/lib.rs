//! Core value model for Skim: the `Cell` variant, the numeric tower, the
//! interned symbol table, environments, ports and clocks.
#![allow(clippy::mutable_key_type)]

pub mod clock;
pub mod error;
pub mod number;
pub mod port;
pub mod value;

pub use clock::Clock;
pub use error::{SkimError, Span};
pub use number::{Complex, Number};
pub use port::Port;
pub use value::{
    gensym, intern, is_equal, Cell, Dict, DisplayForm, Env, Function, Intern, Pair, Procedure,
    Symbol, EOF_CHAR,
};
