//! Streaming lexer and recursive-descent reader: S-expression text in,
//! cell graphs out.
pub mod lexer;
pub mod reader;

pub use lexer::strnum;
pub use reader::{read_many, read_str, Reader};
