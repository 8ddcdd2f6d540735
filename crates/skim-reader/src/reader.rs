use skim_core::{gensym, Cell, Env, SkimError, Symbol, EOF_CHAR};

use crate::lexer::{Scanner, Token};

/// The recursive-descent reader: materializes one datum per `read` call
/// from the token stream.
pub struct Reader {
    scanner: Scanner,
    /// Environment slot used to root a top-level list under construction,
    /// so allocator reclamation mid-parse cannot free it. The sentinel is
    /// a fresh symbol no program text can name.
    root: Option<(Env, Symbol)>,
    depth: usize,
}

impl Reader {
    pub fn new(src: &str) -> Self {
        Reader {
            scanner: Scanner::new(src),
            root: None,
            depth: 0,
        }
    }

    /// A reader that roots top-level lists in `env` while they are being
    /// built.
    pub fn with_root(src: &str, env: Env) -> Self {
        Reader {
            scanner: Scanner::new(src),
            root: Some((env, gensym())),
            depth: 0,
        }
    }

    /// The unconsumed remainder; lets a port-backed caller push back what
    /// the reader did not use.
    pub fn rest(&self) -> String {
        self.scanner.rest()
    }

    /// Read the next top-level datum. End of input yields the EOF
    /// character cell. On error the token buffer is cleared so the caller
    /// may retry with fresh input.
    pub fn read(&mut self) -> Result<Cell, SkimError> {
        self.depth = 0;
        let result = self.read_datum();
        match &result {
            Ok(_) => {
                if let Some((env, sym)) = &self.root {
                    env.remove(*sym);
                }
            }
            Err(_) => self.scanner.clear(),
        }
        result
    }

    fn err(&self, msg: impl Into<String>) -> SkimError {
        SkimError::parse(msg, self.scanner.span())
    }

    fn quote_wrap(&mut self, name: &str) -> Result<Cell, SkimError> {
        let datum = self.read_datum()?;
        if datum.is_eof() {
            return Err(self.err(format!("unexpected end of input after {name}")));
        }
        Ok(Cell::cons(
            Cell::symbol(name),
            Cell::cons(datum, Cell::Nil),
        ))
    }

    fn read_datum(&mut self) -> Result<Cell, SkimError> {
        match self.scanner.next_token()? {
            Token::True => Ok(Cell::Bool(true)),
            Token::False => Ok(Cell::Bool(false)),
            Token::Char(c) => Ok(Cell::Char(c)),
            Token::Number(n) => Ok(Cell::Number(n)),
            Token::String(s) => Ok(Cell::string(s)),
            Token::Regex(pattern) => Cell::regex(&pattern),
            Token::Symbol(name) => Ok(Cell::symbol(&name)),
            Token::Quote => self.quote_wrap("quote"),
            Token::Quasiquote => self.quote_wrap("quasiquote"),
            Token::Unquote => self.quote_wrap("unquote"),
            Token::UnquoteSplice => self.quote_wrap("unquote-splicing"),
            Token::OBrace => self.parse_list(),
            Token::Vector => self.parse_vector(),
            Token::CBrace => Err(self.err("unexpected )")),
            Token::Dot => Err(self.err("unexpected . outside a list")),
            Token::Eof => Ok(Cell::Char(EOF_CHAR)),
        }
    }

    fn parse_list(&mut self) -> Result<Cell, SkimError> {
        self.depth += 1;
        let result = self.parse_list_inner();
        self.depth -= 1;
        result
    }

    fn parse_list_inner(&mut self) -> Result<Cell, SkimError> {
        let mut list = Cell::Nil;
        let mut tail = Cell::Nil;
        loop {
            match self.scanner.next_token()? {
                Token::CBrace => return Ok(list),
                Token::Dot => {
                    if !tail.is_pair() {
                        return Err(self.err("stray . in list"));
                    }
                    let cell = self.read_datum()?;
                    if cell.is_eof() {
                        return Err(self.err("unexpected end of input after ."));
                    }
                    match self.scanner.next_token()? {
                        Token::CBrace => {
                            tail.set_cdr(cell)?;
                            return Ok(list);
                        }
                        _ => return Err(self.err("exactly one datum must follow .")),
                    }
                }
                Token::Eof => return Err(self.err("unexpected end of input in list")),
                tok => {
                    self.scanner.put_back(tok);
                    let cell = self.read_datum()?;
                    if tail.is_pair() {
                        let next = Cell::cons(cell, Cell::Nil);
                        tail.set_cdr(next.clone())?;
                        tail = next;
                    } else {
                        list = Cell::cons(cell, Cell::Nil);
                        tail = list.clone();
                        // root the outermost list while it is being built
                        if self.depth == 1 {
                            if let Some((env, sym)) = &self.root {
                                env.define(*sym, list.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    fn parse_vector(&mut self) -> Result<Cell, SkimError> {
        match self.scanner.next_token()? {
            Token::OBrace => {}
            _ => return Err(self.err("expected ( after #")),
        }
        let mut items = Vec::new();
        loop {
            match self.scanner.next_token()? {
                Token::CBrace => return Ok(Cell::vector(items)),
                Token::Eof => return Err(self.err("unexpected end of input in vector")),
                tok => {
                    self.scanner.put_back(tok);
                    items.push(self.read_datum()?);
                }
            }
        }
    }
}

/// Read a single datum from a string.
pub fn read_str(src: &str) -> Result<Cell, SkimError> {
    Reader::new(src).read()
}

/// Read every top-level datum from a string.
pub fn read_many(src: &str) -> Result<Vec<Cell>, SkimError> {
    let mut reader = Reader::new(src);
    let mut out = Vec::new();
    loop {
        let cell = reader.read()?;
        if cell.is_eof() {
            return Ok(out);
        }
        out.push(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skim_core::{intern, is_equal, Number};

    #[test]
    fn reads_atoms() {
        assert_eq!(read_str("42").unwrap(), Cell::int(42));
        assert_eq!(read_str("#t").unwrap(), Cell::Bool(true));
        assert_eq!(read_str("foo").unwrap(), Cell::symbol("foo"));
        assert_eq!(read_str("#\\λ").unwrap(), Cell::Char('λ'));
        assert_eq!(read_str("#\\lambda").unwrap(), Cell::Char('λ'));
        assert!(read_str("").unwrap().is_eof());
    }

    #[test]
    fn reads_lists() {
        let cell = read_str("(1 2 3)").unwrap();
        assert_eq!(cell.to_string(), "(1 2 3)");
        assert_eq!(cell.list_length().unwrap(), 3);
    }

    #[test]
    fn dotted_notation_matches_proper_list() {
        let dotted = read_str("(1 . (2 . (3 . ())))").unwrap();
        let proper = read_str("(1 2 3)").unwrap();
        assert!(is_equal(&dotted, &proper));
        assert_eq!(dotted.to_string(), "(1 2 3)");
    }

    #[test]
    fn dotted_pair() {
        let cell = read_str("(1 . 2)").unwrap();
        assert_eq!(cell.car().unwrap(), Cell::int(1));
        assert_eq!(cell.cdr().unwrap(), Cell::int(2));
        assert_eq!(cell.to_string(), "(1 . 2)");
    }

    #[test]
    fn quote_family_wraps() {
        assert_eq!(read_str("'x").unwrap().to_string(), "(quote x)");
        assert_eq!(read_str("`x").unwrap().to_string(), "(quasiquote x)");
        assert_eq!(read_str(",x").unwrap().to_string(), "(unquote x)");
        assert_eq!(
            read_str(",@x").unwrap().to_string(),
            "(unquote-splicing x)"
        );
    }

    #[test]
    fn vectors() {
        let cell = read_str("#(1 2 (3))").unwrap();
        assert_eq!(cell.to_string(), "#(1 2 (3))");
        assert_eq!(read_str("#()").unwrap().to_string(), "#()");
    }

    #[test]
    fn complex_literal_through_reader() {
        assert_eq!(
            read_str("3+4i").unwrap().as_number().unwrap(),
            Number::from_parts(3.0, 4.0)
        );
    }

    #[test]
    fn structural_errors() {
        assert!(read_str(")").is_err());
        assert!(read_str("(1 2").is_err());
        assert!(read_str("(1 . 2 3)").is_err());
        assert!(read_str("(. 1)").is_err());
        assert!(read_str("#(1 2").is_err());
    }

    #[test]
    fn reader_recovers_after_error() {
        let mut reader = Reader::new(") 42");
        assert!(reader.read().is_err());
        assert_eq!(reader.read().unwrap(), Cell::int(42));
    }

    #[test]
    fn read_many_collects_all() {
        let cells = read_many("1 2 (3 4)").unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2].to_string(), "(3 4)");
    }

    #[test]
    fn rooting_slot_is_cleared_after_read() {
        let env = Env::new();
        let mut reader = Reader::with_root("(1 2 3)", env.clone());
        reader.read().unwrap();
        // nothing left behind but the sentinel slot must be gone; probing
        // a known name shows the env is otherwise untouched
        assert!(env.get(intern("x")).is_none());
    }

    #[test]
    fn comments_are_skipped() {
        let cells = read_many("; leading\n1 ; trailing\n2").unwrap();
        assert_eq!(cells, vec![Cell::int(1), Cell::int(2)]);
    }
}
