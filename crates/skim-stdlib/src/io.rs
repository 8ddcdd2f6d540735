use std::cell::RefCell;
use std::rc::Rc;

use skim_core::{check_arity, Cell, DisplayForm, Env, Intern, Port, SkimError, EOF_CHAR};
use skim_reader::Reader;

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "port?", Intern::OpIsPort);
    bind(env, "input-port?", Intern::OpIsInPort);
    bind(env, "output-port?", Intern::OpIsOutPort);
    bind(env, "current-input-port", Intern::OpInPort);
    bind(env, "current-output-port", Intern::OpOutPort);
    bind(env, "open-input-file", Intern::OpOpenInFile);
    bind(env, "open-output-file", Intern::OpOpenOutFile);
    bind(env, "close-port", Intern::OpClosePort);
    bind(env, "open-input-string", Intern::OpOpenInStr);
    bind(env, "open-output-string", Intern::OpOpenOutStr);
    bind(env, "get-output-string", Intern::OpGetOutStr);
    bind(env, "read", Intern::OpRead);
    bind(env, "read-char", Intern::OpReadChar);
    bind(env, "peek-char", Intern::OpPeekChar);
    bind(env, "read-line", Intern::OpReadLine);
    bind(env, "eof-object", Intern::OpEofObject);
    bind(env, "eof-object?", Intern::OpIsEof);
    bind(env, "flush-output-port", Intern::OpFlush);
    bind(env, "write", Intern::OpWrite);
    bind(env, "display", Intern::OpDisplay);
    bind(env, "newline", Intern::OpNewline);
    bind(env, "write-char", Intern::OpWriteChar);
    bind(env, "write-string", Intern::OpWriteStr);
}

thread_local! {
    /// The process-wide standard port pair. Input keeps its pending
    /// buffer across calls, and both have stable identity for `eq?`.
    static STDIN_PORT: Rc<RefCell<Port>> = Rc::new(RefCell::new(Port::standard()));
    static STDOUT_PORT: Rc<RefCell<Port>> = Rc::new(RefCell::new(Port::standard()));
}

fn default_input() -> Rc<RefCell<Port>> {
    STDIN_PORT.with(Rc::clone)
}

fn default_output() -> Rc<RefCell<Port>> {
    STDOUT_PORT.with(Rc::clone)
}

fn input_arg(args: &[Cell], at: usize) -> Result<Rc<RefCell<Port>>, SkimError> {
    match args.get(at) {
        Some(cell) => cell.as_port(),
        None => Ok(default_input()),
    }
}

fn output_arg(args: &[Cell], at: usize) -> Result<Rc<RefCell<Port>>, SkimError> {
    match args.get(at) {
        Some(cell) => cell.as_port(),
        None => Ok(default_output()),
    }
}

/// Print to a port, swallowing failures after clearing the port state;
/// the port survives a failed print.
fn emit(port: &Rc<RefCell<Port>>, text: &str) -> Cell {
    let mut p = port.borrow_mut();
    if p.write_str(text).is_err() {
        p.clear();
    }
    Cell::None
}

fn char_or_eof(c: Option<char>) -> Cell {
    Cell::Char(c.unwrap_or(EOF_CHAR))
}

/// Pull characters from an input port until they form one complete
/// top-level datum, stopping as soon as the datum is closed so a live
/// stream is not drained past it. Brackets inside strings, comments and
/// character literals do not count toward nesting.
fn pull_datum(port: &mut Port) -> Result<String, SkimError> {
    let mut buf = String::new();
    let mut depth = 0i32;
    let mut started = false;
    loop {
        let c = match port.read_char()? {
            Some(c) => c,
            None => return Ok(buf),
        };
        // a delimiter after a top-level atom closes the datum; the
        // delimiter itself is handed back to the port by the caller
        if started
            && depth == 0
            && (c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '`' | ',' | ';'))
        {
            buf.push(c);
            return Ok(buf);
        }
        buf.push(c);
        match c {
            ';' => loop {
                match port.read_char()? {
                    None => return Ok(buf),
                    Some(c) => {
                        buf.push(c);
                        if c == '\n' {
                            break;
                        }
                    }
                }
            },
            '"' => {
                loop {
                    match port.read_char()? {
                        None => return Ok(buf),
                        Some(c) => {
                            buf.push(c);
                            match c {
                                '\\' => match port.read_char()? {
                                    None => return Ok(buf),
                                    Some(e) => buf.push(e),
                                },
                                '"' => break,
                                _ => {}
                            }
                        }
                    }
                }
                if depth <= 0 {
                    return Ok(buf);
                }
            }
            '#' => match port.peek_char()? {
                Some('\\') => {
                    // #\<char> or #\<name>: the named character may be a
                    // bracket
                    port.read_char()?;
                    buf.push('\\');
                    match port.read_char()? {
                        None => return Ok(buf),
                        Some(lit) => buf.push(lit),
                    }
                    while let Some(n) = port.peek_char()? {
                        if n.is_alphanumeric() {
                            port.read_char()?;
                            buf.push(n);
                        } else {
                            break;
                        }
                    }
                    if depth == 0 {
                        return Ok(buf);
                    }
                }
                Some('(') => {
                    // vector opener
                    port.read_char()?;
                    buf.push('(');
                    depth += 1;
                }
                _ => started = true,
            },
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth <= 0 {
                    return Ok(buf);
                }
            }
            '\'' | '`' => {}
            ',' => {
                if let Some('@') = port.peek_char()? {
                    port.read_char()?;
                    buf.push('@');
                }
            }
            c if c.is_whitespace() => {}
            _ => started = true,
        }
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpIsPort => {
            check_arity!(args, "port?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Port(_))))
        }
        OpIsInPort => {
            check_arity!(args, "input-port?", 1);
            Ok(Cell::Bool(match &args[0] {
                Cell::Port(p) => p.borrow().is_input(),
                _ => false,
            }))
        }
        OpIsOutPort => {
            check_arity!(args, "output-port?", 1);
            Ok(Cell::Bool(match &args[0] {
                Cell::Port(p) => p.borrow().is_output(),
                _ => false,
            }))
        }
        OpInPort => {
            check_arity!(args, "current-input-port", 0);
            Ok(Cell::Port(default_input()))
        }
        OpOutPort => {
            check_arity!(args, "current-output-port", 0);
            Ok(Cell::Port(default_output()))
        }
        OpOpenInFile => {
            check_arity!(args, "open-input-file", 1);
            let s = args[0].as_string()?;
            let path = s.borrow().clone();
            Ok(Cell::port(Port::file_input(&path)?))
        }
        OpOpenOutFile => {
            check_arity!(args, "open-output-file", 1);
            let s = args[0].as_string()?;
            let path = s.borrow().clone();
            Ok(Cell::port(Port::file_output(&path)?))
        }
        OpClosePort => {
            check_arity!(args, "close-port", 1);
            args[0].as_port()?.borrow_mut().close()?;
            Ok(Cell::None)
        }
        OpOpenInStr => {
            check_arity!(args, "open-input-string", 1);
            let s = args[0].as_string()?;
            let text = s.borrow().clone();
            Ok(Cell::port(Port::string_input(text)))
        }
        OpOpenOutStr => {
            check_arity!(args, "open-output-string", 0);
            Ok(Cell::port(Port::string_output()))
        }
        OpGetOutStr => {
            check_arity!(args, "get-output-string", 1);
            let out = args[0].as_port()?.borrow_mut().take_output()?;
            Ok(Cell::string(out))
        }

        OpRead => {
            check_arity!(args, "read", 0..=1);
            let port = input_arg(args, 0)?;
            // pull exactly one datum's worth of characters, parse it,
            // and hand back whatever the reader did not use
            let text = {
                let mut p = port.borrow_mut();
                pull_datum(&mut p)?
            };
            let mut reader = Reader::new(&text);
            let cell = reader.read()?;
            let rest = reader.rest();
            port.borrow_mut().unread(&rest)?;
            Ok(cell)
        }
        OpReadChar => {
            check_arity!(args, "read-char", 0..=1);
            let port = input_arg(args, 0)?;
            let c = port.borrow_mut().read_char()?;
            Ok(char_or_eof(c))
        }
        OpPeekChar => {
            check_arity!(args, "peek-char", 0..=1);
            let port = input_arg(args, 0)?;
            let c = port.borrow_mut().peek_char()?;
            Ok(char_or_eof(c))
        }
        OpReadLine => {
            check_arity!(args, "read-line", 0..=1);
            let port = input_arg(args, 0)?;
            let line = port.borrow_mut().read_line()?;
            Ok(match line {
                Some(text) => Cell::string(text),
                None => Cell::Char(EOF_CHAR),
            })
        }
        OpEofObject => {
            check_arity!(args, "eof-object", 0);
            Ok(Cell::Char(EOF_CHAR))
        }
        OpIsEof => {
            check_arity!(args, "eof-object?", 1);
            Ok(Cell::Bool(args[0].is_eof()))
        }
        OpFlush => {
            check_arity!(args, "flush-output-port", 0..=1);
            output_arg(args, 0)?.borrow_mut().flush()?;
            Ok(Cell::None)
        }

        OpWrite => {
            check_arity!(args, "write", 1..=2);
            let port = output_arg(args, 1)?;
            Ok(emit(&port, &args[0].to_string()))
        }
        OpDisplay => {
            check_arity!(args, "display", 1..=2);
            let port = output_arg(args, 1)?;
            Ok(emit(&port, &format!("{}", DisplayForm(&args[0]))))
        }
        OpNewline => {
            check_arity!(args, "newline", 0..=1);
            let port = output_arg(args, 0)?;
            Ok(emit(&port, "\n"))
        }
        OpWriteChar => {
            check_arity!(args, "write-char", 1..=2);
            let c = args[0].as_char()?;
            let port = output_arg(args, 1)?;
            Ok(emit(&port, &c.to_string()))
        }
        OpWriteStr => {
            check_arity!(args, "write-string", 1..=2);
            args[0].as_string()?;
            let text = format!("{}", DisplayForm(&args[0]));
            let port = output_arg(args, 1)?;
            Ok(emit(&port, &text))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_display_differ_on_strings() {
        let port = call(Intern::OpOpenOutStr, &[]).unwrap();
        let s = Cell::string("a\\nb");
        call(Intern::OpWrite, &[s.clone(), port.clone()]).unwrap();
        let written = call(Intern::OpGetOutStr, &[port.clone()]).unwrap();
        // write form keeps the stored escape and the surrounding quotes
        assert_eq!(*written.as_string().unwrap().borrow(), "\"a\\nb\"");
        call(Intern::OpDisplay, &[s, port.clone()]).unwrap();
        let displayed = call(Intern::OpGetOutStr, &[port]).unwrap();
        let inner = displayed.as_string().unwrap();
        assert_eq!(*inner.borrow(), "a\nb");
    }

    #[test]
    fn string_port_read_datum() {
        let port = call(Intern::OpOpenInStr, &[Cell::string("(1 2) 3")]).unwrap();
        let first = call(Intern::OpRead, &[port.clone()]).unwrap();
        assert_eq!(first.to_string(), "(1 2)");
        let second = call(Intern::OpRead, &[port.clone()]).unwrap();
        assert_eq!(second, Cell::int(3));
        let third = call(Intern::OpRead, &[port]).unwrap();
        assert!(third.is_eof());
    }

    #[test]
    fn read_consumes_only_one_datum() {
        let port = call(
            Intern::OpOpenInStr,
            &[Cell::string("(1 2) 34 #\\( x")],
        )
        .unwrap();
        assert_eq!(
            call(Intern::OpRead, &[port.clone()]).unwrap().to_string(),
            "(1 2)"
        );
        // the stream past the first datum is untouched
        assert_eq!(
            call(Intern::OpReadChar, &[port.clone()]).unwrap(),
            Cell::Char(' ')
        );
        assert_eq!(call(Intern::OpRead, &[port.clone()]).unwrap(), Cell::int(34));
        assert_eq!(
            call(Intern::OpRead, &[port.clone()]).unwrap(),
            Cell::Char('(')
        );
        assert_eq!(call(Intern::OpRead, &[port]).unwrap(), Cell::symbol("x"));
    }

    #[test]
    fn read_char_and_peek() {
        let port = call(Intern::OpOpenInStr, &[Cell::string("xy")]).unwrap();
        assert_eq!(
            call(Intern::OpPeekChar, &[port.clone()]).unwrap(),
            Cell::Char('x')
        );
        assert_eq!(
            call(Intern::OpReadChar, &[port.clone()]).unwrap(),
            Cell::Char('x')
        );
        assert_eq!(
            call(Intern::OpReadChar, &[port.clone()]).unwrap(),
            Cell::Char('y')
        );
        let eof = call(Intern::OpReadChar, &[port]).unwrap();
        assert_eq!(
            call(Intern::OpIsEof, &[eof]).unwrap(),
            Cell::Bool(true)
        );
    }

    #[test]
    fn eof_object_identity() {
        let eof = call(Intern::OpEofObject, &[]).unwrap();
        assert!(eof.is_eof());
        assert_eq!(
            call(Intern::OpIsEof, &[Cell::Char('x')]).unwrap(),
            Cell::Bool(false)
        );
    }

    #[test]
    fn newline_writes_line_break() {
        let port = call(Intern::OpOpenOutStr, &[]).unwrap();
        call(Intern::OpNewline, &[port.clone()]).unwrap();
        let out = call(Intern::OpGetOutStr, &[port]).unwrap();
        assert_eq!(*out.as_string().unwrap().borrow(), "\n");
    }
}
