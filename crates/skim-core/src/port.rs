use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::SkimError;

/// An I/O port: a thin façade over the host's streams. Three concrete
/// endpoints exist: the standard stdin/stdout pair, file-backed ports and
/// in-memory string ports. User code follows explicit-close discipline;
/// dropping a port releases the handle either way.
pub enum Port {
    /// Host stdin/stdout, line-buffered on the input side.
    Standard { pending: Vec<char>, eof: bool },
    FileInput {
        reader: BufReader<File>,
        pending: Vec<char>,
        open: bool,
        eof: bool,
    },
    FileOutput { writer: BufWriter<File>, open: bool },
    StringInput { data: Vec<char>, pos: usize },
    StringOutput { buf: String },
}

impl Port {
    pub fn standard() -> Port {
        Port::Standard {
            pending: Vec::new(),
            eof: false,
        }
    }

    pub fn file_input(path: impl AsRef<Path>) -> Result<Port, SkimError> {
        let file = File::open(path.as_ref())
            .map_err(|e| SkimError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Port::FileInput {
            reader: BufReader::new(file),
            pending: Vec::new(),
            open: true,
            eof: false,
        })
    }

    pub fn file_output(path: impl AsRef<Path>) -> Result<Port, SkimError> {
        let file = File::create(path.as_ref())
            .map_err(|e| SkimError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Port::FileOutput {
            writer: BufWriter::new(file),
            open: true,
        })
    }

    pub fn string_input(text: impl Into<String>) -> Port {
        Port::StringInput {
            data: text.into().chars().collect(),
            pos: 0,
        }
    }

    pub fn string_output() -> Port {
        Port::StringOutput { buf: String::new() }
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Port::Standard { .. } | Port::FileInput { .. } | Port::StringInput { .. }
        )
    }

    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Port::Standard { .. } | Port::FileOutput { .. } | Port::StringOutput { .. }
        )
    }

    pub fn is_open(&self) -> bool {
        match self {
            Port::FileInput { open, .. } | Port::FileOutput { open, .. } => *open,
            _ => true,
        }
    }

    pub fn is_eof(&self) -> bool {
        match self {
            Port::Standard { eof, .. } => *eof,
            Port::FileInput { eof, .. } => *eof,
            Port::StringInput { data, pos } => *pos >= data.len(),
            _ => false,
        }
    }

    /// Refill the pending buffer of a line-buffered input.
    fn fill(pending: &mut Vec<char>, mut read_line: impl FnMut(&mut String) -> io::Result<usize>)
        -> Result<bool, SkimError>
    {
        let mut line = String::new();
        let n = read_line(&mut line).map_err(|e| SkimError::Io(e.to_string()))?;
        if n == 0 {
            return Ok(false);
        }
        // store reversed so pop() yields characters in order
        pending.extend(line.chars().rev());
        Ok(true)
    }

    pub fn read_char(&mut self) -> Result<Option<char>, SkimError> {
        match self {
            Port::Standard { pending, eof } => {
                if pending.is_empty() {
                    let stdin = io::stdin();
                    if !Port::fill(pending, |buf| stdin.lock().read_line(buf))? {
                        *eof = true;
                        return Ok(None);
                    }
                }
                Ok(pending.pop())
            }
            Port::FileInput {
                reader,
                pending,
                open,
                eof,
            } => {
                if !*open {
                    return Err(SkimError::Io("port is closed".into()));
                }
                if pending.is_empty() {
                    let mut buf = String::new();
                    let n = reader
                        .read_line(&mut buf)
                        .map_err(|e| SkimError::Io(e.to_string()))?;
                    if n == 0 {
                        *eof = true;
                        return Ok(None);
                    }
                    pending.extend(buf.chars().rev());
                }
                Ok(pending.pop())
            }
            Port::StringInput { data, pos } => {
                if *pos < data.len() {
                    let c = data[*pos];
                    *pos += 1;
                    Ok(Some(c))
                } else {
                    Ok(None)
                }
            }
            _ => Err(SkimError::Io("not an input port".into())),
        }
    }

    pub fn peek_char(&mut self) -> Result<Option<char>, SkimError> {
        match self {
            Port::StringInput { data, pos } => Ok(data.get(*pos).copied()),
            Port::Standard { .. } | Port::FileInput { .. } => {
                let c = self.read_char()?;
                if let Some(c) = c {
                    match self {
                        Port::Standard { pending, eof } => {
                            pending.push(c);
                            *eof = false;
                        }
                        Port::FileInput { pending, eof, .. } => {
                            pending.push(c);
                            *eof = false;
                        }
                        _ => unreachable!(),
                    }
                }
                Ok(c)
            }
            _ => Err(SkimError::Io("not an input port".into())),
        }
    }

    pub fn read_line(&mut self) -> Result<Option<String>, SkimError> {
        let mut line = String::new();
        loop {
            match self.read_char()? {
                None => {
                    if line.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(line));
                }
                Some('\n') => return Ok(Some(line)),
                Some(c) => line.push(c),
            }
        }
    }

    /// Read the remaining input to end of stream.
    pub fn read_to_string(&mut self) -> Result<String, SkimError> {
        match self {
            Port::FileInput { reader, pending, eof, open } => {
                if !*open {
                    return Err(SkimError::Io("port is closed".into()));
                }
                let mut out: String = pending.drain(..).rev().collect();
                reader
                    .read_to_string(&mut out)
                    .map_err(|e| SkimError::Io(e.to_string()))?;
                *eof = true;
                Ok(out)
            }
            Port::StringInput { data, pos } => {
                let out: String = data[*pos..].iter().collect();
                *pos = data.len();
                Ok(out)
            }
            _ => Err(SkimError::Io("not an input port".into())),
        }
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), SkimError> {
        match self {
            Port::Standard { .. } => {
                let mut out = io::stdout();
                out.write_all(s.as_bytes())
                    .map_err(|e| SkimError::Io(e.to_string()))
            }
            Port::FileOutput { writer, open } => {
                if !*open {
                    return Err(SkimError::Io("port is closed".into()));
                }
                writer
                    .write_all(s.as_bytes())
                    .map_err(|e| SkimError::Io(e.to_string()))
            }
            Port::StringOutput { buf } => {
                buf.push_str(s);
                Ok(())
            }
            _ => Err(SkimError::Io("not an output port".into())),
        }
    }

    pub fn write_char(&mut self, c: char) -> Result<(), SkimError> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    pub fn flush(&mut self) -> Result<(), SkimError> {
        match self {
            Port::Standard { .. } => io::stdout()
                .flush()
                .map_err(|e| SkimError::Io(e.to_string())),
            Port::FileOutput { writer, .. } => writer
                .flush()
                .map_err(|e| SkimError::Io(e.to_string())),
            _ => Ok(()),
        }
    }

    pub fn close(&mut self) -> Result<(), SkimError> {
        match self {
            Port::FileInput { open, .. } => {
                *open = false;
                Ok(())
            }
            Port::FileOutput { writer, open } => {
                let _ = writer.flush();
                *open = false;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Push unconsumed text back onto an input port, so an incremental
    /// reader can return what it did not use.
    pub fn unread(&mut self, s: &str) -> Result<(), SkimError> {
        if s.is_empty() {
            return Ok(());
        }
        match self {
            Port::Standard { pending, eof } => {
                pending.extend(s.chars().rev());
                *eof = false;
                Ok(())
            }
            Port::FileInput { pending, eof, .. } => {
                pending.extend(s.chars().rev());
                *eof = false;
                Ok(())
            }
            Port::StringInput { data, pos } => {
                let mut rebuilt: Vec<char> = s.chars().collect();
                rebuilt.extend(data[*pos..].iter().copied());
                *data = rebuilt;
                *pos = 0;
                Ok(())
            }
            _ => Err(SkimError::Io("not an input port".into())),
        }
    }

    /// Drain the accumulated text of a string output port.
    pub fn take_output(&mut self) -> Result<String, SkimError> {
        match self {
            Port::StringOutput { buf } => Ok(std::mem::take(buf)),
            _ => Err(SkimError::Io("not a string output port".into())),
        }
    }

    /// Reset transient error state after a failed print (§7: printing
    /// errors are swallowed, the port survives).
    pub fn clear(&mut self) {
        if let Port::Standard { eof, .. } = self {
            *eof = false;
        }
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Port::Standard { .. } => "standard",
            Port::FileInput { .. } => "file-input",
            Port::FileOutput { .. } => "file-output",
            Port::StringInput { .. } => "string-input",
            Port::StringOutput { .. } => "string-output",
        };
        write!(f, "#<port {kind}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_input_reads_and_peeks() {
        let mut port = Port::string_input("ab");
        assert_eq!(port.peek_char().unwrap(), Some('a'));
        assert_eq!(port.read_char().unwrap(), Some('a'));
        assert_eq!(port.read_char().unwrap(), Some('b'));
        assert_eq!(port.read_char().unwrap(), None);
        assert!(port.is_eof());
    }

    #[test]
    fn string_output_accumulates() {
        let mut port = Port::string_output();
        port.write_str("hello ").unwrap();
        port.write_char('w').unwrap();
        assert_eq!(port.take_output().unwrap(), "hello w");
        assert_eq!(port.take_output().unwrap(), "");
    }

    #[test]
    fn read_line_splits_on_newline() {
        let mut port = Port::string_input("one\ntwo");
        assert_eq!(port.read_line().unwrap(), Some("one".into()));
        assert_eq!(port.read_line().unwrap(), Some("two".into()));
        assert_eq!(port.read_line().unwrap(), None);
    }

    #[test]
    fn mode_predicates() {
        assert!(Port::string_input("").is_input());
        assert!(!Port::string_input("").is_output());
        assert!(Port::string_output().is_output());
        assert!(Port::standard().is_input() && Port::standard().is_output());
    }
}
