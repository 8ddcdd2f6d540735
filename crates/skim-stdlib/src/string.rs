use skim_core::{check_arity, Cell, Env, Intern, Number, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "string?", Intern::OpIsStr);
    bind(env, "make-string", Intern::OpMakeStr);
    bind(env, "string", Intern::OpStr);
    bind(env, "string-length", Intern::OpStrLen);
    bind(env, "string-ref", Intern::OpStrRef);
    bind(env, "string-set!", Intern::OpStrSet);
    bind(env, "string=?", Intern::OpStrEq);
    bind(env, "string<?", Intern::OpStrLt);
    bind(env, "string>?", Intern::OpStrGt);
    bind(env, "string<=?", Intern::OpStrLe);
    bind(env, "string>=?", Intern::OpStrGe);
    bind(env, "string-append", Intern::OpStrAppend);
    bind(env, "substring", Intern::OpSubstr);
    bind(env, "string->list", Intern::OpStrList);
    bind(env, "list->string", Intern::OpListStr);
    bind(env, "string-copy", Intern::OpStrCopy);
    bind(env, "string-fill!", Intern::OpStrFill);
    bind(env, "string-upcase", Intern::OpStrUpcase);
    bind(env, "string-downcase", Intern::OpStrDowncase);
}

fn texts(args: &[Cell]) -> Result<Vec<String>, SkimError> {
    args.iter()
        .map(|a| a.as_string().map(|s| s.borrow().clone()))
        .collect()
}

fn chain(args: &[Cell], cmp: impl Fn(&String, &String) -> bool) -> Result<Cell, SkimError> {
    let strs = texts(args)?;
    if strs.len() < 2 {
        return Err(SkimError::arity("string comparison", "2+", strs.len()));
    }
    Ok(Cell::Bool(strs.windows(2).all(|w| cmp(&w[0], &w[1]))))
}

fn index(name: &str, cell: &Cell, len: usize) -> Result<usize, SkimError> {
    match cell.as_number()? {
        Number::Int(k) if k >= 0 && (k as usize) < len => Ok(k as usize),
        Number::Int(k) => Err(SkimError::range(name, k, len)),
        _ => Err(SkimError::type_error("integer index", "number")),
    }
}

/// End bound: may equal the length.
fn bound(name: &str, cell: &Cell, len: usize) -> Result<usize, SkimError> {
    match cell.as_number()? {
        Number::Int(k) if k >= 0 && (k as usize) <= len => Ok(k as usize),
        Number::Int(k) => Err(SkimError::range(name, k, len)),
        _ => Err(SkimError::type_error("integer index", "number")),
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpIsStr => {
            check_arity!(args, "string?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::String(_))))
        }
        OpMakeStr => {
            check_arity!(args, "make-string", 1..=2);
            let n = match args[0].as_number()? {
                Number::Int(k) if k >= 0 => k as usize,
                _ => return Err(SkimError::type_error("non-negative integer", "number")),
            };
            let fill = match args.get(1) {
                Some(c) => c.as_char()?,
                None => ' ',
            };
            Ok(Cell::string(fill.to_string().repeat(n)))
        }
        OpStr => {
            let mut out = String::new();
            for arg in args {
                out.push(arg.as_char()?);
            }
            Ok(Cell::string(out))
        }
        OpStrLen => {
            check_arity!(args, "string-length", 1);
            let s = args[0].as_string()?;
            let len = s.borrow().chars().count();
            Ok(Cell::int(len as i64))
        }
        OpStrRef => {
            check_arity!(args, "string-ref", 2);
            let s = args[0].as_string()?;
            let text = s.borrow();
            let len = text.chars().count();
            let k = index("string-ref", &args[1], len)?;
            text.chars()
                .nth(k)
                .map(Cell::Char)
                .ok_or_else(|| SkimError::range("string-ref", k as i64, len))
        }
        OpStrSet => {
            check_arity!(args, "string-set!", 3);
            let s = args[0].as_string()?;
            let c = args[2].as_char()?;
            let mut text = s.borrow_mut();
            let len = text.chars().count();
            let k = index("string-set!", &args[1], len)?;
            let replaced: String = text
                .chars()
                .enumerate()
                .map(|(i, old)| if i == k { c } else { old })
                .collect();
            *text = replaced;
            Ok(Cell::None)
        }
        OpStrEq => chain(args, |a, b| a == b),
        OpStrLt => chain(args, |a, b| a < b),
        OpStrGt => chain(args, |a, b| a > b),
        OpStrLe => chain(args, |a, b| a <= b),
        OpStrGe => chain(args, |a, b| a >= b),
        OpStrAppend => {
            let mut out = String::new();
            for part in texts(args)? {
                out.push_str(&part);
            }
            Ok(Cell::string(out))
        }
        OpSubstr => {
            check_arity!(args, "substring", 3);
            let s = args[0].as_string()?;
            let text = s.borrow();
            let len = text.chars().count();
            let start = bound("substring", &args[1], len)?;
            let end = bound("substring", &args[2], len)?;
            if start > end {
                return Err(SkimError::range("substring", start as i64, end));
            }
            let out: String = text.chars().skip(start).take(end - start).collect();
            Ok(Cell::string(out))
        }
        OpStrList => {
            check_arity!(args, "string->list", 1);
            let s = args[0].as_string()?;
            let items: Vec<Cell> = s.borrow().chars().map(Cell::Char).collect();
            Ok(Cell::list_from_vec(items))
        }
        OpListStr => {
            check_arity!(args, "list->string", 1);
            let mut out = String::new();
            for item in args[0].list_to_vec()? {
                out.push(item.as_char()?);
            }
            Ok(Cell::string(out))
        }
        OpStrCopy => {
            check_arity!(args, "string-copy", 1..=3);
            let s = args[0].as_string()?;
            let text = s.borrow();
            let len = text.chars().count();
            let start = match args.get(1) {
                Some(a) => bound("string-copy", a, len)?,
                None => 0,
            };
            let end = match args.get(2) {
                Some(a) => bound("string-copy", a, len)?,
                None => len,
            };
            if start > end {
                return Err(SkimError::range("string-copy", start as i64, end));
            }
            let out: String = text.chars().skip(start).take(end - start).collect();
            Ok(Cell::string(out))
        }
        OpStrFill => {
            check_arity!(args, "string-fill!", 2);
            let s = args[0].as_string()?;
            let c = args[1].as_char()?;
            let mut text = s.borrow_mut();
            let len = text.chars().count();
            *text = c.to_string().repeat(len);
            Ok(Cell::None)
        }
        OpStrUpcase => {
            check_arity!(args, "string-upcase", 1);
            let s = args[0].as_string()?;
            let out = s.borrow().to_uppercase();
            Ok(Cell::string(out))
        }
        OpStrDowncase => {
            check_arity!(args, "string-downcase", 1);
            let s = args[0].as_string()?;
            let out = s.borrow().to_lowercase();
            Ok(Cell::string(out))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        assert_eq!(
            call(Intern::OpMakeStr, &[Cell::int(3), Cell::Char('x')])
                .unwrap()
                .to_string(),
            "\"xxx\""
        );
        assert_eq!(
            call(Intern::OpStr, &[Cell::Char('h'), Cell::Char('i')])
                .unwrap()
                .to_string(),
            "\"hi\""
        );
    }

    #[test]
    fn ref_and_set() {
        let s = Cell::string("abc");
        assert_eq!(
            call(Intern::OpStrRef, &[s.clone(), Cell::int(1)]).unwrap(),
            Cell::Char('b')
        );
        call(Intern::OpStrSet, &[s.clone(), Cell::int(1), Cell::Char('X')]).unwrap();
        assert_eq!(s.to_string(), "\"aXc\"");
        assert!(call(Intern::OpStrRef, &[s, Cell::int(5)]).is_err());
    }

    #[test]
    fn substring_bounds() {
        let s = Cell::string("hello");
        assert_eq!(
            call(Intern::OpSubstr, &[s.clone(), Cell::int(1), Cell::int(4)])
                .unwrap()
                .to_string(),
            "\"ell\""
        );
        assert!(call(Intern::OpSubstr, &[s, Cell::int(3), Cell::int(9)]).is_err());
    }

    #[test]
    fn raw_escape_storage_counts_two_chars() {
        // the reader stores "\n" as backslash + n; length reflects that
        let s = Cell::string("\\n");
        assert_eq!(
            call(Intern::OpStrLen, &[s]).unwrap(),
            Cell::int(2)
        );
    }

    #[test]
    fn list_conversions() {
        let s = Cell::string("ab");
        let l = call(Intern::OpStrList, &[s]).unwrap();
        assert_eq!(l.to_string(), "(#\\a #\\b)");
        let back = call(Intern::OpListStr, &[l]).unwrap();
        assert_eq!(back.to_string(), "\"ab\"");
    }
}
