use skim_core::{check_arity, Cell, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "char?", Intern::OpIsChar);
    bind(env, "char=?", Intern::OpCharEq);
    bind(env, "char<?", Intern::OpCharLt);
    bind(env, "char>?", Intern::OpCharGt);
    bind(env, "char<=?", Intern::OpCharLe);
    bind(env, "char>=?", Intern::OpCharGe);
    bind(env, "char-ci=?", Intern::OpCharCiEq);
    bind(env, "char-ci<?", Intern::OpCharCiLt);
    bind(env, "char-ci>?", Intern::OpCharCiGt);
    bind(env, "char-ci<=?", Intern::OpCharCiLe);
    bind(env, "char-ci>=?", Intern::OpCharCiGe);
    bind(env, "char-alphabetic?", Intern::OpIsAlpha);
    bind(env, "char-numeric?", Intern::OpIsDigit);
    bind(env, "char-whitespace?", Intern::OpIsSpace);
    bind(env, "char-upper-case?", Intern::OpIsUpper);
    bind(env, "char-lower-case?", Intern::OpIsLower);
    bind(env, "char->integer", Intern::OpCharInt);
    bind(env, "integer->char", Intern::OpIntChar);
    bind(env, "digit-value", Intern::OpDigitVal);
    bind(env, "char-upcase", Intern::OpUpcase);
    bind(env, "char-downcase", Intern::OpDowncase);
}

fn chars_of(args: &[Cell]) -> Result<Vec<char>, SkimError> {
    args.iter().map(|a| a.as_char()).collect()
}

fn chain(
    args: &[Cell],
    fold: impl Fn(char) -> char,
    cmp: impl Fn(&char, &char) -> bool,
) -> Result<Cell, SkimError> {
    let chars = chars_of(args)?;
    if chars.len() < 2 {
        return Err(SkimError::arity("char comparison", "2+", chars.len()));
    }
    let folded: Vec<char> = chars.into_iter().map(fold).collect();
    Ok(Cell::Bool(folded.windows(2).all(|w| cmp(&w[0], &w[1]))))
}

fn fold_ci(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpIsChar => {
            check_arity!(args, "char?", 1);
            Ok(Cell::Bool(matches!(args[0], Cell::Char(_))))
        }
        OpCharEq => chain(args, |c| c, |a, b| a == b),
        OpCharLt => chain(args, |c| c, |a, b| a < b),
        OpCharGt => chain(args, |c| c, |a, b| a > b),
        OpCharLe => chain(args, |c| c, |a, b| a <= b),
        OpCharGe => chain(args, |c| c, |a, b| a >= b),
        OpCharCiEq => chain(args, fold_ci, |a, b| a == b),
        OpCharCiLt => chain(args, fold_ci, |a, b| a < b),
        OpCharCiGt => chain(args, fold_ci, |a, b| a > b),
        OpCharCiLe => chain(args, fold_ci, |a, b| a <= b),
        OpCharCiGe => chain(args, fold_ci, |a, b| a >= b),
        OpIsAlpha => {
            check_arity!(args, "char-alphabetic?", 1);
            Ok(Cell::Bool(args[0].as_char()?.is_alphabetic()))
        }
        OpIsDigit => {
            check_arity!(args, "char-numeric?", 1);
            Ok(Cell::Bool(args[0].as_char()?.is_numeric()))
        }
        OpIsSpace => {
            check_arity!(args, "char-whitespace?", 1);
            Ok(Cell::Bool(args[0].as_char()?.is_whitespace()))
        }
        OpIsUpper => {
            check_arity!(args, "char-upper-case?", 1);
            Ok(Cell::Bool(args[0].as_char()?.is_uppercase()))
        }
        OpIsLower => {
            check_arity!(args, "char-lower-case?", 1);
            Ok(Cell::Bool(args[0].as_char()?.is_lowercase()))
        }
        OpCharInt => {
            check_arity!(args, "char->integer", 1);
            Ok(Cell::int(args[0].as_char()? as i64))
        }
        OpIntChar => {
            check_arity!(args, "integer->char", 1);
            let n = args[0].as_number()?;
            let code = match n {
                skim_core::Number::Int(v) if (0..=0x10FFFF).contains(&v) => v as u32,
                _ => {
                    return Err(SkimError::Arithmetic(
                        "integer->char: code point out of range".into(),
                    ));
                }
            };
            char::from_u32(code).map(Cell::Char).ok_or_else(|| {
                SkimError::Arithmetic("integer->char: invalid code point".into())
            })
        }
        OpDigitVal => {
            check_arity!(args, "digit-value", 1);
            Ok(match args[0].as_char()?.to_digit(10) {
                Some(d) => Cell::int(d as i64),
                None => Cell::Bool(false),
            })
        }
        OpUpcase => {
            check_arity!(args, "char-upcase", 1);
            let c = args[0].as_char()?;
            Ok(Cell::Char(c.to_uppercase().next().unwrap_or(c)))
        }
        OpDowncase => {
            check_arity!(args, "char-downcase", 1);
            let c = args[0].as_char()?;
            Ok(Cell::Char(c.to_lowercase().next().unwrap_or(c)))
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons() {
        let lt = call(
            Intern::OpCharLt,
            &[Cell::Char('a'), Cell::Char('b'), Cell::Char('c')],
        )
        .unwrap();
        assert_eq!(lt, Cell::Bool(true));
        let ci = call(Intern::OpCharCiEq, &[Cell::Char('A'), Cell::Char('a')]).unwrap();
        assert_eq!(ci, Cell::Bool(true));
    }

    #[test]
    fn conversions_roundtrip() {
        let n = call(Intern::OpCharInt, &[Cell::Char('λ')]).unwrap();
        assert_eq!(n, Cell::int(0x3bb));
        assert_eq!(call(Intern::OpIntChar, &[n]).unwrap(), Cell::Char('λ'));
        assert!(call(Intern::OpIntChar, &[Cell::int(-1)]).is_err());
    }

    #[test]
    fn digit_value() {
        assert_eq!(
            call(Intern::OpDigitVal, &[Cell::Char('7')]).unwrap(),
            Cell::int(7)
        );
        assert_eq!(
            call(Intern::OpDigitVal, &[Cell::Char('x')]).unwrap(),
            Cell::Bool(false)
        );
    }
}
