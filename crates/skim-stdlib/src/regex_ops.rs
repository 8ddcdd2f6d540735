use skim_core::{check_arity, Cell, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "regex", Intern::OpRegex);
    bind(env, "regex-match", Intern::OpRegexMatch);
    bind(env, "regex-search", Intern::OpRegexSearch);
}

fn regex_of(cell: &Cell) -> Result<std::rc::Rc<regex::Regex>, SkimError> {
    match cell {
        Cell::Regex(re) => Ok(re.clone()),
        other => Err(SkimError::type_error("regex", other.type_name())),
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpRegex => {
            check_arity!(args, "regex", 1);
            let s = args[0].as_string()?;
            let pattern = s.borrow().clone();
            Cell::regex(&pattern)
        }
        OpRegexMatch => {
            // true when the whole string matches
            check_arity!(args, "regex-match", 2);
            let re = regex_of(&args[0])?;
            let s = args[1].as_string()?;
            let text = s.borrow();
            let full = re
                .find(&text)
                .map(|m| m.start() == 0 && m.end() == text.len())
                .unwrap_or(false);
            Ok(Cell::Bool(full))
        }
        OpRegexSearch => {
            // first match anywhere, or #f
            check_arity!(args, "regex-search", 2);
            let re = regex_of(&args[0])?;
            let s = args[1].as_string()?;
            let text = s.borrow();
            Ok(match re.find(&text) {
                Some(m) => Cell::string(m.as_str()),
                None => Cell::Bool(false),
            })
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_is_anchored_search_is_not() {
        let re = call(Intern::OpRegex, &[Cell::string("[0-9]+")]).unwrap();
        assert_eq!(
            call(Intern::OpRegexMatch, &[re.clone(), Cell::string("123")]).unwrap(),
            Cell::Bool(true)
        );
        assert_eq!(
            call(Intern::OpRegexMatch, &[re.clone(), Cell::string("a123")]).unwrap(),
            Cell::Bool(false)
        );
        assert_eq!(
            call(Intern::OpRegexSearch, &[re, Cell::string("a123b")])
                .unwrap()
                .to_string(),
            "\"123\""
        );
    }

    #[test]
    fn literal_patterns_are_case_insensitive() {
        let re = call(Intern::OpRegex, &[Cell::string("abc")]).unwrap();
        assert_eq!(
            call(Intern::OpRegexMatch, &[re, Cell::string("ABC")]).unwrap(),
            Cell::Bool(true)
        );
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(call(Intern::OpRegex, &[Cell::string("(")]).is_err());
    }
}
