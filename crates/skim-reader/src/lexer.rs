use skim_core::{Complex, Number, SkimError, Span, EOF_CHAR};

/// Tokens produced by the scanner. Value-bearing tokens carry their
/// payload directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    OBrace,
    CBrace,
    Dot,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplice,
    True,
    False,
    Char(char),
    Number(Number),
    String(String),
    Regex(String),
    Symbol(String),
    /// `#(`; the opening brace follows as its own token.
    Vector,
    Eof,
}

/// Named characters: R7RS control names, umlauts, subscript and
/// superscript digits, the Greek alphabet and common math operators.
/// `delete` and `escape` map to DEL and ESC.
const CHAR_NAMES: &[(&str, char)] = &[
    ("eof", EOF_CHAR),
    ("alarm", '\u{7}'),
    ("backspace", '\u{8}'),
    ("delete", '\u{7f}'),
    ("escape", '\u{1b}'),
    ("newline", '\n'),
    ("null", '\0'),
    ("return", '\r'),
    ("space", ' '),
    ("tab", '\t'),
    ("ae", 'ä'),
    ("AE", 'Ä'),
    ("ue", 'ü'),
    ("UE", 'Ü'),
    ("oe", 'ö'),
    ("OE", 'Ö'),
    ("ss", 'ß'),
    ("_0", '₀'),
    ("^0", '⁰'),
    ("_1", '₁'),
    ("^1", '¹'),
    ("_2", '₂'),
    ("^2", '²'),
    ("_3", '₃'),
    ("^3", '³'),
    ("_4", '₄'),
    ("^4", '⁴'),
    ("_5", '₅'),
    ("^5", '⁵'),
    ("_6", '₆'),
    ("^6", '⁶'),
    ("_7", '₇'),
    ("^7", '⁷'),
    ("_8", '₈'),
    ("^8", '⁸'),
    ("_9", '₉'),
    ("^9", '⁹'),
    ("alpha", 'α'),
    ("beta", 'β'),
    ("gamma", 'γ'),
    ("Gamma", 'Γ'),
    ("delta", 'δ'),
    ("Delta", 'Δ'),
    ("epsilon", 'ε'),
    ("zeta", 'ζ'),
    ("eta", 'η'),
    ("theta", 'θ'),
    ("iota", 'ι'),
    ("kappa", 'κ'),
    ("lambda", 'λ'),
    ("mu", 'μ'),
    ("nu", 'ν'),
    ("xi", 'ξ'),
    ("Xi", 'Ξ'),
    ("omicron", 'ο'),
    ("pi", 'π'),
    ("Pi", 'Π'),
    ("rho", 'ρ'),
    ("tau", 'τ'),
    ("sigma", 'σ'),
    ("Sigma", 'Σ'),
    ("upsilon", 'υ'),
    ("phi", 'φ'),
    ("Phi", 'Φ'),
    ("chi", 'χ'),
    ("psi", 'ψ'),
    ("Psi", 'Ψ'),
    ("omega", 'ω'),
    ("Omega", 'Ω'),
    ("le", '≤'),
    ("ge", '≥'),
    ("sim", '∼'),
    ("simeq", '≃'),
    ("approx", '≈'),
    ("nabla", '∇'),
    ("sum", '∑'),
    ("prod", '∏'),
    ("int", '∫'),
    ("oint", '∮'),
    ("pm", '±'),
    ("div", '÷'),
    ("cdot", '·'),
    ("star", '⋆'),
    ("circ", '∘'),
    ("bullet", '•'),
    ("diamond", '◇'),
    ("lhd", '◁'),
    ("rhd", '▷'),
    ("trup", '△'),
    ("trdown", '▽'),
    ("times", '×'),
    ("otimes", '⊗'),
    ("in", '∈'),
    ("notin", '∉'),
    ("subset", '⊂'),
    ("subseteq", '⊆'),
    ("infty", '∞'),
];

/// Characters that terminate a lexeme and start a new expression, string
/// or comment.
pub fn is_special(c: char) -> bool {
    matches!(c, '(' | ')' | '"' | '\'' | '`' | ',' | ';')
}

/// Allowed inside a symbol: any graphic character that is neither a digit
/// nor special syntax (first position), digits allowed after.
fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !is_special(c)
}

/// Could the first characters of this lexeme form a number? Checks up to
/// `n` leading characters for digits, signs, a decimal point, exponent or
/// imaginary-unit markers.
fn could_be_number(lexeme: &[char], n: usize) -> bool {
    if lexeme.is_empty() {
        return false;
    }
    let n = if n == 0 { lexeme.len() } else { n.min(lexeme.len()) };
    let has_sign = matches!(lexeme[0], '+' | '-');
    let mut has_digit = lexeme[0].is_ascii_digit();
    let mut has_imag = false;
    if lexeme.len() == 1 && !has_digit {
        return false;
    }
    for &c in &lexeme[..n] {
        if !has_digit {
            has_digit = c.is_ascii_digit();
        }
        if !has_imag {
            has_imag = matches!(c, 'i' | 'I');
        }
        if !c.is_ascii_digit() && !matches!(c, '+' | '-' | '.' | 'i' | 'I' | 'e' | 'E') {
            return false;
        }
    }
    has_digit || (lexeme.len() <= 2 && (has_sign || has_imag))
}

/// Classify a lexeme as Int, Real or Complex.
///
/// `+i`/`-i` denote the unit imaginaries. A sign not immediately after an
/// exponent marker starts the imaginary component; a trailing `i`/`I`
/// closes it. A `.` or exponent marker forces Real. Pure digit strings
/// parse as Int, falling back to Real on overflow.
pub fn lex_number(lexeme: &[char]) -> Option<Number> {
    if lexeme.is_empty() {
        return None;
    }
    // unit imaginaries
    if lexeme.len() == 2
        && matches!(lexeme[0], '+' | '-')
        && matches!(lexeme[1], 'i' | 'I')
    {
        let im = if lexeme[0] == '-' { -1.0 } else { 1.0 };
        return Some(Number::Complex(Complex::new(0.0, im)));
    }

    let mut is_flo = false;
    let mut is_cpx = false;
    let mut re_part = 0.0f64;
    let mut im_sign = 1.0f64;
    let mut pos = 0usize; // index of the imaginary part's sign character
    let mut im_mag: Option<f64> = None;

    let mut i = 0;
    if matches!(lexeme[0], '+' | '-' | '.') {
        is_flo = lexeme[0] == '.';
        i = 1;
    }
    if i >= lexeme.len() || !lexeme[i].is_ascii_digit() {
        return None;
    }

    let text: String = lexeme.iter().collect();
    let mut ic = i;
    loop {
        ic += 1;
        if ic >= lexeme.len() {
            break;
        }
        let c = lexeme[ic];
        if c.is_ascii_digit() {
            continue;
        } else if matches!(c, '.' | 'e' | 'E') {
            is_flo = true;
        } else if matches!(c, '+' | '-') {
            if !matches!(lexeme[ic - 1], 'e' | 'E') {
                is_cpx = true;
                pos = ic;
                re_part = text[..ic].parse().ok()?;
                if c == '-' {
                    im_sign = -1.0;
                }
            }
        } else if matches!(c, 'i' | 'I') && ic == lexeme.len() - 1 {
            is_cpx = true;
            let inner = &text[pos..lexeme.len() - 1];
            if lexeme[pos].is_ascii_digit() || pos + 2 < lexeme.len() {
                // signed magnitude between the sign and the trailing i
                im_mag = Some(inner.parse().ok()?);
            }
        } else {
            return None;
        }
    }

    if is_cpx {
        let im = im_mag.unwrap_or(im_sign);
        Some(Number::from_parts(re_part, im))
    } else if is_flo {
        text.parse().ok().map(Number::Real)
    } else {
        match text.parse::<i64>() {
            Ok(n) => Some(Number::Int(n)),
            Err(_) => text.parse::<f64>().ok().map(Number::Real),
        }
    }
}

/// Convert a string to a number, honoring the `#e`/`#i` exactness
/// prefixes; `#f` for an unsuccessful conversion.
pub fn strnum(text: &str) -> Option<Number> {
    let chars: Vec<char> = text.chars().collect();
    if text.starts_with("#i") {
        lex_number(&chars[2..])
    } else if text.starts_with("#e") {
        lex_number(&chars[2..]).map(|n| n.truncate())
    } else {
        lex_number(&chars)
    }
}

/// Resolve a `#\…` lexeme (without the leading `#\`) against the named
/// table, the hex form, or as a literal character.
pub fn lex_char_name(name: &[char]) -> Option<char> {
    if name.len() == 1 {
        return Some(name[0]);
    }
    if name.len() > 1 && name[0] == 'x' {
        let hex: String = name[1..].iter().collect();
        let code = u32::from_str_radix(&hex, 16).ok()?;
        return char::from_u32(code);
    }
    let text: String = name.iter().collect();
    // exact match first so cased names like Gamma stay reachable,
    // then the case-insensitive fallback
    if let Some(&(_, c)) = CHAR_NAMES.iter().find(|(n, _)| *n == text) {
        return Some(c);
    }
    let lower = text.to_lowercase();
    CHAR_NAMES
        .iter()
        .find(|(n, _)| n.to_lowercase() == lower)
        .map(|&(_, c)| c)
}

/// A streaming tokenizer over a character buffer with one-token putback.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    put_back: Option<Token>,
}

impl Scanner {
    pub fn new(src: &str) -> Self {
        Scanner {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            put_back: None,
        }
    }

    pub fn span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    /// The unconsumed remainder of the buffer.
    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// Push a token back; the next `next_token` returns it.
    pub fn put_back(&mut self, tok: Token) {
        self.put_back = Some(tok);
    }

    /// Drop buffered lookahead after an error so the caller can retry.
    pub fn clear(&mut self) {
        self.put_back = None;
    }

    fn err(&self, msg: impl Into<String>) -> SkimError {
        SkimError::parse(msg, self.span())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.bump();
            if c == '\n' {
                break;
            }
        }
    }

    /// Accumulate a lexeme until whitespace, a special character or end of
    /// input.
    fn take_lexeme(&mut self, first: char) -> Vec<char> {
        let mut lexeme = vec![first];
        while let Some(c) = self.peek() {
            if c.is_whitespace() || is_special(c) {
                break;
            }
            self.bump();
            lexeme.push(c);
        }
        lexeme
    }

    /// Read a string body after the opening quote. A backslash escapes the
    /// following character; both are stored, expansion happens at display
    /// time. Non-printable characters are an error.
    fn lex_string(&mut self) -> Result<Token, SkimError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some('"') => return Ok(Token::String(out)),
                Some('\\') => {
                    out.push('\\');
                    match self.bump() {
                        None => return Err(self.err("unterminated string escape")),
                        Some(c) if c.is_control() => {
                            return Err(self.err("non-printable character in string"));
                        }
                        Some(c) => out.push(c),
                    }
                }
                Some(c) if c.is_control() => {
                    return Err(self.err("non-printable character in string"));
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Dispatch a `#…` lexeme: booleans, characters, vectors, exactness
    /// prefixes and regex literals.
    fn lex_special(&mut self, lexeme: Vec<char>) -> Result<Token, SkimError> {
        if lexeme.len() == 1 {
            // bare "#" stopped by the special '(': a vector opener
            return Ok(Token::Vector);
        }
        let text: String = lexeme.iter().collect();
        match lexeme[1] {
            't' if text == "#t" || text == "#true" => Ok(Token::True),
            'f' if text == "#f" || text == "#false" => Ok(Token::False),
            '\\' => {
                if lexeme.len() == 2 {
                    // the character itself is special or whitespace
                    match self.bump() {
                        Some(c) => Ok(Token::Char(c)),
                        None => Err(self.err("unexpected end of input after #\\")),
                    }
                } else {
                    lex_char_name(&lexeme[2..])
                        .map(Token::Char)
                        .ok_or_else(|| self.err(format!("unknown character literal: {text}")))
                }
            }
            'e' => lex_number(&lexeme[2..])
                .map(|n| Token::Number(n.truncate()))
                .ok_or_else(|| self.err(format!("invalid number: {text}"))),
            'i' => lex_number(&lexeme[2..])
                .map(Token::Number)
                .ok_or_else(|| self.err(format!("invalid number: {text}"))),
            'r' if text == "#re" => {
                if self.peek() == Some('"') {
                    self.bump();
                    match self.lex_string()? {
                        Token::String(s) => Ok(Token::Regex(s)),
                        _ => unreachable!(),
                    }
                } else {
                    Err(self.err("expected \" after #re"))
                }
            }
            _ => Err(self.err(format!("invalid token: {text}"))),
        }
    }

    /// Return the next token from the stream.
    pub fn next_token(&mut self) -> Result<Token, SkimError> {
        if let Some(tok) = self.put_back.take() {
            return Ok(tok);
        }
        loop {
            let c = loop {
                match self.bump() {
                    None => return Ok(Token::Eof),
                    Some(c) if c.is_whitespace() => continue,
                    Some(c) => break c,
                }
            };
            match c {
                '(' => return Ok(Token::OBrace),
                ')' => return Ok(Token::CBrace),
                '\'' => return Ok(Token::Quote),
                '`' => return Ok(Token::Quasiquote),
                ',' => {
                    if self.peek() == Some('@') {
                        self.bump();
                        return Ok(Token::UnquoteSplice);
                    }
                    return Ok(Token::Unquote);
                }
                ';' => {
                    self.skip_comment();
                    continue;
                }
                '"' => return self.lex_string(),
                '#' => {
                    let lexeme = self.take_lexeme(c);
                    return self.lex_special(lexeme);
                }
                _ => {
                    let lexeme = self.take_lexeme(c);
                    if lexeme.len() == 1 && lexeme[0] == '.' {
                        return Ok(Token::Dot);
                    }
                    if could_be_number(&lexeme, 2) {
                        return lex_number(&lexeme).map(Token::Number).ok_or_else(|| {
                            self.err(format!(
                                "invalid number: {}",
                                lexeme.iter().collect::<String>()
                            ))
                        });
                    }
                    if !lexeme[0].is_ascii_digit() && lexeme.iter().all(|&c| is_symbol_char(c)) {
                        return Ok(Token::Symbol(lexeme.iter().collect()));
                    }
                    return Err(self.err(format!(
                        "invalid token: {}",
                        lexeme.iter().collect::<String>()
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(src: &str) -> Number {
        lex_number(&src.chars().collect::<Vec<_>>()).expect(src)
    }

    #[test]
    fn integers_and_reals() {
        assert_eq!(num("42"), Number::Int(42));
        assert_eq!(num("-7"), Number::Int(-7));
        assert_eq!(num("2.5"), Number::Real(2.5));
        assert_eq!(num("1e3"), Number::Real(1000.0));
        assert_eq!(num("1E-2"), Number::Real(0.01));
        assert_eq!(num(".5"), Number::Real(0.5));
    }

    #[test]
    fn int_overflow_becomes_real() {
        match num("99999999999999999999") {
            Number::Real(_) => {}
            other => panic!("expected Real, got {other:?}"),
        }
    }

    #[test]
    fn complex_literals() {
        assert_eq!(num("+i"), Number::Complex(Complex::new(0.0, 1.0)));
        assert_eq!(num("-i"), Number::Complex(Complex::new(0.0, -1.0)));
        assert_eq!(num("3+4i"), Number::Complex(Complex::new(3.0, 4.0)));
        assert_eq!(num("3-4i"), Number::Complex(Complex::new(3.0, -4.0)));
        assert_eq!(num("3+i"), Number::Complex(Complex::new(3.0, 1.0)));
        assert_eq!(num("4i"), Number::Complex(Complex::new(0.0, 4.0)));
        assert_eq!(num("1.5-2.5i"), Number::Complex(Complex::new(1.5, -2.5)));
        // zero imaginary collapses
        assert_eq!(num("3+0i"), Number::Int(3));
    }

    #[test]
    fn exponent_sign_is_not_complex() {
        assert_eq!(num("1e+3"), Number::Real(1000.0));
        assert_eq!(num("2.5e-1"), Number::Real(0.25));
    }

    #[test]
    fn not_numbers() {
        let not = |s: &str| lex_number(&s.chars().collect::<Vec<_>>());
        assert!(not("abc").is_none());
        assert!(not("-").is_none());
        assert!(not("1x").is_none());
    }

    #[test]
    fn exactness_prefixes() {
        assert_eq!(strnum("#e2.7"), Some(Number::Int(2)));
        assert_eq!(strnum("#e-2.7"), Some(Number::Int(-2)));
        assert_eq!(strnum("#i2.5"), Some(Number::Real(2.5)));
        assert_eq!(strnum("42"), Some(Number::Int(42)));
        assert_eq!(strnum("bogus"), None);
    }

    #[test]
    fn char_names() {
        let name = |s: &str| lex_char_name(&s.chars().collect::<Vec<_>>());
        assert_eq!(name("a"), Some('a'));
        assert_eq!(name("space"), Some(' '));
        assert_eq!(name("NEWLINE"), Some('\n'));
        assert_eq!(name("lambda"), Some('λ'));
        assert_eq!(name("Gamma"), Some('Γ'));
        assert_eq!(name("gamma"), Some('γ'));
        assert_eq!(name("delete"), Some('\u{7f}'));
        assert_eq!(name("escape"), Some('\u{1b}'));
        assert_eq!(name("x41"), Some('A'));
        assert_eq!(name("x3bb"), Some('λ'));
        assert_eq!(name("bogus"), None);
    }

    #[test]
    fn token_stream() {
        let mut s = Scanner::new("(+ 1 2) ; comment\n'x `y ,z ,@w");
        assert_eq!(s.next_token().unwrap(), Token::OBrace);
        assert_eq!(s.next_token().unwrap(), Token::Symbol("+".into()));
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(1)));
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(2)));
        assert_eq!(s.next_token().unwrap(), Token::CBrace);
        assert_eq!(s.next_token().unwrap(), Token::Quote);
        assert_eq!(s.next_token().unwrap(), Token::Symbol("x".into()));
        assert_eq!(s.next_token().unwrap(), Token::Quasiquote);
        assert_eq!(s.next_token().unwrap(), Token::Symbol("y".into()));
        assert_eq!(s.next_token().unwrap(), Token::Unquote);
        assert_eq!(s.next_token().unwrap(), Token::Symbol("z".into()));
        assert_eq!(s.next_token().unwrap(), Token::UnquoteSplice);
        assert_eq!(s.next_token().unwrap(), Token::Symbol("w".into()));
        assert_eq!(s.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn hash_forms() {
        let mut s = Scanner::new("#t #false #\\a #\\space #\\( #(1) #e2.5 #re\"a+b\"");
        assert_eq!(s.next_token().unwrap(), Token::True);
        assert_eq!(s.next_token().unwrap(), Token::False);
        assert_eq!(s.next_token().unwrap(), Token::Char('a'));
        assert_eq!(s.next_token().unwrap(), Token::Char(' '));
        assert_eq!(s.next_token().unwrap(), Token::Char('('));
        assert_eq!(s.next_token().unwrap(), Token::Vector);
        assert_eq!(s.next_token().unwrap(), Token::OBrace);
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(1)));
        assert_eq!(s.next_token().unwrap(), Token::CBrace);
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(2)));
        assert_eq!(s.next_token().unwrap(), Token::Regex("a+b".into()));
        assert_eq!(s.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn string_escapes_are_stored_raw() {
        let mut s = Scanner::new(r#""a\nb\"c""#);
        match s.next_token().unwrap() {
            Token::String(text) => assert_eq!(text, "a\\nb\\\"c"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut s = Scanner::new("\"abc");
        assert!(s.next_token().is_err());
    }

    #[test]
    fn dot_token() {
        let mut s = Scanner::new("(1 . 2)");
        assert_eq!(s.next_token().unwrap(), Token::OBrace);
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(1)));
        assert_eq!(s.next_token().unwrap(), Token::Dot);
        assert_eq!(s.next_token().unwrap(), Token::Number(Number::Int(2)));
        assert_eq!(s.next_token().unwrap(), Token::CBrace);
    }
}
