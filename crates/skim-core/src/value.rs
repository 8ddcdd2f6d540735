use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use hashbrown::HashMap;
use lasso::{Key, Rodeo, Spur};
use regex::Regex;

use crate::clock::Clock;
use crate::number::Number;
use crate::port::Port;
use crate::SkimError;

/// Sentinel code point standing in for end-of-file in `Char` cells.
/// U+10FFFF is a designated noncharacter, so it cannot collide with text.
pub const EOF_CHAR: char = '\u{10FFFF}';

// ── Symbol interning ──────────────────────────────────────────────

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// An interned identifier. Two symbols with the same printed name are the
/// same symbol; the interner is the sole mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Numeric identity of this symbol within the interner.
    pub fn id(&self) -> usize {
        self.0.into_usize()
    }

    pub fn name(&self) -> String {
        INTERNER.with(|r| r.borrow().resolve(&self.0).to_string())
    }

    /// Call `f` with the symbol's name without allocating.
    pub fn with_name<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        INTERNER.with(|r| f(r.borrow().resolve(&self.0)))
    }
}

/// Intern a name, returning its canonical symbol.
pub fn intern(name: &str) -> Symbol {
    Symbol(INTERNER.with(|r| r.borrow_mut().get_or_intern(name)))
}

/// Mint a fresh symbol guaranteed not to exist before this call.
pub fn gensym() -> Symbol {
    INTERNER.with(|r| {
        let mut rodeo = r.borrow_mut();
        let mut n = rodeo.len();
        loop {
            let name = format!("symbol {n}");
            if rodeo.get(&name).is_none() {
                return Symbol(rodeo.get_or_intern(&name));
            }
            n += 1;
        }
    })
}

// ── Pair ──────────────────────────────────────────────────────────

/// A mutable cons cell. `mark` is reserved for a future cycle collector;
/// nothing in the evaluator reads it.
#[derive(Debug)]
pub struct Pair {
    pub car: Cell,
    pub cdr: Cell,
    pub mark: bool,
}

// ── Procedure ─────────────────────────────────────────────────────

/// A user-defined closure or macro: parameter spec, body and captured
/// environment behind a shared handle. Identity is handle identity.
#[derive(Debug, Clone)]
pub struct Procedure {
    imp: Rc<Closure>,
}

#[derive(Debug)]
pub struct Closure {
    pub env: Env,
    pub params: Cell,
    pub body: Cell,
    pub is_macro: bool,
}

impl Procedure {
    pub fn new(env: Env, params: Cell, body: Cell, is_macro: bool) -> Self {
        Procedure {
            imp: Rc::new(Closure {
                env,
                params,
                body,
                is_macro,
            }),
        }
    }

    pub fn env(&self) -> &Env {
        &self.imp.env
    }

    pub fn params(&self) -> &Cell {
        &self.imp.params
    }

    pub fn body(&self) -> &Cell {
        &self.imp.body
    }

    pub fn is_macro(&self) -> bool {
        self.imp.is_macro
    }

    pub fn ptr_eq(&self, other: &Procedure) -> bool {
        Rc::ptr_eq(&self.imp, &other.imp)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.imp) as usize
    }
}

// ── Native functions ──────────────────────────────────────────────

pub type NativeFnInner = dyn Fn(&[Cell]) -> Result<Cell, SkimError>;

/// A host-provided callable with a name, installable into an environment.
pub struct Function {
    pub name: Symbol,
    pub func: Box<NativeFnInner>,
}

impl Function {
    pub fn new(
        name: Symbol,
        f: impl Fn(&[Cell]) -> Result<Cell, SkimError> + 'static,
    ) -> Rc<Self> {
        Rc::new(Function {
            name,
            func: Box::new(f),
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<function {}>", self.name.name())
    }
}

// ── Environment ───────────────────────────────────────────────────

/// A lexical environment frame: bindings plus an optional parent. Cloning
/// an `Env` clones the handle, not the frame.
#[derive(Debug, Clone)]
pub struct Env {
    bindings: Rc<RefCell<HashMap<Symbol, Cell>>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(HashMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Env>) -> Self {
        Env {
            bindings: Rc::new(RefCell::new(HashMap::new())),
            parent: Some(parent),
        }
    }

    pub fn parent(&self) -> Option<&Rc<Env>> {
        self.parent.as_ref()
    }

    /// Search this frame and the parent chain.
    pub fn get(&self, sym: Symbol) -> Option<Cell> {
        if let Some(val) = self.bindings.borrow().get(&sym) {
            Some(val.clone())
        } else if let Some(parent) = &self.parent {
            parent.get(sym)
        } else {
            None
        }
    }

    /// Insert or overwrite in this frame only.
    pub fn define(&self, sym: Symbol, val: Cell) {
        self.bindings.borrow_mut().insert(sym, val);
    }

    /// Remove a binding from this frame only.
    pub fn remove(&self, sym: Symbol) -> Option<Cell> {
        self.bindings.borrow_mut().remove(&sym)
    }

    /// Mutate the nearest enclosing binding; false when unbound.
    pub fn set_existing(&self, sym: Symbol, val: Cell) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(entry) = bindings.get_mut(&sym) {
            *entry = val;
            true
        } else {
            drop(bindings);
            match &self.parent {
                Some(parent) => parent.set_existing(sym, val),
                None => false,
            }
        }
    }

    /// Create a child frame binding `params` to `args`.
    ///
    /// `params` is a single symbol (captures all arguments as a list), a
    /// proper list of symbols (fixed arity) or a dotted list (fixed prefix
    /// plus rest-list).
    pub fn extend(parent: Rc<Env>, params: &Cell, mut args: Vec<Cell>) -> Result<Env, SkimError> {
        let env = Env::with_parent(parent);
        let mut formal = params.clone();
        let mut taken = 0usize;
        loop {
            match formal {
                Cell::Symbol(sym) => {
                    // rest parameter: bind the remaining arguments as a list
                    env.define(sym, Cell::list_from_vec(args.split_off(taken)));
                    return Ok(env);
                }
                Cell::Nil => {
                    if taken != args.len() {
                        return Err(SkimError::arity("lambda", taken.to_string(), args.len()));
                    }
                    return Ok(env);
                }
                Cell::Pair(pair) => {
                    let (car, cdr) = {
                        let p = pair.borrow();
                        (p.car.clone(), p.cdr.clone())
                    };
                    let sym = car.as_symbol()?;
                    if taken >= args.len() {
                        return Err(SkimError::arity(
                            "lambda",
                            format!("{}+", taken + 1),
                            args.len(),
                        ));
                    }
                    env.define(sym, args[taken].clone());
                    taken += 1;
                    formal = cdr;
                }
                other => {
                    return Err(SkimError::type_error("parameter list", other.type_name()));
                }
            }
        }
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.bindings) as *const u8 as usize
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.bindings, &other.bindings)
    }
}

// ── Primitive opcodes and special-form tags ───────────────────────

/// Tags for special forms and primitive operations. The global environment
/// binds each canonical name to its `Cell::Intern` value; the evaluator
/// dispatches on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intern {
    // Special forms
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplice,
    If,
    Cond,
    Else,
    Arrow,
    When,
    Unless,
    And,
    Or,
    Begin,
    Define,
    SetBang,
    Lambda,
    DefineMacro,
    Apply,

    // Equivalence
    OpEq,
    OpEqv,
    OpEqual,

    // Numbers
    OpIsNum,
    OpIsComplex,
    OpIsReal,
    OpIsInt,
    OpIsExact,
    OpIsInexact,
    OpIsExactInt,
    OpExact,
    OpInexact,
    OpIsOdd,
    OpIsEven,
    OpNumEq,
    OpNumLt,
    OpNumGt,
    OpNumLe,
    OpNumGe,
    OpMin,
    OpMax,
    OpIsPos,
    OpIsNeg,
    OpIsZero,
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpMod,
    OpRem,
    OpQuotient,
    OpFloor,
    OpCeil,
    OpTrunc,
    OpRound,
    OpSin,
    OpCos,
    OpTan,
    OpAsin,
    OpAcos,
    OpAtan,
    OpSinh,
    OpCosh,
    OpTanh,
    OpAsinh,
    OpAcosh,
    OpAtanh,
    OpSqrt,
    OpCbrt,
    OpExp,
    OpPow,
    OpSquare,
    OpLog,
    OpLog10,
    OpAbs,
    OpRealPart,
    OpImagPart,
    OpArg,
    OpConj,
    OpRect,
    OpPolar,
    OpHypot,
    OpStrNum,
    OpNumStr,

    // Booleans
    OpNot,
    OpIsBool,
    OpIsBoolEq,

    // Pairs and lists
    OpCons,
    OpCar,
    OpCdr,
    OpCaar,
    OpCadr,
    OpCdar,
    OpCddr,
    OpCaddr,
    OpSetCar,
    OpSetCdr,
    OpList,
    OpIsNull,
    OpIsPair,
    OpIsList,
    OpMakeList,
    OpLength,
    OpAppend,
    OpReverse,
    OpListRef,
    OpListTail,
    OpListCopy,
    OpMemq,
    OpMember,
    OpAssq,
    OpAssoc,

    // Symbols
    OpIsSym,
    OpSymStr,
    OpStrSym,
    OpGensym,

    // Characters
    OpIsChar,
    OpCharEq,
    OpCharLt,
    OpCharGt,
    OpCharLe,
    OpCharGe,
    OpCharCiEq,
    OpCharCiLt,
    OpCharCiGt,
    OpCharCiLe,
    OpCharCiGe,
    OpIsAlpha,
    OpIsDigit,
    OpIsSpace,
    OpIsUpper,
    OpIsLower,
    OpCharInt,
    OpIntChar,
    OpDigitVal,
    OpUpcase,
    OpDowncase,

    // Strings
    OpIsStr,
    OpMakeStr,
    OpStr,
    OpStrLen,
    OpStrRef,
    OpStrSet,
    OpStrEq,
    OpStrLt,
    OpStrGt,
    OpStrLe,
    OpStrGe,
    OpStrAppend,
    OpSubstr,
    OpStrList,
    OpListStr,
    OpStrCopy,
    OpStrFill,
    OpStrUpcase,
    OpStrDowncase,

    // Vectors
    OpIsVec,
    OpMakeVec,
    OpVec,
    OpVecLen,
    OpVecRef,
    OpVecSet,
    OpVecList,
    OpListVec,
    OpVecFill,
    OpVecCopy,
    OpVecAppend,

    // Control
    OpIsProc,
    OpIsMacro,
    OpMap,
    OpForEach,
    OpEval,
    OpMacroExpand,
    OpError,
    OpExit,

    // Ports and I/O
    OpIsPort,
    OpIsInPort,
    OpIsOutPort,
    OpInPort,
    OpOutPort,
    OpOpenInFile,
    OpOpenOutFile,
    OpClosePort,
    OpOpenInStr,
    OpOpenOutStr,
    OpGetOutStr,
    OpRead,
    OpReadChar,
    OpPeekChar,
    OpReadLine,
    OpEofObject,
    OpIsEof,
    OpFlush,
    OpWrite,
    OpDisplay,
    OpNewline,
    OpWriteChar,
    OpWriteStr,
    OpLoad,

    // Regular expressions
    OpRegex,
    OpRegexMatch,
    OpRegexSearch,

    // Clocks
    OpClock,
    OpClockTic,
    OpClockToc,
    OpClockPause,
    OpClockResume,

    // Dictionaries
    OpMakeDict,
    OpDictIsEmpty,
    OpDictSize,
    OpDictClear,
    OpDictErase,
    OpDictInsert,
    OpDictFind,
    OpDictHas,
    OpDictList,

    // Misc
    OpUseCount,
    OpHash,
}

impl Intern {
    /// True for the special-form tags whose arguments are not uniformly
    /// evaluated.
    pub fn is_syntax(self) -> bool {
        use Intern::*;
        matches!(
            self,
            Quote
                | Quasiquote
                | Unquote
                | UnquoteSplice
                | If
                | Cond
                | Else
                | Arrow
                | When
                | Unless
                | And
                | Or
                | Begin
                | Define
                | SetBang
                | Lambda
                | DefineMacro
                | Apply
        )
    }

    /// Canonical name for the syntax tags; primitive opcodes have none.
    pub fn syntax_name(self) -> Option<&'static str> {
        use Intern::*;
        Some(match self {
            Quote => "quote",
            Quasiquote => "quasiquote",
            Unquote => "unquote",
            UnquoteSplice => "unquote-splicing",
            If => "if",
            Cond => "cond",
            Else => "else",
            Arrow => "=>",
            When => "when",
            Unless => "unless",
            And => "and",
            Or => "or",
            Begin => "begin",
            Define => "define",
            SetBang => "set!",
            Lambda => "lambda",
            DefineMacro => "define-macro",
            Apply => "apply",
            _ => return None,
        })
    }
}

// ── The Cell variant ──────────────────────────────────────────────

pub type Dict = BTreeMap<Cell, Cell>;

/// The universal Scheme value: a tagged union over every supported type.
/// Cloning is cheap; heap-bearing variants share ownership of their
/// payload.
#[derive(Debug, Clone)]
pub enum Cell {
    /// No observable value; returned by side-effecting primitives.
    None,
    /// The empty list.
    Nil,
    Bool(bool),
    Char(char),
    Number(Number),
    Symbol(Symbol),
    Intern(Intern),
    String(Rc<RefCell<String>>),
    Vector(Rc<RefCell<Vec<Cell>>>),
    Regex(Rc<Regex>),
    Map(Rc<RefCell<Dict>>),
    Pair(Rc<RefCell<Pair>>),
    Env(Env),
    Port(Rc<RefCell<Port>>),
    Clock(Rc<RefCell<Clock>>),
    Procedure(Procedure),
    Function(Rc<Function>),
}

impl Cell {
    // -- Constructors --

    pub fn cons(car: Cell, cdr: Cell) -> Cell {
        Cell::Pair(Rc::new(RefCell::new(Pair {
            car,
            cdr,
            mark: false,
        })))
    }

    pub fn int(n: i64) -> Cell {
        Cell::Number(Number::Int(n))
    }

    pub fn real(x: f64) -> Cell {
        Cell::Number(Number::Real(x))
    }

    pub fn string(s: impl Into<String>) -> Cell {
        Cell::String(Rc::new(RefCell::new(s.into())))
    }

    pub fn symbol(name: &str) -> Cell {
        Cell::Symbol(intern(name))
    }

    pub fn vector(items: Vec<Cell>) -> Cell {
        Cell::Vector(Rc::new(RefCell::new(items)))
    }

    pub fn dict(map: Dict) -> Cell {
        Cell::Map(Rc::new(RefCell::new(map)))
    }

    pub fn port(port: Port) -> Cell {
        Cell::Port(Rc::new(RefCell::new(port)))
    }

    pub fn clock(clock: Clock) -> Cell {
        Cell::Clock(Rc::new(RefCell::new(clock)))
    }

    /// Compile a `#re"…"` pattern; case-insensitive like the literal form.
    pub fn regex(pattern: &str) -> Result<Cell, SkimError> {
        let re = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SkimError::eval(format!("invalid regex: {e}")))?;
        Ok(Cell::Regex(Rc::new(re)))
    }

    /// Build a proper list, right-nested and Nil-terminated.
    pub fn list_from_vec(items: Vec<Cell>) -> Cell {
        let mut list = Cell::Nil;
        for item in items.into_iter().rev() {
            list = Cell::cons(item, list);
        }
        list
    }

    // -- Predicates --

    pub fn is_none(&self) -> bool {
        matches!(self, Cell::None)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Cell::Nil)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Cell::Pair(_))
    }

    /// Only `#f` is false.
    pub fn is_true(&self) -> bool {
        !matches!(self, Cell::Bool(false))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Cell::Bool(false))
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Cell::Char(EOF_CHAR))
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Cell::Procedure(p) if p.is_macro())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::None => "none",
            Cell::Nil => "()",
            Cell::Bool(_) => "boolean",
            Cell::Char(_) => "character",
            Cell::Number(_) => "number",
            Cell::Symbol(_) => "symbol",
            Cell::Intern(_) => "primop",
            Cell::String(_) => "string",
            Cell::Vector(_) => "vector",
            Cell::Regex(_) => "regex",
            Cell::Map(_) => "dict",
            Cell::Pair(_) => "pair",
            Cell::Env(_) => "environment",
            Cell::Port(_) => "port",
            Cell::Clock(_) => "clock",
            Cell::Procedure(_) => "procedure",
            Cell::Function(_) => "function",
        }
    }

    // -- Typed accessors --

    pub fn as_number(&self) -> Result<Number, SkimError> {
        match self {
            Cell::Number(n) => Ok(*n),
            other => Err(SkimError::type_error("number", other.type_name())),
        }
    }

    pub fn as_symbol(&self) -> Result<Symbol, SkimError> {
        match self {
            Cell::Symbol(s) => Ok(*s),
            other => Err(SkimError::type_error("symbol", other.type_name())),
        }
    }

    pub fn as_char(&self) -> Result<char, SkimError> {
        match self {
            Cell::Char(c) => Ok(*c),
            other => Err(SkimError::type_error("character", other.type_name())),
        }
    }

    pub fn as_string(&self) -> Result<Rc<RefCell<String>>, SkimError> {
        match self {
            Cell::String(s) => Ok(Rc::clone(s)),
            other => Err(SkimError::type_error("string", other.type_name())),
        }
    }

    pub fn as_vector(&self) -> Result<Rc<RefCell<Vec<Cell>>>, SkimError> {
        match self {
            Cell::Vector(v) => Ok(Rc::clone(v)),
            other => Err(SkimError::type_error("vector", other.type_name())),
        }
    }

    pub fn as_dict(&self) -> Result<Rc<RefCell<Dict>>, SkimError> {
        match self {
            Cell::Map(m) => Ok(Rc::clone(m)),
            other => Err(SkimError::type_error("dict", other.type_name())),
        }
    }

    pub fn as_port(&self) -> Result<Rc<RefCell<Port>>, SkimError> {
        match self {
            Cell::Port(p) => Ok(Rc::clone(p)),
            other => Err(SkimError::type_error("port", other.type_name())),
        }
    }

    pub fn as_pair(&self) -> Result<Rc<RefCell<Pair>>, SkimError> {
        match self {
            Cell::Pair(p) => Ok(Rc::clone(p)),
            other => Err(SkimError::type_error("pair", other.type_name())),
        }
    }

    // -- Pair access --

    pub fn car(&self) -> Result<Cell, SkimError> {
        Ok(self.as_pair()?.borrow().car.clone())
    }

    pub fn cdr(&self) -> Result<Cell, SkimError> {
        Ok(self.as_pair()?.borrow().cdr.clone())
    }

    pub fn caar(&self) -> Result<Cell, SkimError> {
        self.car()?.car()
    }

    pub fn cadr(&self) -> Result<Cell, SkimError> {
        self.cdr()?.car()
    }

    pub fn cdar(&self) -> Result<Cell, SkimError> {
        self.car()?.cdr()
    }

    pub fn cddr(&self) -> Result<Cell, SkimError> {
        self.cdr()?.cdr()
    }

    pub fn caddr(&self) -> Result<Cell, SkimError> {
        self.cddr()?.car()
    }

    pub fn set_car(&self, val: Cell) -> Result<(), SkimError> {
        self.as_pair()?.borrow_mut().car = val;
        Ok(())
    }

    pub fn set_cdr(&self, val: Cell) -> Result<(), SkimError> {
        self.as_pair()?.borrow_mut().cdr = val;
        Ok(())
    }

    // -- List traversal --

    /// Collect a proper list into a vector; improper tails are an error.
    pub fn list_to_vec(&self) -> Result<Vec<Cell>, SkimError> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        loop {
            match cur {
                Cell::Nil => return Ok(out),
                Cell::Pair(pair) => {
                    let (car, cdr) = {
                        let p = pair.borrow();
                        (p.car.clone(), p.cdr.clone())
                    };
                    out.push(car);
                    cur = cdr;
                }
                other => {
                    return Err(SkimError::type_error("proper list", other.type_name()));
                }
            }
        }
    }

    /// True for a proper Nil-terminated list or a circular list.
    pub fn is_list(&self) -> bool {
        let mut fast = self.clone();
        let mut slow = self.clone();
        loop {
            // two steps for the hare
            for _ in 0..2 {
                let next = match &fast {
                    Cell::Nil => return true,
                    Cell::Pair(p) => p.borrow().cdr.clone(),
                    _ => return false,
                };
                fast = next;
            }
            // one for the tortoise
            slow = match &slow {
                Cell::Pair(p) => p.borrow().cdr.clone(),
                _ => return false,
            };
            if let (Cell::Pair(a), Cell::Pair(b)) = (&fast, &slow) {
                if Rc::ptr_eq(a, b) {
                    return true; // circular
                }
            }
        }
    }

    /// Length of a proper list, or the period length of a circular list.
    pub fn list_length(&self) -> Result<i64, SkimError> {
        let mut len = 0i64;
        let mut fast = self.clone();
        let mut slow = self.clone();
        let mut step = false;
        loop {
            let next = match &fast {
                Cell::Nil => return Ok(len),
                Cell::Pair(p) => p.borrow().cdr.clone(),
                other => {
                    return Err(SkimError::type_error("proper list", other.type_name()));
                }
            };
            len += 1;
            fast = next;
            if step {
                if let Cell::Pair(sp) = slow.clone() {
                    slow = sp.borrow().cdr.clone();
                }
            }
            step = !step;
            if let (Cell::Pair(a), Cell::Pair(b)) = (&fast, &slow) {
                if Rc::ptr_eq(a, b) {
                    return Ok(len);
                }
            }
        }
    }

    /// Shared-handle use count, or zero for a value-type cell.
    pub fn use_count(&self) -> usize {
        match self {
            Cell::String(rc) => Rc::strong_count(rc),
            Cell::Vector(rc) => Rc::strong_count(rc),
            Cell::Regex(rc) => Rc::strong_count(rc),
            Cell::Map(rc) => Rc::strong_count(rc),
            Cell::Pair(rc) => Rc::strong_count(rc),
            Cell::Port(rc) => Rc::strong_count(rc),
            Cell::Clock(rc) => Rc::strong_count(rc),
            Cell::Function(rc) => Rc::strong_count(rc),
            _ => 0,
        }
    }
}

// ── Equality ──────────────────────────────────────────────────────

/// Scalar and identity equality (`eqv?`): numbers compare numerically
/// across the lattice, heap payloads compare by handle identity.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::None, Cell::None) => true,
            (Cell::Nil, Cell::Nil) => true,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Char(a), Cell::Char(b)) => a == b,
            (Cell::Number(a), Cell::Number(b)) => a == b,
            (Cell::Symbol(a), Cell::Symbol(b)) => a == b,
            (Cell::Intern(a), Cell::Intern(b)) => a == b,
            (Cell::String(a), Cell::String(b)) => Rc::ptr_eq(a, b),
            (Cell::Vector(a), Cell::Vector(b)) => Rc::ptr_eq(a, b),
            (Cell::Regex(a), Cell::Regex(b)) => Rc::ptr_eq(a, b),
            (Cell::Map(a), Cell::Map(b)) => Rc::ptr_eq(a, b),
            (Cell::Pair(a), Cell::Pair(b)) => Rc::ptr_eq(a, b),
            (Cell::Env(a), Cell::Env(b)) => a == b,
            (Cell::Port(a), Cell::Port(b)) => Rc::ptr_eq(a, b),
            (Cell::Clock(a), Cell::Clock(b)) => Rc::ptr_eq(a, b),
            (Cell::Procedure(a), Cell::Procedure(b)) => a.ptr_eq(b),
            (Cell::Function(a), Cell::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Deep `equal?`: lists and vectors compare element-wise, strings by
/// characters; everything else falls back to `eqv?`.
pub fn is_equal(lhs: &Cell, rhs: &Cell) -> bool {
    match (lhs, rhs) {
        (Cell::Pair(a), Cell::Pair(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let (lcar, lcdr) = {
                let p = a.borrow();
                (p.car.clone(), p.cdr.clone())
            };
            let (rcar, rcdr) = {
                let p = b.borrow();
                (p.car.clone(), p.cdr.clone())
            };
            is_equal(&lcar, &rcar) && is_equal(&lcdr, &rcdr)
        }
        (Cell::Vector(a), Cell::Vector(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| is_equal(x, y))
        }
        (Cell::String(a), Cell::String(b)) => *a.borrow() == *b.borrow(),
        _ => lhs == rhs,
    }
}

// ── Ordering (dictionary keys) ────────────────────────────────────

fn type_order(cell: &Cell) -> u8 {
    match cell {
        Cell::None => 0,
        Cell::Nil => 1,
        Cell::Bool(_) => 2,
        Cell::Char(_) => 3,
        Cell::Number(_) => 4,
        Cell::Symbol(_) => 5,
        Cell::Intern(_) => 6,
        Cell::String(_) => 7,
        Cell::Vector(_) => 8,
        Cell::Regex(_) => 9,
        Cell::Map(_) => 10,
        Cell::Pair(_) => 11,
        Cell::Env(_) => 12,
        Cell::Port(_) => 13,
        Cell::Clock(_) => 14,
        Cell::Procedure(_) => 15,
        Cell::Function(_) => 16,
    }
}

fn addr_of(cell: &Cell) -> usize {
    match cell {
        Cell::String(rc) => Rc::as_ptr(rc) as usize,
        Cell::Vector(rc) => Rc::as_ptr(rc) as usize,
        Cell::Regex(rc) => Rc::as_ptr(rc) as usize,
        Cell::Map(rc) => Rc::as_ptr(rc) as usize,
        Cell::Pair(rc) => Rc::as_ptr(rc) as usize,
        Cell::Port(rc) => Rc::as_ptr(rc) as usize,
        Cell::Clock(rc) => Rc::as_ptr(rc) as usize,
        Cell::Function(rc) => Rc::as_ptr(rc) as usize,
        Cell::Procedure(p) => p.addr(),
        Cell::Env(e) => e.addr(),
        _ => 0,
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Char(a), Cell::Char(b)) => a.cmp(b),
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Symbol(a), Cell::Symbol(b)) => {
                a.with_name(|an| b.with_name(|bn| an.cmp(bn)))
            }
            (Cell::Intern(a), Cell::Intern(b)) => a.cmp(b),
            (Cell::String(a), Cell::String(b)) => a.borrow().cmp(&b.borrow()),
            (Cell::Vector(a), Cell::Vector(b)) => {
                if Rc::ptr_eq(a, b) {
                    Ordering::Equal
                } else {
                    a.borrow().cmp(&b.borrow())
                }
            }
            _ => {
                let (ta, tb) = (type_order(self), type_order(other));
                if ta != tb {
                    ta.cmp(&tb)
                } else {
                    addr_of(self).cmp(&addr_of(other))
                }
            }
        }
    }
}

// ── Hashing ───────────────────────────────────────────────────────

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        type_order(self).hash(state);
        match self {
            Cell::None | Cell::Nil => {}
            Cell::Bool(b) => b.hash(state),
            Cell::Char(c) => c.hash(state),
            Cell::Number(n) => n.hash(state),
            Cell::Symbol(s) => s.id().hash(state),
            Cell::Intern(op) => (*op as usize).hash(state),
            Cell::String(s) => s.borrow().hash(state),
            other => addr_of(other).hash(state),
        }
    }
}

// ── Printing ──────────────────────────────────────────────────────

fn write_char_name(c: char) -> Option<&'static str> {
    Some(match c {
        ' ' => "space",
        '\n' => "newline",
        '\t' => "tab",
        '\r' => "return",
        '\u{7}' => "alarm",
        '\u{8}' => "backspace",
        '\u{7f}' => "delete",
        '\u{1b}' => "escape",
        '\0' => "null",
        EOF_CHAR => "eof",
        _ => return None,
    })
}

/// Print a pair chain, guarding against cycles with a hare/tortoise scan;
/// a detected cycle prints a bounded `…)` tail.
fn fmt_pair(
    f: &mut fmt::Formatter<'_>,
    pair: &Rc<RefCell<Pair>>,
    display: bool,
) -> fmt::Result {
    write!(f, "(")?;
    fmt_form(f, &pair.borrow().car, display)?;
    let mut fast = pair.borrow().cdr.clone();
    let mut slow = fast.clone();
    let mut step = false;
    loop {
        let next = match &fast {
            Cell::Nil => return write!(f, ")"),
            Cell::Pair(p) => {
                write!(f, " ")?;
                fmt_form(f, &p.borrow().car, display)?;
                p.borrow().cdr.clone()
            }
            tail => {
                write!(f, " . ")?;
                fmt_form(f, tail, display)?;
                return write!(f, ")");
            }
        };
        fast = next;
        if step {
            if let Cell::Pair(sp) = slow.clone() {
                slow = sp.borrow().cdr.clone();
            }
        }
        step = !step;
        if let (Cell::Pair(a), Cell::Pair(b)) = (&fast, &slow) {
            if Rc::ptr_eq(a, b) {
                return write!(f, " ...)");
            }
        }
    }
}

/// Expand the stored escape sequences of a string for display: `\a \b \n
/// \r \t` become their control characters, anything else the literal
/// following character.
fn fmt_string_display(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('a') => write!(f, "\u{7}")?,
                Some('b') => write!(f, "\u{8}")?,
                Some('n') => writeln!(f)?,
                Some('r') => write!(f, "\r")?,
                Some('t') => write!(f, "\t")?,
                Some(other) => write!(f, "{other}")?,
                None => write!(f, "\\")?,
            }
        } else {
            write!(f, "{c}")?;
        }
    }
    Ok(())
}

fn fmt_form(f: &mut fmt::Formatter<'_>, cell: &Cell, display: bool) -> fmt::Result {
    match cell {
        Cell::None => write!(f, "#<none>"),
        Cell::Nil => write!(f, "()"),
        Cell::Bool(true) => write!(f, "#t"),
        Cell::Bool(false) => write!(f, "#f"),
        Cell::Char(c) => {
            if display {
                if *c == EOF_CHAR {
                    write!(f, "#\\eof")
                } else {
                    write!(f, "{c}")
                }
            } else {
                match write_char_name(*c) {
                    Some(name) => write!(f, "#\\{name}"),
                    None => write!(f, "#\\{c}"),
                }
            }
        }
        Cell::Number(n) => write!(f, "{n}"),
        Cell::Symbol(sym) => sym.with_name(|name| {
            if name.contains(char::is_whitespace) {
                write!(f, "|{name}|")
            } else {
                write!(f, "{name}")
            }
        }),
        Cell::Intern(op) => match op.syntax_name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "#<primop>"),
        },
        Cell::String(s) => {
            if display {
                fmt_string_display(f, &s.borrow())
            } else {
                write!(f, "\"{}\"", &*s.borrow())
            }
        }
        Cell::Vector(v) => {
            let items = v.borrow();
            if items.is_empty() {
                return write!(f, "#()");
            }
            write!(f, "#(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                fmt_form(f, item, display)?;
            }
            write!(f, ")")
        }
        Cell::Regex(_) => write!(f, "#<regex>"),
        Cell::Map(_) => write!(f, "#<dict>"),
        Cell::Pair(pair) => fmt_pair(f, pair, display),
        Cell::Env(env) => write!(f, "#<symenv {:#x}>", env.addr()),
        Cell::Port(_) => write!(f, "#<port>"),
        Cell::Clock(clock) => write!(f, "#<clock {}>", &*clock.borrow()),
        Cell::Procedure(p) => {
            if p.is_macro() {
                write!(f, "#<macro>")
            } else {
                write!(f, "#<clojure>")
            }
        }
        Cell::Function(func) => write!(f, "#<function {}>", func.name.name()),
    }
}

/// The write form: strings keep their escapes, characters print `#\X`.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_form(f, self, false)
    }
}

/// The display form: strings expand escapes, characters print raw.
pub struct DisplayForm<'a>(pub &'a Cell);

impl fmt::Display for DisplayForm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_form(f, self.0, true)
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let a = intern("foo");
        let b = intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name(), "foo");
        assert_ne!(intern("bar"), a);
    }

    #[test]
    fn gensym_is_fresh() {
        let a = gensym();
        let b = gensym();
        assert_ne!(a, b);
    }

    #[test]
    fn nil_is_not_a_pair() {
        assert!(Cell::Nil.is_nil());
        assert!(!Cell::Nil.is_pair());
        assert!(Cell::cons(Cell::Nil, Cell::Nil).is_pair());
    }

    #[test]
    fn truthiness() {
        assert!(!Cell::Bool(false).is_true());
        assert!(Cell::Bool(true).is_true());
        assert!(Cell::int(0).is_true());
        assert!(Cell::Nil.is_true());
        assert!(Cell::None.is_true());
    }

    #[test]
    fn list_roundtrip() {
        let list = Cell::list_from_vec(vec![Cell::int(1), Cell::int(2), Cell::int(3)]);
        assert_eq!(list.list_length().unwrap(), 3);
        let items = list.list_to_vec().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Cell::int(1));
        assert_eq!(list.to_string(), "(1 2 3)");
    }

    #[test]
    fn dotted_pair_prints() {
        let pair = Cell::cons(Cell::int(1), Cell::int(2));
        assert_eq!(pair.to_string(), "(1 . 2)");
    }

    #[test]
    fn circular_list_prints_bounded() {
        let pair = Cell::cons(Cell::int(1), Cell::Nil);
        pair.set_cdr(pair.clone()).unwrap();
        let printed = pair.to_string();
        assert!(printed.ends_with("...)"), "got {printed}");
        assert!(pair.is_list());
    }

    #[test]
    fn eq_is_identity_for_pairs() {
        let a = Cell::cons(Cell::int(1), Cell::Nil);
        let b = Cell::cons(Cell::int(1), Cell::Nil);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(is_equal(&a, &b));
    }

    #[test]
    fn env_chain_lookup_and_set() {
        let top = Env::new();
        let x = intern("x");
        top.define(x, Cell::int(1));
        let child = Env::with_parent(Rc::new(top.clone()));
        assert_eq!(child.get(x), Some(Cell::int(1)));
        assert!(child.set_existing(x, Cell::int(2)));
        assert_eq!(top.get(x), Some(Cell::int(2)));
        assert!(!child.set_existing(intern("missing"), Cell::Nil));
    }

    #[test]
    fn extend_binds_three_param_shapes() {
        let top = Rc::new(Env::new());
        let args = vec![Cell::int(1), Cell::int(2), Cell::int(3)];

        // single symbol captures everything
        let env = Env::extend(top.clone(), &Cell::symbol("rest"), args.clone()).unwrap();
        assert_eq!(env.get(intern("rest")).unwrap().list_length().unwrap(), 3);

        // fixed arity
        let params = Cell::list_from_vec(vec![
            Cell::symbol("a"),
            Cell::symbol("b"),
            Cell::symbol("c"),
        ]);
        let env = Env::extend(top.clone(), &params, args.clone()).unwrap();
        assert_eq!(env.get(intern("b")), Some(Cell::int(2)));
        assert!(Env::extend(top.clone(), &params, vec![Cell::int(1)]).is_err());

        // dotted: (a . rest)
        let dotted = Cell::cons(Cell::symbol("a"), Cell::symbol("more"));
        let env = Env::extend(top, &dotted, args).unwrap();
        assert_eq!(env.get(intern("a")), Some(Cell::int(1)));
        assert_eq!(env.get(intern("more")).unwrap().list_length().unwrap(), 2);
    }

    #[test]
    fn symbol_with_whitespace_prints_quoted() {
        let sym = Cell::symbol("hello world");
        assert_eq!(sym.to_string(), "|hello world|");
    }

    #[test]
    fn char_print_forms() {
        assert_eq!(Cell::Char('\n').to_string(), "#\\newline");
        assert_eq!(Cell::Char('x').to_string(), "#\\x");
        assert_eq!(Cell::Char(EOF_CHAR).to_string(), "#\\eof");
        assert_eq!(format!("{}", DisplayForm(&Cell::Char('\n'))), "\n");
    }

    #[test]
    fn string_display_expands_escapes() {
        let s = Cell::string("a\\nb");
        assert_eq!(s.to_string(), "\"a\\nb\"");
        assert_eq!(format!("{}", DisplayForm(&s)), "a\nb");
    }

    #[test]
    fn dict_accepts_heterogeneous_keys() {
        let mut map = Dict::new();
        map.insert(Cell::int(1), Cell::string("one"));
        map.insert(Cell::symbol("two"), Cell::int(2));
        map.insert(Cell::string("three"), Cell::Nil);
        let dict = Cell::dict(map);
        let m = dict.as_dict().unwrap();
        assert_eq!(m.borrow().len(), 3);
        assert_eq!(
            m.borrow().get(&Cell::symbol("two")).cloned(),
            Some(Cell::int(2))
        );
    }
}
