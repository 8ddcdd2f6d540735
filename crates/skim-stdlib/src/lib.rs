//! The fixed primitive-operation table: every opcode the evaluator can
//! dispatch, grouped by domain, plus the name registration that seeds the
//! global environment.
#![allow(clippy::mutable_key_type)]

mod arithmetic;
mod chars;
mod clock_ops;
mod dict;
mod io;
mod list;
mod meta;
mod predicates;
mod regex_ops;
mod string;
mod symbol;
mod vector;

use skim_core::{intern, Cell, Env, Intern, SkimError};

pub(crate) fn bind(env: &Env, name: &str, op: Intern) {
    env.define(intern(name), Cell::Intern(op));
}

/// Bind the special-form tags to their canonical names. The evaluator
/// recognizes a special form by resolving its head symbol to one of these.
fn register_syntax(env: &Env) {
    bind(env, "quote", Intern::Quote);
    bind(env, "quasiquote", Intern::Quasiquote);
    bind(env, "unquote", Intern::Unquote);
    bind(env, "unquote-splicing", Intern::UnquoteSplice);
    bind(env, "if", Intern::If);
    bind(env, "cond", Intern::Cond);
    bind(env, "else", Intern::Else);
    bind(env, "=>", Intern::Arrow);
    bind(env, "when", Intern::When);
    bind(env, "unless", Intern::Unless);
    bind(env, "and", Intern::And);
    bind(env, "or", Intern::Or);
    bind(env, "begin", Intern::Begin);
    bind(env, "define", Intern::Define);
    bind(env, "set!", Intern::SetBang);
    bind(env, "lambda", Intern::Lambda);
    bind(env, "define-macro", Intern::DefineMacro);
    bind(env, "apply", Intern::Apply);
}

/// Install every primitive and special-form binding into `env`.
pub fn register_stdlib(env: &Env) {
    register_syntax(env);
    predicates::register(env);
    arithmetic::register(env);
    list::register(env);
    symbol::register(env);
    chars::register(env);
    string::register(env);
    vector::register(env);
    dict::register(env);
    regex_ops::register(env);
    clock_ops::register(env);
    io::register(env);
    meta::register(env);
}

/// Dispatch a primitive opcode over already-evaluated arguments.
///
/// Opcodes that re-enter the evaluator (`map`, `for-each`, `eval`,
/// `macro-expand`, `load`) are intercepted there and never reach this
/// table.
pub fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpEq | OpEqv | OpEqual | OpNot | OpIsBool | OpIsBoolEq | OpIsNum | OpIsComplex
        | OpIsReal | OpIsInt | OpIsExact | OpIsInexact | OpIsExactInt | OpIsProc | OpIsMacro => {
            predicates::call(op, args)
        }

        OpAdd | OpSub | OpMul | OpDiv | OpMod | OpRem | OpQuotient | OpNumEq | OpNumLt
        | OpNumGt | OpNumLe | OpNumGe | OpMin | OpMax | OpIsZero | OpIsPos | OpIsNeg
        | OpIsOdd | OpIsEven | OpFloor | OpCeil | OpTrunc | OpRound | OpSin | OpCos | OpTan
        | OpAsin | OpAcos | OpAtan | OpSinh | OpCosh | OpTanh | OpAsinh | OpAcosh | OpAtanh
        | OpSqrt | OpCbrt | OpExp | OpPow | OpSquare | OpLog | OpLog10 | OpAbs | OpRealPart
        | OpImagPart | OpArg | OpConj | OpRect | OpPolar | OpHypot | OpExact | OpInexact
        | OpStrNum | OpNumStr => arithmetic::call(op, args),

        OpCons | OpCar | OpCdr | OpCaar | OpCadr | OpCdar | OpCddr | OpCaddr | OpSetCar
        | OpSetCdr | OpList | OpIsNull | OpIsPair | OpIsList | OpMakeList | OpLength
        | OpAppend | OpReverse | OpListRef | OpListTail | OpListCopy | OpMemq | OpMember
        | OpAssq | OpAssoc => list::call(op, args),

        OpIsSym | OpSymStr | OpStrSym | OpGensym => symbol::call(op, args),

        OpIsChar | OpCharEq | OpCharLt | OpCharGt | OpCharLe | OpCharGe | OpCharCiEq
        | OpCharCiLt | OpCharCiGt | OpCharCiLe | OpCharCiGe | OpIsAlpha | OpIsDigit
        | OpIsSpace | OpIsUpper | OpIsLower | OpCharInt | OpIntChar | OpDigitVal | OpUpcase
        | OpDowncase => chars::call(op, args),

        OpIsStr | OpMakeStr | OpStr | OpStrLen | OpStrRef | OpStrSet | OpStrEq | OpStrLt
        | OpStrGt | OpStrLe | OpStrGe | OpStrAppend | OpSubstr | OpStrList | OpListStr
        | OpStrCopy | OpStrFill | OpStrUpcase | OpStrDowncase => string::call(op, args),

        OpIsVec | OpMakeVec | OpVec | OpVecLen | OpVecRef | OpVecSet | OpVecList | OpListVec
        | OpVecFill | OpVecCopy | OpVecAppend => vector::call(op, args),

        OpMakeDict | OpDictIsEmpty | OpDictSize | OpDictClear | OpDictErase | OpDictInsert
        | OpDictFind | OpDictHas | OpDictList => dict::call(op, args),

        OpRegex | OpRegexMatch | OpRegexSearch => regex_ops::call(op, args),

        OpClock | OpClockTic | OpClockToc | OpClockPause | OpClockResume => {
            clock_ops::call(op, args)
        }

        OpIsPort | OpIsInPort | OpIsOutPort | OpInPort | OpOutPort | OpOpenInFile
        | OpOpenOutFile | OpClosePort | OpOpenInStr | OpOpenOutStr | OpGetOutStr | OpRead
        | OpReadChar | OpPeekChar | OpReadLine | OpEofObject | OpIsEof | OpFlush | OpWrite
        | OpDisplay | OpNewline | OpWriteChar | OpWriteStr => io::call(op, args),

        OpError | OpUseCount | OpHash | OpExit => meta::call(op, args),

        _ => Err(SkimError::eval("invalid primary operation")),
    }
}
