use skim_core::{check_arity, Cell, Env, Intern, Number, SkimError};
use skim_reader::strnum;

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "+", Intern::OpAdd);
    bind(env, "-", Intern::OpSub);
    bind(env, "*", Intern::OpMul);
    bind(env, "/", Intern::OpDiv);
    bind(env, "modulo", Intern::OpMod);
    bind(env, "remainder", Intern::OpRem);
    bind(env, "quotient", Intern::OpQuotient);
    bind(env, "=", Intern::OpNumEq);
    bind(env, "<", Intern::OpNumLt);
    bind(env, ">", Intern::OpNumGt);
    bind(env, "<=", Intern::OpNumLe);
    bind(env, ">=", Intern::OpNumGe);
    bind(env, "min", Intern::OpMin);
    bind(env, "max", Intern::OpMax);
    bind(env, "zero?", Intern::OpIsZero);
    bind(env, "positive?", Intern::OpIsPos);
    bind(env, "negative?", Intern::OpIsNeg);
    bind(env, "odd?", Intern::OpIsOdd);
    bind(env, "even?", Intern::OpIsEven);
    bind(env, "floor", Intern::OpFloor);
    bind(env, "ceiling", Intern::OpCeil);
    bind(env, "truncate", Intern::OpTrunc);
    bind(env, "round", Intern::OpRound);
    bind(env, "sin", Intern::OpSin);
    bind(env, "cos", Intern::OpCos);
    bind(env, "tan", Intern::OpTan);
    bind(env, "asin", Intern::OpAsin);
    bind(env, "acos", Intern::OpAcos);
    bind(env, "atan", Intern::OpAtan);
    bind(env, "sinh", Intern::OpSinh);
    bind(env, "cosh", Intern::OpCosh);
    bind(env, "tanh", Intern::OpTanh);
    bind(env, "asinh", Intern::OpAsinh);
    bind(env, "acosh", Intern::OpAcosh);
    bind(env, "atanh", Intern::OpAtanh);
    bind(env, "sqrt", Intern::OpSqrt);
    bind(env, "cbrt", Intern::OpCbrt);
    bind(env, "exp", Intern::OpExp);
    bind(env, "expt", Intern::OpPow);
    bind(env, "square", Intern::OpSquare);
    bind(env, "log", Intern::OpLog);
    bind(env, "log10", Intern::OpLog10);
    bind(env, "abs", Intern::OpAbs);
    bind(env, "magnitude", Intern::OpAbs);
    bind(env, "real-part", Intern::OpRealPart);
    bind(env, "imag-part", Intern::OpImagPart);
    bind(env, "angle", Intern::OpArg);
    bind(env, "conjugate", Intern::OpConj);
    bind(env, "make-rectangular", Intern::OpRect);
    bind(env, "make-polar", Intern::OpPolar);
    bind(env, "hypot", Intern::OpHypot);
    bind(env, "exact", Intern::OpExact);
    bind(env, "inexact", Intern::OpInexact);
    bind(env, "string->number", Intern::OpStrNum);
    bind(env, "number->string", Intern::OpNumStr);
}

fn numbers(args: &[Cell]) -> Result<Vec<Number>, SkimError> {
    args.iter().map(|a| a.as_number()).collect()
}

/// Chain a comparison over a variadic argument list: true when every
/// adjacent pair satisfies it.
fn chain(args: &[Cell], cmp: impl Fn(&Number, &Number) -> bool) -> Result<Cell, SkimError> {
    let nums = numbers(args)?;
    if nums.len() < 2 {
        return Err(SkimError::arity("comparison", "2+", nums.len()));
    }
    Ok(Cell::Bool(nums.windows(2).all(|w| cmp(&w[0], &w[1]))))
}

fn int_only(op_name: &str, n: &Number) -> Result<i64, SkimError> {
    match n {
        Number::Int(v) => Ok(*v),
        Number::Real(x) if x.fract() == 0.0 => Ok(*x as i64),
        _ => Err(SkimError::type_error(
            format!("integer for {op_name}"),
            "non-integral number",
        )),
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpAdd => {
            let mut acc = Number::Int(0);
            for n in numbers(args)? {
                acc = acc.add(&n);
            }
            Ok(Cell::Number(acc))
        }
        OpSub => {
            check_arity!(args, "-", 1..);
            let nums = numbers(args)?;
            if nums.len() == 1 {
                return Ok(Cell::Number(nums[0].neg()));
            }
            let mut acc = nums[0];
            for n in &nums[1..] {
                acc = acc.sub(n);
            }
            Ok(Cell::Number(acc))
        }
        OpMul => {
            let mut acc = Number::Int(1);
            for n in numbers(args)? {
                acc = acc.mul(&n);
            }
            Ok(Cell::Number(acc))
        }
        OpDiv => {
            check_arity!(args, "/", 1..);
            let nums = numbers(args)?;
            if nums.len() == 1 {
                return Ok(Cell::Number(Number::Int(1).div(&nums[0])?));
            }
            let mut acc = nums[0];
            for n in &nums[1..] {
                acc = acc.div(n)?;
            }
            Ok(Cell::Number(acc))
        }
        OpMod => {
            check_arity!(args, "modulo", 2);
            Ok(Cell::Number(
                args[0].as_number()?.modulo(&args[1].as_number()?)?,
            ))
        }
        OpRem => {
            check_arity!(args, "remainder", 2);
            Ok(Cell::Number(
                args[0].as_number()?.rem(&args[1].as_number()?)?,
            ))
        }
        OpQuotient => {
            check_arity!(args, "quotient", 2);
            Ok(Cell::Number(
                args[0].as_number()?.quotient(&args[1].as_number()?)?,
            ))
        }

        OpNumEq => chain(args, |a, b| a == b),
        OpNumLt => chain(args, |a, b| a < b),
        OpNumGt => chain(args, |a, b| a > b),
        OpNumLe => chain(args, |a, b| a <= b),
        OpNumGe => chain(args, |a, b| a >= b),

        OpMin => {
            check_arity!(args, "min", 1..);
            let nums = numbers(args)?;
            let mut acc = nums[0];
            for n in &nums[1..] {
                acc = acc.min(n);
            }
            Ok(Cell::Number(acc))
        }
        OpMax => {
            check_arity!(args, "max", 1..);
            let nums = numbers(args)?;
            let mut acc = nums[0];
            for n in &nums[1..] {
                acc = acc.max(n);
            }
            Ok(Cell::Number(acc))
        }

        OpIsZero => {
            check_arity!(args, "zero?", 1);
            Ok(Cell::Bool(args[0].as_number()?.is_zero()))
        }
        OpIsPos => {
            check_arity!(args, "positive?", 1);
            Ok(Cell::Bool(args[0].as_number()? > Number::Int(0)))
        }
        OpIsNeg => {
            check_arity!(args, "negative?", 1);
            Ok(Cell::Bool(args[0].as_number()? < Number::Int(0)))
        }
        OpIsOdd => {
            check_arity!(args, "odd?", 1);
            let n = int_only("odd?", &args[0].as_number()?)?;
            Ok(Cell::Bool(n % 2 != 0))
        }
        OpIsEven => {
            check_arity!(args, "even?", 1);
            let n = int_only("even?", &args[0].as_number()?)?;
            Ok(Cell::Bool(n % 2 == 0))
        }

        OpFloor => {
            check_arity!(args, "floor", 1);
            Ok(Cell::Number(args[0].as_number()?.floor()))
        }
        OpCeil => {
            check_arity!(args, "ceiling", 1);
            Ok(Cell::Number(args[0].as_number()?.ceil()))
        }
        OpTrunc => {
            check_arity!(args, "truncate", 1);
            Ok(Cell::Number(args[0].as_number()?.truncate()))
        }
        OpRound => {
            check_arity!(args, "round", 1);
            Ok(Cell::Number(args[0].as_number()?.round()))
        }

        OpSin => {
            check_arity!(args, "sin", 1);
            Ok(Cell::Number(args[0].as_number()?.sin()))
        }
        OpCos => {
            check_arity!(args, "cos", 1);
            Ok(Cell::Number(args[0].as_number()?.cos()))
        }
        OpTan => {
            check_arity!(args, "tan", 1);
            Ok(Cell::Number(args[0].as_number()?.tan()))
        }
        OpAsin => {
            check_arity!(args, "asin", 1);
            Ok(Cell::Number(args[0].as_number()?.asin()))
        }
        OpAcos => {
            check_arity!(args, "acos", 1);
            Ok(Cell::Number(args[0].as_number()?.acos()))
        }
        OpAtan => {
            check_arity!(args, "atan", 1..=2);
            if args.len() == 2 {
                let y = args[0].as_number()?.to_f64();
                let x = args[1].as_number()?.to_f64();
                Ok(Cell::Number(Number::Real(y.atan2(x))))
            } else {
                Ok(Cell::Number(args[0].as_number()?.atan()))
            }
        }
        OpSinh => {
            check_arity!(args, "sinh", 1);
            Ok(Cell::Number(args[0].as_number()?.sinh()))
        }
        OpCosh => {
            check_arity!(args, "cosh", 1);
            Ok(Cell::Number(args[0].as_number()?.cosh()))
        }
        OpTanh => {
            check_arity!(args, "tanh", 1);
            Ok(Cell::Number(args[0].as_number()?.tanh()))
        }
        OpAsinh => {
            check_arity!(args, "asinh", 1);
            Ok(Cell::Number(args[0].as_number()?.asinh()))
        }
        OpAcosh => {
            check_arity!(args, "acosh", 1);
            Ok(Cell::Number(args[0].as_number()?.acosh()))
        }
        OpAtanh => {
            check_arity!(args, "atanh", 1);
            Ok(Cell::Number(args[0].as_number()?.atanh()))
        }

        OpSqrt => {
            check_arity!(args, "sqrt", 1);
            Ok(Cell::Number(args[0].as_number()?.sqrt()))
        }
        OpCbrt => {
            check_arity!(args, "cbrt", 1);
            Ok(Cell::Number(args[0].as_number()?.cbrt()))
        }
        OpExp => {
            check_arity!(args, "exp", 1);
            Ok(Cell::Number(args[0].as_number()?.exp()))
        }
        OpPow => {
            check_arity!(args, "expt", 2);
            Ok(Cell::Number(
                args[0].as_number()?.pow(&args[1].as_number()?),
            ))
        }
        OpSquare => {
            check_arity!(args, "square", 1);
            let n = args[0].as_number()?;
            Ok(Cell::Number(n.mul(&n)))
        }
        OpLog => {
            check_arity!(args, "log", 1);
            Ok(Cell::Number(args[0].as_number()?.log()))
        }
        OpLog10 => {
            check_arity!(args, "log10", 1);
            Ok(Cell::Number(args[0].as_number()?.log10()))
        }
        OpAbs => {
            check_arity!(args, "abs", 1);
            Ok(Cell::Number(args[0].as_number()?.abs()))
        }

        OpRealPart => {
            check_arity!(args, "real-part", 1);
            Ok(Cell::Number(args[0].as_number()?.real_part()))
        }
        OpImagPart => {
            check_arity!(args, "imag-part", 1);
            Ok(Cell::Number(args[0].as_number()?.imag_part()))
        }
        OpArg => {
            check_arity!(args, "angle", 1);
            Ok(Cell::Number(args[0].as_number()?.arg()))
        }
        OpConj => {
            check_arity!(args, "conjugate", 1);
            Ok(Cell::Number(args[0].as_number()?.conj()))
        }
        OpRect => {
            check_arity!(args, "make-rectangular", 2);
            let re = args[0].as_number()?.to_f64();
            let im = args[1].as_number()?.to_f64();
            Ok(Cell::Number(Number::from_parts(re, im)))
        }
        OpPolar => {
            check_arity!(args, "make-polar", 2);
            let r = args[0].as_number()?.to_f64();
            let theta = args[1].as_number()?.to_f64();
            Ok(Cell::Number(Number::from_parts(
                r * theta.cos(),
                r * theta.sin(),
            )))
        }
        OpHypot => {
            check_arity!(args, "hypot", 2..=3);
            let x = args[0].as_number()?;
            let y = args[1].as_number()?;
            if args.len() == 3 {
                let z = args[2].as_number()?.to_f64();
                let xy = x.to_f64().hypot(y.to_f64());
                Ok(Cell::Number(Number::Real(xy.hypot(z))))
            } else {
                Ok(Cell::Number(x.hypot(&y)))
            }
        }

        OpExact => {
            check_arity!(args, "exact", 1);
            Ok(Cell::Number(args[0].as_number()?.truncate()))
        }
        OpInexact => {
            check_arity!(args, "inexact", 1);
            let n = args[0].as_number()?;
            Ok(Cell::Number(match n {
                Number::Int(v) => Number::Real(v as f64),
                other => other,
            }))
        }

        OpStrNum => {
            check_arity!(args, "string->number", 1);
            let s = args[0].as_string()?;
            let text = s.borrow().clone();
            Ok(match strnum(&text) {
                Some(n) => Cell::Number(n),
                None => Cell::Bool(false),
            })
        }
        OpNumStr => {
            check_arity!(args, "number->string", 1);
            let n = args[0].as_number()?;
            Ok(Cell::string(n.to_string()))
        }

        _ => Err(SkimError::eval("invalid primary operation")),
    }
}
