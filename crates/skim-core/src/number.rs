use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::SkimError;

/// Golden-ratio constant used to chain the complex hash components.
const HASH_CHAIN: u64 = 0x9e37_79b9;

/// A complex number with two binary64 components.
///
/// The corpus ships no complex-number crate; this mirrors the usual
/// `(re, im)` pair with only the operations the tower needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    pub fn abs(self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }

    pub fn from_polar(r: f64, theta: f64) -> Self {
        Complex::new(r * theta.cos(), r * theta.sin())
    }

    pub fn add(self, rhs: Self) -> Self {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }

    pub fn mul(self, rhs: Self) -> Self {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }

    pub fn div(self, rhs: Self) -> Self {
        let d = rhs.re * rhs.re + rhs.im * rhs.im;
        Complex::new(
            (self.re * rhs.re + self.im * rhs.im) / d,
            (self.im * rhs.re - self.re * rhs.im) / d,
        )
    }

    pub fn exp(self) -> Self {
        Complex::from_polar(self.re.exp(), self.im)
    }

    pub fn ln(self) -> Self {
        Complex::new(self.abs().ln(), self.arg())
    }

    pub fn sqrt(self) -> Self {
        Complex::from_polar(self.abs().sqrt(), self.arg() / 2.0)
    }

    pub fn powc(self, rhs: Self) -> Self {
        // z^w = exp(w ln z), with 0^0 = 1 and 0^w = 0 by convention
        if self.re == 0.0 && self.im == 0.0 {
            if rhs.re == 0.0 && rhs.im == 0.0 {
                return Complex::new(1.0, 0.0);
            }
            return Complex::new(0.0, 0.0);
        }
        rhs.mul(self.ln()).exp()
    }

    pub fn sin(self) -> Self {
        Complex::new(
            self.re.sin() * self.im.cosh(),
            self.re.cos() * self.im.sinh(),
        )
    }

    pub fn cos(self) -> Self {
        Complex::new(
            self.re.cos() * self.im.cosh(),
            -self.re.sin() * self.im.sinh(),
        )
    }

    pub fn tan(self) -> Self {
        self.sin().div(self.cos())
    }
}

/// The numeric tower: a 64-bit integer, an IEEE-754 double, or a complex
/// pair of doubles.
///
/// A complex with zero imaginary part never survives construction through
/// [`Number::from_parts`]; it collapses to its real component, and further
/// to `Int` when that component equals its integer truncation. A plain
/// `Real` never auto-collapses: only `exact` and `truncate` coerce it.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Real(f64),
    Complex(Complex),
}

impl Number {
    /// Build a number from rectangular parts, applying the zero-imaginary
    /// normalization.
    pub fn from_parts(re: f64, im: f64) -> Self {
        if im == 0.0 {
            if re.fract() == 0.0 && re >= i64::MIN as f64 && re <= i64::MAX as f64 {
                Number::Int(re as i64)
            } else {
                Number::Real(re)
            }
        } else {
            Number::Complex(Complex::new(re, im))
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Number::Real(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Number::Complex(_))
    }

    /// True for Int, and for Real whose value equals its truncation.
    pub fn is_integer(&self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Real(x) => x.fract() == 0.0,
            Number::Complex(_) => false,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => *n == 0,
            Number::Real(x) => *x == 0.0,
            Number::Complex(z) => z.re == 0.0 && z.im == 0.0,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Real(x) => *x,
            Number::Complex(z) => z.abs(),
        }
    }

    pub fn to_complex(&self) -> Complex {
        match self {
            Number::Int(n) => Complex::new(*n as f64, 0.0),
            Number::Real(x) => Complex::new(*x, 0.0),
            Number::Complex(z) => *z,
        }
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Int(n) => n
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Real(-(*n as f64))),
            Number::Real(x) => Number::Real(-x),
            Number::Complex(z) => Number::Complex(Complex::new(-z.re, -z.im)),
        }
    }

    pub fn add(&self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(*b)
                .map(Number::Int)
                .unwrap_or(Number::Real(*a as f64 + *b as f64)),
            _ if self.is_complex() || rhs.is_complex() => {
                let z = self.to_complex().add(rhs.to_complex());
                Number::complex_result(z)
            }
            _ => Number::Real(self.to_f64() + rhs.to_f64()),
        }
    }

    pub fn sub(&self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(*b)
                .map(Number::Int)
                .unwrap_or(Number::Real(*a as f64 - *b as f64)),
            _ if self.is_complex() || rhs.is_complex() => {
                let z = self.to_complex().sub(rhs.to_complex());
                Number::complex_result(z)
            }
            _ => Number::Real(self.to_f64() - rhs.to_f64()),
        }
    }

    pub fn mul(&self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(*b)
                .map(Number::Int)
                .unwrap_or(Number::Real(*a as f64 * *b as f64)),
            _ if self.is_complex() || rhs.is_complex() => {
                let z = self.to_complex().mul(rhs.to_complex());
                Number::complex_result(z)
            }
            _ => Number::Real(self.to_f64() * rhs.to_f64()),
        }
    }

    /// Division. An exact zero divisor is an error; Real and Complex
    /// division follow IEEE-754.
    pub fn div(&self, rhs: &Number) -> Result<Number, SkimError> {
        match (self, rhs) {
            (_, Number::Int(0)) => Err(SkimError::Arithmetic("division by zero".into())),
            (Number::Int(a), Number::Int(b)) => match a.checked_div(*b) {
                Some(q) if q.checked_mul(*b) == Some(*a) => Ok(Number::Int(q)),
                _ => Ok(Number::Real(*a as f64 / *b as f64)),
            },
            _ if self.is_complex() || rhs.is_complex() => {
                let z = self.to_complex().div(rhs.to_complex());
                Ok(Number::complex_result(z))
            }
            _ => Ok(Number::Real(self.to_f64() / rhs.to_f64())),
        }
    }

    pub fn rem(&self, rhs: &Number) -> Result<Number, SkimError> {
        match (self, rhs) {
            (_, Number::Int(0)) => Err(SkimError::Arithmetic("remainder by zero".into())),
            (Number::Int(a), Number::Int(b)) => {
                Ok(Number::Int(a.checked_rem(*b).unwrap_or(0)))
            }
            (Number::Complex(_), _) | (_, Number::Complex(_)) => Err(SkimError::type_error(
                "real number",
                "complex number",
            )),
            _ => Ok(Number::Real(self.to_f64() % rhs.to_f64())),
        }
    }

    pub fn modulo(&self, rhs: &Number) -> Result<Number, SkimError> {
        match (self, rhs) {
            (_, Number::Int(0)) => Err(SkimError::Arithmetic("modulo by zero".into())),
            (Number::Int(a), Number::Int(b)) => {
                let r = a.checked_rem(*b).unwrap_or(0);
                // the result takes the divisor's sign
                let m = if (r > 0 && *b < 0) || (r < 0 && *b > 0) {
                    r + b
                } else {
                    r
                };
                Ok(Number::Int(m))
            }
            (Number::Complex(_), _) | (_, Number::Complex(_)) => Err(SkimError::type_error(
                "real number",
                "complex number",
            )),
            _ => {
                let (a, b) = (self.to_f64(), rhs.to_f64());
                Ok(Number::Real(a - b * (a / b).floor()))
            }
        }
    }

    pub fn quotient(&self, rhs: &Number) -> Result<Number, SkimError> {
        match (self, rhs) {
            (_, Number::Int(0)) => Err(SkimError::Arithmetic("quotient by zero".into())),
            (Number::Int(a), Number::Int(b)) => match a.checked_div(*b) {
                Some(q) => Ok(Number::Int(q)),
                None => Ok(Number::Real(*a as f64 / *b as f64)),
            },
            (Number::Complex(_), _) | (_, Number::Complex(_)) => Err(SkimError::type_error(
                "real number",
                "complex number",
            )),
            _ => Ok(Number::Real((self.to_f64() / rhs.to_f64()).trunc())),
        }
    }

    /// Collapse a computed complex back into the tower.
    fn complex_result(z: Complex) -> Number {
        Number::from_parts(z.re, z.im)
    }

    /// Truncate toward zero, coercing to Int when in range.
    pub fn truncate(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(*n),
            Number::Real(x) => {
                let t = x.trunc();
                if t >= i64::MIN as f64 && t <= i64::MAX as f64 {
                    Number::Int(t as i64)
                } else {
                    Number::Real(t)
                }
            }
            Number::Complex(z) => Number::from_parts(z.re.trunc(), z.im.trunc()),
        }
    }

    pub fn floor(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(*n),
            Number::Real(x) => Number::Real(x.floor()),
            Number::Complex(z) => Number::from_parts(z.re.floor(), z.im.floor()),
        }
    }

    pub fn ceil(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(*n),
            Number::Real(x) => Number::Real(x.ceil()),
            Number::Complex(z) => Number::from_parts(z.re.ceil(), z.im.ceil()),
        }
    }

    pub fn round(&self) -> Number {
        match self {
            Number::Int(n) => Number::Int(*n),
            Number::Real(x) => Number::Real(x.round()),
            Number::Complex(z) => Number::from_parts(z.re.round(), z.im.round()),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Int(n) => n
                .checked_abs()
                .map(Number::Int)
                .unwrap_or(Number::Real((*n as f64).abs())),
            Number::Real(x) => Number::Real(x.abs()),
            Number::Complex(z) => Number::Real(z.abs()),
        }
    }

    /// Apply a real function, promoting through complex when the input is
    /// complex.
    fn map_real(&self, f: fn(f64) -> f64, g: fn(Complex) -> Complex) -> Number {
        match self {
            Number::Complex(z) => Number::complex_result(g(*z)),
            _ => Number::Real(f(self.to_f64())),
        }
    }

    pub fn sin(&self) -> Number {
        self.map_real(f64::sin, Complex::sin)
    }

    pub fn cos(&self) -> Number {
        self.map_real(f64::cos, Complex::cos)
    }

    pub fn tan(&self) -> Number {
        self.map_real(f64::tan, Complex::tan)
    }

    pub fn asin(&self) -> Number {
        Number::Real(self.to_f64().asin())
    }

    pub fn acos(&self) -> Number {
        Number::Real(self.to_f64().acos())
    }

    pub fn atan(&self) -> Number {
        Number::Real(self.to_f64().atan())
    }

    pub fn sinh(&self) -> Number {
        Number::Real(self.to_f64().sinh())
    }

    pub fn cosh(&self) -> Number {
        Number::Real(self.to_f64().cosh())
    }

    pub fn tanh(&self) -> Number {
        Number::Real(self.to_f64().tanh())
    }

    pub fn asinh(&self) -> Number {
        Number::Real(self.to_f64().asinh())
    }

    pub fn acosh(&self) -> Number {
        Number::Real(self.to_f64().acosh())
    }

    pub fn atanh(&self) -> Number {
        Number::Real(self.to_f64().atanh())
    }

    pub fn exp(&self) -> Number {
        self.map_real(f64::exp, Complex::exp)
    }

    pub fn log(&self) -> Number {
        match self {
            Number::Complex(z) => Number::complex_result(z.ln()),
            _ => {
                let x = self.to_f64();
                if x < 0.0 {
                    // log of a negative real lands on the complex plane
                    Number::complex_result(Complex::new(x, 0.0).ln())
                } else {
                    Number::Real(x.ln())
                }
            }
        }
    }

    pub fn log10(&self) -> Number {
        Number::Real(self.to_f64().log10())
    }

    pub fn sqrt(&self) -> Number {
        match self {
            Number::Complex(z) => Number::complex_result(z.sqrt()),
            _ => {
                let x = self.to_f64();
                if x < 0.0 {
                    Number::complex_result(Complex::new(0.0, (-x).sqrt()))
                } else {
                    Number::Real(x.sqrt())
                }
            }
        }
    }

    pub fn cbrt(&self) -> Number {
        Number::Real(self.to_f64().cbrt())
    }

    pub fn pow(&self, rhs: &Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) if *b >= 0 => {
                if let Ok(exp) = u32::try_from(*b) {
                    if let Some(n) = a.checked_pow(exp) {
                        return Number::Int(n);
                    }
                }
                Number::Real((*a as f64).powf(*b as f64))
            }
            _ if self.is_complex() || rhs.is_complex() => {
                Number::complex_result(self.to_complex().powc(rhs.to_complex()))
            }
            _ => {
                let (a, b) = (self.to_f64(), rhs.to_f64());
                if a < 0.0 && b.fract() != 0.0 {
                    Number::complex_result(Complex::new(a, 0.0).powc(Complex::new(b, 0.0)))
                } else {
                    Number::Real(a.powf(b))
                }
            }
        }
    }

    pub fn real_part(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Real(z.re),
            other => *other,
        }
    }

    pub fn imag_part(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Real(z.im),
            Number::Real(_) => Number::Real(0.0),
            Number::Int(_) => Number::Int(0),
        }
    }

    pub fn arg(&self) -> Number {
        Number::Real(self.to_complex().arg())
    }

    pub fn conj(&self) -> Number {
        match self {
            Number::Complex(z) => Number::Complex(z.conj()),
            other => *other,
        }
    }

    pub fn hypot(&self, rhs: &Number) -> Number {
        Number::Real(self.to_f64().hypot(rhs.to_f64()))
    }

    pub fn min(&self, rhs: &Number) -> Number {
        if rhs < self {
            *rhs
        } else {
            *self
        }
    }

    pub fn max(&self, rhs: &Number) -> Number {
        if rhs > self {
            *rhs
        } else {
            *self
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Real(x)
    }
}

// ── Comparison across the lattice ─────────────────────────────────

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Complex(a), Number::Complex(b)) => a.re == b.re && a.im == b.im,
            (Number::Complex(z), other) | (other, Number::Complex(z)) => {
                z.im == 0.0 && z.re == other.to_f64()
            }
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.partial_cmp(b),
            // Complex ordering uses the modulus
            _ if self.is_complex() || other.is_complex() => {
                self.to_complex().abs().partial_cmp(&other.to_complex().abs())
            }
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

/// Total order for dictionary keys; NaN sorts by bit pattern.
impl Number {
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.to_f64().to_bits().cmp(&other.to_f64().to_bits()))
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Number::Int(n) => n.hash(state),
            Number::Real(x) => x.to_bits().hash(state),
            Number::Complex(z) => {
                let a = z.re.to_bits();
                let b = z.im.to_bits();
                let mut c = z.abs().to_bits().wrapping_add(0x0765_432f);
                c ^= a
                    .wrapping_add(HASH_CHAIN)
                    .wrapping_add(c << 6)
                    .wrapping_add(c >> 2);
                c ^= b
                    .wrapping_add(HASH_CHAIN)
                    .wrapping_add(c << 6)
                    .wrapping_add(c >> 2);
                c.hash(state);
            }
        }
    }
}

// ── Printing ──────────────────────────────────────────────────────

fn fmt_imag(f: &mut fmt::Formatter<'_>, im: f64) -> fmt::Result {
    if im == 1.0 {
        write!(f, "+i")
    } else if im == -1.0 {
        write!(f, "-i")
    } else if im < 0.0 {
        write!(f, "-{:e}i", -im)
    } else {
        write!(f, "+{:e}i", im)
    }
}

/// Int prints in decimal, Real in scientific form, Complex as `a+bi` with
/// `+i`/`-i` abbreviations for a unit imaginary part.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Real(x) => write!(f, "{x:e}"),
            Number::Complex(z) => {
                write!(f, "{:e}", z.re)?;
                fmt_imag(f, z.im)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_collapses_zero_imaginary() {
        assert_eq!(Number::from_parts(-1.0, 0.0), Number::Int(-1));
        assert_eq!(Number::from_parts(2.5, 0.0), Number::Real(2.5));
        assert!(Number::from_parts(1.0, 2.0).is_complex());
    }

    #[test]
    fn real_does_not_autocollapse() {
        let x = Number::Real(3.0);
        assert!(x.is_real());
        assert_eq!(x.truncate(), Number::Int(3));
    }

    #[test]
    fn i_times_i_is_minus_one() {
        let i = Number::Complex(Complex::new(0.0, 1.0));
        assert_eq!(i.mul(&i), Number::Int(-1));
    }

    #[test]
    fn int_overflow_falls_back_to_real() {
        let big = Number::Int(i64::MAX);
        match big.add(&Number::Int(1)) {
            Number::Real(_) => {}
            other => panic!("expected Real, got {other:?}"),
        }
    }

    #[test]
    fn division_identities() {
        assert_eq!(
            Number::Int(10).div(&Number::Int(2)).unwrap(),
            Number::Int(5)
        );
        assert_eq!(
            Number::Int(5).div(&Number::Int(2)).unwrap(),
            Number::Real(2.5)
        );
        assert!(Number::Int(1).div(&Number::Int(0)).is_err());
    }

    #[test]
    fn cross_lattice_comparison() {
        assert_eq!(Number::Int(2), Number::Real(2.0));
        assert!(Number::Int(1) < Number::Real(1.5));
        assert!(Number::Complex(Complex::new(3.0, 4.0)) > Number::Int(4));
        assert_eq!(
            Number::Complex(Complex::new(2.0, 0.0)),
            Number::Complex(Complex::new(2.0, 0.0))
        );
    }

    #[test]
    fn complex_hash_differs_from_parts() {
        use std::collections::hash_map::DefaultHasher;
        fn h(n: &Number) -> u64 {
            let mut s = DefaultHasher::new();
            n.hash(&mut s);
            s.finish()
        }
        let z = Number::Complex(Complex::new(1.0, 2.0));
        let w = Number::Complex(Complex::new(2.0, 1.0));
        assert_ne!(h(&z), h(&w));
    }

    #[test]
    fn scientific_print_roundtrip_shape() {
        assert_eq!(Number::Int(42).to_string(), "42");
        assert_eq!(Number::Real(2.5).to_string(), "2.5e0");
        assert_eq!(
            Number::Complex(Complex::new(1.0, 1.0)).to_string(),
            "1e0+i"
        );
        assert_eq!(
            Number::Complex(Complex::new(0.0, -1.0)).to_string(),
            "0e0-i"
        );
        assert_eq!(
            Number::Complex(Complex::new(1.5, -2.5)).to_string(),
            "1.5e0-2.5e0i"
        );
    }

    #[test]
    fn sqrt_of_negative_goes_complex() {
        match Number::Int(-4).sqrt() {
            Number::Complex(z) => {
                assert!(z.re.abs() < 1e-12);
                assert!((z.im - 2.0).abs() < 1e-12);
            }
            other => panic!("expected complex, got {other:?}"),
        }
    }
}
