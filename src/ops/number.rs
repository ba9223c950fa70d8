use std::fmt;

/// A numeric scalar as seen by an [`Operations`](crate::ops::Operations) algebra.
///
/// Trees keep whatever precision their format has; codecs narrow explicitly
/// through [`Number::to_integer`], [`Number::to_f32`] and [`Number::to_f64`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

// i64::MIN and 2^64 as floats; anything outside is not an integer we can hold.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const U64_END_F: f64 = 18_446_744_073_709_551_616.0;

impl Number {
    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::UInt(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }

    /// Checked narrowing into any integer width.
    ///
    /// Floats are accepted only when they carry no fractional part.
    pub fn to_integer<T>(self) -> Option<T>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        match self {
            Number::Int(v) => T::try_from(v).ok(),
            Number::UInt(v) => T::try_from(v).ok(),
            Number::Float(v) => {
                if !v.is_finite() || v.fract() != 0.0 {
                    return None;
                }
                if v < 0.0 {
                    if v < I64_MIN_F {
                        return None;
                    }
                    T::try_from(v as i64).ok()
                } else {
                    if v >= U64_END_F {
                        return None;
                    }
                    T::try_from(v as u64).ok()
                }
            }
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::UInt(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// `None` when a finite value would overflow to infinity.
    pub fn to_f32(self) -> Option<f32> {
        let wide = self.to_f64();
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            None
        } else {
            Some(narrow)
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::UInt(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! number_from_lossless {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Int(i64::from(value))
                }
            }
        )*
    };
}

number_from_lossless!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        // keep small unsigned values in the signed arm so equal numbers compare equal
        match i64::try_from(value) {
            Ok(v) => Number::Int(v),
            Err(_) => Number::UInt(value),
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(f64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_within_range() {
        assert_eq!(Number::Int(127).to_integer::<i8>(), Some(127i8));
        assert_eq!(Number::Int(128).to_integer::<i8>(), None);
        assert_eq!(Number::Int(-1).to_integer::<u32>(), None);
        assert_eq!(Number::UInt(u64::MAX).to_integer::<u64>(), Some(u64::MAX));
        assert_eq!(Number::UInt(u64::MAX).to_integer::<i64>(), None);
    }

    #[test]
    fn floats_must_be_whole_to_become_integers() {
        assert_eq!(Number::Float(3.0).to_integer::<i32>(), Some(3));
        assert_eq!(Number::Float(-3.0).to_integer::<i32>(), Some(-3));
        assert_eq!(Number::Float(3.5).to_integer::<i32>(), None);
        assert_eq!(Number::Float(f64::NAN).to_integer::<i32>(), None);
        assert_eq!(Number::Float(1e20).to_integer::<i64>(), None);
    }

    #[test]
    fn f32_overflow_is_rejected() {
        assert_eq!(Number::Float(1.5).to_f32(), Some(1.5));
        assert_eq!(Number::Float(1e300).to_f32(), None);
        assert_eq!(Number::Int(7).to_f32(), Some(7.0));
    }

    #[test]
    fn unsigned_values_prefer_the_signed_arm() {
        assert_eq!(Number::from(5u64), Number::Int(5));
        assert_eq!(Number::from(u64::MAX), Number::UInt(u64::MAX));
        assert!(Number::from(0u8).is_zero());
    }
}
