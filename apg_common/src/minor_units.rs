use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::op;

//--------------------------------------     MinorUnits       --------------------------------------------------------
/// A monetary amount in the smallest unit of its currency (cents for EUR, yen for JPY, fils for KWD).
///
/// This is the representation the Adyen API uses for every `amount.value` field. The currency itself is carried
/// alongside the value wherever it matters.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::MinorUnits;

    #[test]
    fn arithmetic() {
        let a = MinorUnits::from(1000);
        let b = MinorUnits::from(400);
        assert_eq!(a - b, MinorUnits::from(600));
        assert_eq!(-(a + b), MinorUnits::from(-1400));
        let mut c = a;
        c -= b;
        c += MinorUnits::from(1);
        assert_eq!(c.value(), 601);
        let total: MinorUnits = vec![a, b, c].into_iter().sum();
        assert_eq!(total.value(), 2001);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&MinorUnits::from(1250)).unwrap();
        assert_eq!(json, "1250");
        let v: MinorUnits = serde_json::from_str("99").unwrap();
        assert_eq!(v, MinorUnits::from(99));
    }
}
