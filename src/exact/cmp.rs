use std::cmp::Ordering;

use num_traits::Zero;

use crate::exact::BigFloat;

impl BigFloat {
    fn sign_rank(&self) -> i8 {
        match (self.significand.is_zero(), self.sign) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        }
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        let lead = |value: &Self| value.exponent + value.significand.bits() as i64;
        lead(self).cmp(&lead(other)).then_with(|| {
            let exponent = self.exponent.min(other.exponent);
            let lhs = &self.significand << (self.exponent - exponent) as u64;
            let rhs = &other.significand << (other.exponent - exponent) as u64;
            lhs.cmp(&rhs)
        })
    }
}

impl Ord for BigFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.sign_rank();
        rank.cmp(&other.sign_rank()).then_with(|| match rank {
            1 => self.cmp_magnitude(other),
            -1 => other.cmp_magnitude(self),
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rstest::rstest;

    use super::*;
    use crate::exact::ExactValue;
    use crate::tests::*;

    #[rstest]
    fn test_ord_matches_f64(mut rng: impl Rng, n_experiments: usize) {
        let a = BigFloat::from_f64(1.5).unwrap();
        let b = BigFloat::from_f64(2.5).unwrap();
        assert!(a < b);
        assert!(b.negated() < a.negated());
        assert!(BigFloat::zero() > b.negated());
        assert_eq!(a.cmp(&a), Ordering::Equal);

        for _ in 0..n_experiments {
            let x = random_f64(&mut rng);
            let y = if rng.random_bool(0.1) { x } else { random_f64(&mut rng) };
            let expected = x.partial_cmp(&y).unwrap();
            let ex = BigFloat::from_f64(x).unwrap();
            let ey = BigFloat::from_f64(y).unwrap();
            assert_eq!(ex.cmp(&ey), expected, "{x:e} vs {y:e}");
        }
    }

    #[rstest]
    fn test_ord_beyond_f64() {
        let max = BigFloat::from_f64(f64::MAX).unwrap();
        let twice = max.plus(&max);
        let tiny = BigFloat::from_f64(f64::from_bits(1)).unwrap();
        let half_tiny = tiny.times(&BigFloat::from_f64(0.5).unwrap());

        assert!(twice > max);
        assert!(twice.negated() < max.negated());
        assert!(half_tiny < tiny);
        assert!(half_tiny > BigFloat::zero());
        // Same leading bit, different low bits
        assert!(max.plus(&tiny) > max);
    }
}
