use num_bigint::BigUint;
use std::ops::AddAssign;

/// Exact running sum, minimum and maximum of a quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunningAggregate<Q = BigUint> {
    pub total: Q,
    pub min: Q,
    pub max: Q,
}

impl<Q> RunningAggregate<Q>
where
    Q: Clone + Ord + for<'a> AddAssign<&'a Q>,
{
    pub fn new(value: &Q) -> Self {
        Self {
            total: value.clone(),
            min: value.clone(),
            max: value.clone(),
        }
    }

    pub fn update(&mut self, value: &Q) {
        self.total += value;
        if *value < self.min {
            self.min = value.clone();
        }
        if *value > self.max {
            self.max = value.clone();
        }
    }
}
