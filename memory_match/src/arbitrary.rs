use std::ops::RangeInclusive;

use quickcheck::{Arbitrary, Gen};

use crate::BoardGenerator;

/// Board constraints small enough to be enumerated, but large enough
/// to include both satisfiable and unsatisfiable combinations.
#[derive(Clone, Debug)]
pub struct BoardConstraints {
    pub min_pairs: u32,
    pub max_pairs: u32,
    pub max_rows: u32,
    pub max_columns: u32,
}

impl BoardConstraints {
    pub fn pair_range(&self) -> RangeInclusive<u32> {
        self.min_pairs..=self.max_pairs
    }

    pub fn generator(&self) -> BoardGenerator {
        BoardGenerator::new(self.pair_range(), self.max_rows, self.max_columns)
    }
}

impl Arbitrary for BoardConstraints {
    fn arbitrary(g: &mut Gen) -> Self {
        let min_pairs = u32::from(u8::arbitrary(g) % 12) + 1;
        let max_pairs = min_pairs + u32::from(u8::arbitrary(g) % 8);
        let max_rows = u32::from(u8::arbitrary(g) % 8) + 1;
        let max_columns = u32::from(u8::arbitrary(g) % 8) + 1;
        BoardConstraints {
            min_pairs,
            max_pairs,
            max_rows,
            max_columns,
        }
    }
}
