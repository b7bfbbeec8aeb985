use super::*;

/// Lays out every pair twice and applies a uniform Fisher–Yates shuffle.
#[derive(Clone, Debug, PartialEq)]
pub struct ShuffledBoardGenerator {
    seed: u64,
}

impl ShuffledBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Uniform in-place permutation.
///
/// Each slot swaps with one drawn from the not yet shuffled prefix `0..=i`, never
/// from the whole slice, otherwise some orderings come up more often than others.
pub fn fisher_yates<T>(items: &mut [T], rng: &mut rand::rngs::SmallRng) {
    use rand::prelude::*;

    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

impl BoardGenerator for ShuffledBoardGenerator {
    fn generate(self, size: BoardSize) -> Result<Board> {
        use rand::prelude::*;

        let size = BoardSize::new(size.rows(), size.cols())?;
        let mut pair_keys: Vec<PairKey> = (0..size.pair_count())
            .flat_map(|key| [key, key])
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        fisher_yates(&mut pair_keys, &mut rng);

        log::debug!("generated {} board from seed {}", size, self.seed);
        log::trace!("pair keys: {:?}", pair_keys);
        Board::from_pair_keys(size, &pair_keys)
    }
}
