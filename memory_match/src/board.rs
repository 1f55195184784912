use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CardId, CardPresenter, CardState, LayoutError, TableCard};

/// The shape of a board.
///
/// Always satisfies `rows * columns == 2 * total_pairs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub rows: u32,
    pub columns: u32,
    pub total_pairs: u32,
}

impl BoardLayout {
    /// Cannot overflow: the generator only emits layouts whose card count fits.
    pub fn total_cards(&self) -> u32 {
        self.total_pairs * 2
    }
}

/// The symbols of all cards on a board, in row-major order.
///
/// Every symbol in `0..total_pairs` occurs exactly twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolAssignment(Vec<u32>);

impl SymbolAssignment {
    /// Creates `pairs` distinct symbols, each twice, in a uniformly random order.
    pub fn shuffled<R: Rng + ?Sized>(pairs: u32, rng: &mut R) -> Self {
        let mut symbols: Vec<u32> = (0..pairs).flat_map(|symbol| [symbol, symbol]).collect();
        // Fisher-Yates, front to back
        let len = symbols.len();
        for i in 0..len.saturating_sub(1) {
            let j = rng.gen_range(i..len);
            symbols.swap(i, j);
        }
        Self(symbols)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for SymbolAssignment {
    type Item = u32;

    type IntoIter = std::vec::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Picks the shape and the symbols of new boards under fixed constraints.
#[derive(Clone, Debug)]
pub struct BoardGenerator {
    pair_range: RangeInclusive<u32>,
    max_rows: u32,
    max_columns: u32,
}

impl BoardGenerator {
    pub fn new(pair_range: RangeInclusive<u32>, max_rows: u32, max_columns: u32) -> Self {
        Self {
            pair_range,
            max_rows,
            max_columns,
        }
    }

    /// All `(rows, columns)` shapes that hold exactly `total_cards` cards
    /// and fit the row and column limits, by ascending number of rows.
    pub fn valid_layouts(&self, total_cards: u32) -> Vec<(u32, u32)> {
        (1..=self.max_rows.min(total_cards))
            .filter(|rows| total_cards % rows == 0)
            .map(|rows| (rows, total_cards / rows))
            .filter(|&(_, columns)| columns <= self.max_columns)
            .collect()
    }

    /// The pair counts in the configured range that admit at least one layout.
    pub fn valid_pair_counts(&self) -> Vec<u32> {
        // No board holds more cards than a full grid
        let grid_cards = u64::from(self.max_rows) * u64::from(self.max_columns);
        let largest = u32::try_from(grid_cards / 2).unwrap_or(u32::MAX);
        let (min_pairs, max_pairs) = (*self.pair_range.start(), *self.pair_range.end());
        (min_pairs..=max_pairs.min(largest))
            .filter(|&pairs| self.layouts_for_pairs(pairs).is_some())
            .collect()
    }

    /// The layouts for `pairs` pairs, or `None` if there are none.
    fn layouts_for_pairs(&self, pairs: u32) -> Option<Vec<(u32, u32)>> {
        let layouts = self.valid_layouts(pairs.checked_mul(2)?);
        (!layouts.is_empty()).then_some(layouts)
    }

    /// Chooses a pair count, then a layout for it, both uniformly among the
    /// valid ones, and shuffles the symbols.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(BoardLayout, SymbolAssignment), LayoutError> {
        let (min_pairs, max_pairs) = (*self.pair_range.start(), *self.pair_range.end());
        if min_pairs > max_pairs {
            return Err(LayoutError::InvalidPairRange {
                min_pairs,
                max_pairs,
            });
        }
        let no_valid_configuration = LayoutError::NoValidConfiguration {
            min_pairs,
            max_pairs,
            max_rows: self.max_rows,
            max_columns: self.max_columns,
        };

        let total_pairs = *self
            .valid_pair_counts()
            .choose(rng)
            .ok_or(no_valid_configuration)?;
        let (rows, columns) = *self
            .layouts_for_pairs(total_pairs)
            .unwrap_or_default()
            .choose(rng)
            .ok_or(no_valid_configuration)?;

        let layout = BoardLayout {
            rows,
            columns,
            total_pairs,
        };
        Ok((layout, SymbolAssignment::shuffled(total_pairs, rng)))
    }
}

/// Convenience wrapper around [`BoardGenerator::generate()`].
pub fn generate_board<R: Rng + ?Sized>(
    pair_range: RangeInclusive<u32>,
    max_rows: u32,
    max_columns: u32,
    rng: &mut R,
) -> Result<(BoardLayout, SymbolAssignment), LayoutError> {
    BoardGenerator::new(pair_range, max_rows, max_columns).generate(rng)
}

/// The cards of one session, laid out in a grid.
#[derive(Debug)]
pub struct Board {
    layout: BoardLayout,
    /// Row-major, `cards[i].id() == CardId(i)`.
    cards: Vec<Arc<TableCard>>,
}

impl Board {
    /// Generates a layout and instantiates its cards, all face down.
    pub fn build<R: Rng + ?Sized>(
        generator: &BoardGenerator,
        rng: &mut R,
        presenter: Arc<dyn CardPresenter>,
    ) -> Result<Self, LayoutError> {
        let (layout, symbols) = generator.generate(rng)?;
        debug!(
            rows = layout.rows,
            columns = layout.columns,
            total_pairs = layout.total_pairs,
            "Built board"
        );
        Ok(Self::from_symbols(layout, symbols, presenter))
    }

    /// Instantiates one card per symbol. Card `i` gets `symbols[i]`.
    ///
    /// # Panics
    ///
    /// Panics if there is not exactly one symbol per cell of `layout`.
    pub fn from_symbols(
        layout: BoardLayout,
        symbols: SymbolAssignment,
        presenter: Arc<dyn CardPresenter>,
    ) -> Self {
        assert_eq!(symbols.len(), layout.total_cards() as usize);
        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| Arc::new(TableCard::new(CardId(i), symbol, Arc::clone(&presenter))))
            .collect();
        Self { layout, cards }
    }

    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    pub fn cards(&self) -> &[Arc<TableCard>] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Arc<TableCard>> {
        self.cards.get(id.0)
    }

    pub fn card_at(&self, row: u32, column: u32) -> Option<&Arc<TableCard>> {
        if row >= self.layout.rows || column >= self.layout.columns {
            return None;
        }
        self.cards.get((row * self.layout.columns + column) as usize)
    }

    /// True once every pair has been found.
    pub fn is_cleared(&self) -> bool {
        self.cards
            .iter()
            .all(|card| card.state() == CardState::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::arbitrary::BoardConstraints;
    use crate::{Card, Headless};

    quickcheck! {
        fn generated_layout_fits(input: BoardConstraints, seed: u64) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let generator = input.generator();
            match generator.generate(&mut rng) {
                Ok((layout, symbols)) => {
                    layout.rows * layout.columns == layout.total_pairs * 2
                        && layout.rows <= input.max_rows
                        && layout.columns <= input.max_columns
                        && input.pair_range().contains(&layout.total_pairs)
                        && symbols.len() == layout.total_cards() as usize
                }
                Err(LayoutError::NoValidConfiguration { .. }) => {
                    generator.valid_pair_counts().is_empty()
                }
                Err(LayoutError::InvalidPairRange { .. }) => false,
            }
        }

        fn every_symbol_appears_twice(pairs: u8, seed: u64) -> bool {
            let pairs = u32::from(pairs) + 1;
            let mut rng = StdRng::seed_from_u64(seed);
            let symbols = SymbolAssignment::shuffled(pairs, &mut rng);
            let mut counts = vec![0; pairs as usize];
            for &symbol in symbols.as_slice() {
                counts[symbol as usize] += 1;
            }
            counts.into_iter().all(|count| count == 2)
        }
    }

    #[test]
    fn single_cell_board_has_no_layout() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_board(1..=1, 1, 1, &mut rng),
            Err(LayoutError::NoValidConfiguration {
                min_pairs: 1,
                max_pairs: 1,
                max_rows: 1,
                max_columns: 1,
            })
        );
    }

    #[test]
    fn odd_grid_limits_exclude_some_pair_counts() {
        // 3 pairs need 6 cards, which only fit as 2x3 or 3x2.
        let generator = BoardGenerator::new(2..=4, 2, 3);
        assert_eq!(generator.valid_pair_counts(), vec![2, 3]);
        assert_eq!(generator.valid_layouts(6), vec![(2, 3)]);
        assert_eq!(generator.valid_layouts(4), vec![(2, 2)]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generate_board(5..=2, 4, 6, &mut rng),
            Err(LayoutError::InvalidPairRange { .. })
        ));
    }

    #[test]
    fn huge_pair_count_has_no_layout() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generate_board(2_147_483_648..=2_147_483_648, 4, 6, &mut rng),
            Err(LayoutError::NoValidConfiguration { .. })
        ));
        // Unbounded grid, so only the card count itself can rule it out
        let generator = BoardGenerator::new(2_147_483_648..=2_147_483_648, u32::MAX, u32::MAX);
        assert!(generator.valid_pair_counts().is_empty());
    }

    #[test]
    fn wide_pair_range_only_searches_what_fits() {
        let generator = BoardGenerator::new(1..=1_000_000, 4, 6);
        assert_eq!(
            generator.valid_pair_counts(),
            vec![1, 2, 3, 4, 5, 6, 8, 9, 10, 12]
        );
        assert!(generator.valid_layouts(2_000_000).is_empty());
    }

    #[test]
    fn every_valid_layout_gets_picked() {
        // 6 pairs = 12 cards: 2x6, 3x4, 4x3 within 4 rows and 6 columns
        let generator = BoardGenerator::new(6..=6, 4, 6);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let (layout, _) = generator.generate(&mut rng).unwrap();
            if !seen.contains(&(layout.rows, layout.columns)) {
                seen.push((layout.rows, layout.columns));
            }
        }
        seen.sort();
        assert_eq!(seen, vec![(2, 6), (3, 4), (4, 3)]);
    }

    #[test]
    fn board_is_row_major() {
        let layout = BoardLayout {
            rows: 2,
            columns: 3,
            total_pairs: 3,
        };
        let symbols = SymbolAssignment(vec![0, 1, 2, 2, 1, 0]);
        let board = Board::from_symbols(layout, symbols, Arc::new(Headless));
        assert_eq!(board.card_at(1, 0).unwrap().symbol(), 2);
        assert_eq!(board.card_at(1, 0).unwrap().id(), CardId(3));
        assert_eq!(board.card_at(0, 2).unwrap().symbol(), 2);
        assert!(board.card_at(2, 0).is_none());
        assert!(board.card_at(0, 3).is_none());
        assert!(!board.is_cleared());
    }

    #[test]
    fn built_board_matches_its_layout() {
        let generator = BoardGenerator::new(2..=8, 4, 6);
        let mut rng = StdRng::seed_from_u64(42);
        let board = Board::build(&generator, &mut rng, Arc::new(Headless)).unwrap();
        let layout = board.layout();
        assert_eq!(board.cards().len(), layout.total_cards() as usize);
        for (i, card) in board.cards().iter().enumerate() {
            assert_eq!(card.id(), CardId(i));
            assert!(card.accepts_click());
        }
    }
}
