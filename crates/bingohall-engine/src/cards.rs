//! Card, pool, and draw-order generation.

use std::collections::HashSet;

use bingohall_protocol::{Card, CardId, Cell, Column, GRID_SIZE, Grid, MarkGrid, TOTAL_NUMBERS};
use rand::Rng;
use rand::seq::SliceRandom;

/// Pool generation gives up after this many rejected duplicates per card.
const ATTEMPTS_PER_CARD: usize = 1_000;

const CENTER: usize = GRID_SIZE / 2;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates one card with a fresh random id.
///
/// Each column takes five distinct numbers from its range, and the center
/// cell is always [`Cell::Free`].
pub fn generate_card<R: Rng + ?Sized>(rng: &mut R) -> Card {
    let mut grid: Grid = [[Cell::Free; GRID_SIZE]; GRID_SIZE];

    for column in Column::ALL {
        let mut numbers: Vec<u8> = column.range().collect();
        numbers.shuffle(rng);

        let c = column.index();
        for (r, row) in grid.iter_mut().enumerate() {
            row[c] = Cell::Number(numbers[r]);
        }
    }
    grid[CENTER][CENTER] = Cell::Free;

    Card {
        id: CardId(random_base36(rng, 12)),
        grid,
    }
}

/// Generates `count` cards whose grids are pairwise distinct.
///
/// # Panics
///
/// Panics if the random source keeps producing duplicates. With a real RNG
/// the card space is far too large for that to happen, so hitting the bound
/// means the RNG is broken.
pub fn generate_card_pool<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Card> {
    generate_card_pool_avoiding(count, &[], rng)
}

/// Like [`generate_card_pool`], but no new grid repeats one in `existing`.
///
/// Used to top up a pool around cards the player kept.
///
/// # Panics
///
/// Same bound as [`generate_card_pool`].
pub fn generate_card_pool_avoiding<R: Rng + ?Sized>(
    count: usize,
    existing: &[Card],
    rng: &mut R,
) -> Vec<Card> {
    let mut cards = Vec::with_capacity(count);
    let mut seen: HashSet<_> = existing.iter().map(|c| signature(&c.grid)).collect();
    let max_attempts = count.saturating_mul(ATTEMPTS_PER_CARD).max(ATTEMPTS_PER_CARD);

    let mut attempts = 0;
    while cards.len() < count {
        attempts += 1;
        assert!(
            attempts <= max_attempts,
            "card pool generation produced only {} unique cards in {max_attempts} attempts",
            cards.len()
        );

        let card = generate_card(rng);
        if seen.insert(signature(&card.grid)) {
            cards.push(card);
        }
    }
    cards
}

/// A full draw order: every number 1..=75 exactly once.
pub fn generate_shuffled_numbers<R: Rng + ?Sized>(rng: &mut R) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=TOTAL_NUMBERS).collect();
    numbers.shuffle(rng);
    numbers
}

/// A mark grid with only the free center marked.
pub fn empty_mark_grid() -> MarkGrid {
    let mut grid = [[false; GRID_SIZE]; GRID_SIZE];
    grid[CENTER][CENTER] = true;
    grid
}

/// The grid flattened row by row, used to spot duplicate cards.
pub fn signature(grid: &Grid) -> [Cell; GRID_SIZE * GRID_SIZE] {
    let mut flat = [Cell::Free; GRID_SIZE * GRID_SIZE];
    for (slot, cell) in flat.iter_mut().zip(grid.iter().flatten()) {
        *slot = *cell;
    }
    flat
}

pub(crate) fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// Always yields zero, so every shuffle comes out the same.
    struct StuckRng;

    impl RngCore for StuckRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_columns_stay_in_range_and_distinct() {
        let mut rng = rng();
        for _ in 0..200 {
            let card = generate_card(&mut rng);
            for column in Column::ALL {
                let c = column.index();
                let values: Vec<u8> = (0..GRID_SIZE)
                    .filter_map(|r| card.grid[r][c].number())
                    .collect();
                let expected = if column == Column::N { 4 } else { 5 };
                assert_eq!(values.len(), expected);
                assert!(values.iter().all(|n| column.range().contains(n)));

                let unique: HashSet<_> = values.iter().collect();
                assert_eq!(unique.len(), values.len());
            }
        }
    }

    #[test]
    fn test_center_is_always_free() {
        let mut rng = rng();
        for _ in 0..50 {
            let card = generate_card(&mut rng);
            assert_eq!(card.grid[2][2], Cell::Free);
            let frees = card.grid.iter().flatten().filter(|c| c.is_free()).count();
            assert_eq!(frees, 1);
        }
    }

    #[test]
    fn test_card_ids_are_base36() {
        let card = generate_card(&mut rng());
        assert_eq!(card.id.0.len(), 12);
        assert!(card.id.0.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_pool_cards_are_unique() {
        let mut rng = rng();
        for _ in 0..20 {
            let pool = generate_card_pool(8, &mut rng);
            assert_eq!(pool.len(), 8);
            let signatures: HashSet<_> = pool.iter().map(|c| signature(&c.grid)).collect();
            assert_eq!(signatures.len(), 8);
        }
    }

    #[test]
    fn test_empty_pool() {
        assert!(generate_card_pool(0, &mut rng()).is_empty());
    }

    #[test]
    #[should_panic(expected = "card pool generation")]
    fn test_pool_fails_loudly_on_a_broken_rng() {
        generate_card_pool(2, &mut StuckRng);
    }

    #[test]
    fn test_top_up_never_repeats_a_kept_grid() {
        // Same seed, so the first two draws would be copies of the kept pair.
        let kept = generate_card_pool(2, &mut rng());
        let fresh = generate_card_pool_avoiding(6, &kept, &mut rng());

        assert_eq!(fresh.len(), 6);
        let signatures: HashSet<_> = kept
            .iter()
            .chain(&fresh)
            .map(|c| signature(&c.grid))
            .collect();
        assert_eq!(signatures.len(), 8);
    }

    #[test]
    #[should_panic(expected = "card pool generation")]
    fn test_top_up_gives_up_when_every_draw_is_kept() {
        let kept = vec![generate_card(&mut StuckRng)];
        generate_card_pool_avoiding(1, &kept, &mut StuckRng);
    }

    #[test]
    fn test_shuffled_numbers_is_a_permutation() {
        let numbers = generate_shuffled_numbers(&mut rng());
        assert_eq!(numbers.len(), 75);
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=75).collect::<Vec<u8>>());
    }

    #[test]
    fn test_empty_mark_grid_marks_only_center() {
        let grid = empty_mark_grid();
        assert!(grid[2][2]);
        assert_eq!(grid.iter().flatten().filter(|&&m| m).count(), 1);
    }
}
