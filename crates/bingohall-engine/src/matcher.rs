//! Pattern matching over mark grids.
//!
//! Symbolic patterns are checked against a fixed list of candidate cell
//! sets, tried in a fixed order: rows top to bottom, columns left to right,
//! the TL→BR diagonal, the TR→BL diagonal, and corner blocks in row-major
//! order. The first complete candidate is the one reported as the win.
//! Fixed patterns are a subset check: extra marks never hurt.

use bingohall_protocol::{Card, Cell, GRID_SIZE, MarkGrid, Pattern, PatternKind};

type Coord = (usize, usize);

const N: usize = GRID_SIZE;

/// Top-left anchors of the four 2×2 corner blocks.
const CORNER_ANCHORS: [Coord; 4] = [(0, 0), (0, N - 2), (N - 2, 0), (N - 2, N - 2)];

/// `true` if `marked` satisfies `pattern`.
pub fn matches(marked: &MarkGrid, pattern: &Pattern) -> bool {
    match pattern.kind() {
        PatternKind::Fixed => covers(marked, &pattern.grid),
        _ => first_win(marked, pattern.kind()).is_some(),
    }
}

/// The cells that make `marked` a win under `pattern`.
///
/// For fixed patterns this is the pattern grid itself. For symbolic
/// patterns it is the first complete candidate, or an empty grid when
/// nothing is complete.
pub fn winning_cells(marked: &MarkGrid, pattern: &Pattern) -> MarkGrid {
    match pattern.kind() {
        PatternKind::Fixed => pattern.grid,
        kind => first_win(marked, kind).unwrap_or([[false; N]; N]),
    }
}

/// `true` if every marked non-free cell holds a called number.
pub fn validate_marks(card: &Card, marked: &MarkGrid, called: &[u8]) -> bool {
    card.grid
        .iter()
        .flatten()
        .zip(marked.iter().flatten())
        .all(|(cell, &is_marked)| match cell {
            Cell::Free => true,
            Cell::Number(n) => !is_marked || called.contains(n),
        })
}

fn covers(marked: &MarkGrid, required: &MarkGrid) -> bool {
    required
        .iter()
        .flatten()
        .zip(marked.iter().flatten())
        .all(|(&need, &have)| !need || have)
}

fn first_win(marked: &MarkGrid, kind: PatternKind) -> Option<MarkGrid> {
    match kind {
        PatternKind::HorizontalLine => first_complete(marked, rows()),
        PatternKind::VerticalLine => first_complete(marked, columns()),
        PatternKind::Diagonal => first_complete(marked, diagonals()),
        PatternKind::AnyLine => {
            first_complete(marked, rows().chain(columns()).chain(diagonals()))
        }
        PatternKind::PostageStamp => first_complete(marked, corner_blocks()),
        PatternKind::Fixed => None,
    }
}

fn first_complete<const K: usize>(
    marked: &MarkGrid,
    candidates: impl IntoIterator<Item = [Coord; K]>,
) -> Option<MarkGrid> {
    candidates
        .into_iter()
        .find(|cells| cells.iter().all(|&(r, c)| marked[r][c]))
        .map(|cells| {
            let mut grid = [[false; N]; N];
            for (r, c) in cells {
                grid[r][c] = true;
            }
            grid
        })
}

fn rows() -> impl Iterator<Item = [Coord; N]> {
    (0..N).map(|r| std::array::from_fn(|c| (r, c)))
}

fn columns() -> impl Iterator<Item = [Coord; N]> {
    (0..N).map(|c| std::array::from_fn(|r| (r, c)))
}

fn diagonals() -> impl Iterator<Item = [Coord; N]> {
    [
        std::array::from_fn(|i| (i, i)),
        std::array::from_fn(|i| (i, N - 1 - i)),
    ]
    .into_iter()
}

fn corner_blocks() -> impl Iterator<Item = [Coord; 4]> {
    CORNER_ANCHORS
        .into_iter()
        .map(|(r, c)| [(r, c), (r, c + 1), (r + 1, c), (r + 1, c + 1)])
}
