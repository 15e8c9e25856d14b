//! Win patterns and the built-in preset catalogue.
//!
//! A pattern is either *symbolic* (any row, any column, either diagonal,
//! any line, a 2×2 corner block) or *fixed*, in which case its `grid`
//! lists the cells that must be marked. The symbolic patterns still carry
//! a grid, but only as a picture for the client to show.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{GRID_SIZE, MarkGrid};

/// Where a pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Preset,
    Custom,
}

/// How a pattern is evaluated, derived from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Any complete row.
    HorizontalLine,
    /// Any complete column.
    VerticalLine,
    /// Either complete diagonal.
    Diagonal,
    /// Any row, column, or diagonal.
    AnyLine,
    /// A 2×2 block in one of the four corners.
    PostageStamp,
    /// Every cell set in the pattern grid must be marked.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_es: Option<String>,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub grid: MarkGrid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_es: Option<String>,
}

impl Pattern {
    /// Symbolic ids are recognized regardless of [`PatternType`], so a
    /// custom pattern that reuses `"any-line"` behaves like the preset.
    pub fn kind(&self) -> PatternKind {
        match self.id.as_str() {
            "horizontal-line" => PatternKind::HorizontalLine,
            "vertical-line" => PatternKind::VerticalLine,
            "diagonal" => PatternKind::Diagonal,
            "any-line" => PatternKind::AnyLine,
            "postage-stamp" => PatternKind::PostageStamp,
            _ => PatternKind::Fixed,
        }
    }

    /// Builds a host-defined fixed pattern.
    pub fn custom(id: impl Into<String>, name: impl Into<String>, grid: MarkGrid) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_es: None,
            pattern_type: PatternType::Custom,
            grid,
            description: None,
            description_es: None,
        }
    }
}

impl Default for Pattern {
    /// "Any Line".
    fn default() -> Self {
        any_line()
    }
}

/// The built-in patterns, in display order.
pub fn presets() -> &'static [Pattern] {
    &PRESETS
}

/// Looks up a built-in pattern by id.
pub fn preset(id: &str) -> Option<Pattern> {
    PRESETS.iter().find(|p| p.id == id).cloned()
}

static PRESETS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        make(
            "horizontal-line",
            ("Horizontal Line", "Línea Horizontal"),
            row(0),
            ("Complete any horizontal row", "Completa cualquier fila horizontal"),
        ),
        make(
            "vertical-line",
            ("Vertical Line", "Línea Vertical"),
            column(0),
            ("Complete any vertical column", "Completa cualquier columna vertical"),
        ),
        make(
            "diagonal",
            ("Diagonal Line", "Línea Diagonal"),
            cells(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]),
            ("Complete either diagonal", "Completa cualquier diagonal"),
        ),
        any_line(),
        make(
            "four-corners",
            ("Four Corners", "Cuatro Esquinas"),
            cells(&[(0, 0), (0, 4), (4, 0), (4, 4)]),
            ("Mark all four corners", "Marca las cuatro esquinas"),
        ),
        make(
            "blackout",
            ("Blackout", "Cartón Lleno"),
            [[true; GRID_SIZE]; GRID_SIZE],
            ("Mark every cell on the card", "Marca todas las casillas del cartón"),
        ),
        make(
            "letter-x",
            ("Letter X", "Letra X"),
            cells(&[
                (0, 0), (0, 4),
                (1, 1), (1, 3),
                (2, 2),
                (3, 1), (3, 3),
                (4, 0), (4, 4),
            ]),
            ("Form an X shape with both diagonals", "Forma una X con ambas diagonales"),
        ),
        make(
            "letter-t",
            ("Letter T", "Letra T"),
            union(row(0), column(2)),
            (
                "Form a T shape with top row and middle column",
                "Forma una T con la fila superior y la columna central",
            ),
        ),
        make(
            "letter-l",
            ("Letter L", "Letra L"),
            union(column(0), row(4)),
            (
                "Form an L shape with left column and bottom row",
                "Forma una L con la columna izquierda y la fila inferior",
            ),
        ),
        make(
            "plus",
            ("Plus Sign", "Signo Más"),
            union(row(2), column(2)),
            (
                "Form a plus sign with middle row and column",
                "Forma un signo más con la fila y columna central",
            ),
        ),
        make(
            "picture-frame",
            ("Picture Frame", "Marco"),
            union(union(row(0), row(4)), union(column(0), column(4))),
            (
                "Mark all cells on the outer edge",
                "Marca todas las casillas del borde exterior",
            ),
        ),
        make(
            "postage-stamp",
            ("Postage Stamp", "Estampilla"),
            cells(&[(0, 0), (0, 1), (1, 0), (1, 1)]),
            (
                "Complete a 2x2 square in any corner",
                "Completa un cuadrado 2x2 en cualquier esquina",
            ),
        ),
        make(
            "chevron-up",
            ("Chevron", "Flecha"),
            cells(&[(2, 2), (3, 1), (3, 3), (4, 0), (4, 4)]),
            ("Form a V or arrow shape", "Forma una V o flecha"),
        ),
    ]
});

fn any_line() -> Pattern {
    make(
        "any-line",
        ("Any Line", "Cualquier Línea"),
        row(0),
        (
            "Complete any horizontal, vertical, or diagonal line",
            "Completa cualquier línea horizontal, vertical o diagonal",
        ),
    )
}

fn make(id: &str, name: (&str, &str), grid: MarkGrid, description: (&str, &str)) -> Pattern {
    Pattern {
        id: id.to_string(),
        name: name.0.to_string(),
        name_es: Some(name.1.to_string()),
        pattern_type: PatternType::Preset,
        grid,
        description: Some(description.0.to_string()),
        description_es: Some(description.1.to_string()),
    }
}

fn cells(coords: &[(usize, usize)]) -> MarkGrid {
    let mut grid = [[false; GRID_SIZE]; GRID_SIZE];
    for &(r, c) in coords {
        grid[r][c] = true;
    }
    grid
}

fn row(r: usize) -> MarkGrid {
    let mut grid = [[false; GRID_SIZE]; GRID_SIZE];
    grid[r] = [true; GRID_SIZE];
    grid
}

fn column(c: usize) -> MarkGrid {
    let mut grid = [[false; GRID_SIZE]; GRID_SIZE];
    for r in grid.iter_mut() {
        r[c] = true;
    }
    grid
}

fn union(a: MarkGrid, b: MarkGrid) -> MarkGrid {
    let mut grid = a;
    for (r, row) in grid.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell |= b[r][c];
        }
    }
    grid
}
