use crate::core::{Grid, GridError, Position, Tile};

/// Moves `pos` onto the nearest border cell of a `rows x cols` grid.
///
/// Coordinates beyond the grid are clamped first. Positions already on the
/// border are returned unchanged; ties prefer top, bottom, left, then right.
#[must_use]
pub fn nudge_to_edge(rows: usize, cols: usize, pos: Position) -> Position {
    let row = pos.row.min(rows.saturating_sub(1));
    let col = pos.col.min(cols.saturating_sub(1));
    let candidates = [
        (row, Position::new(0, col)),
        (rows.saturating_sub(1) - row, Position::new(rows.saturating_sub(1), col)),
        (col, Position::new(row, 0)),
        (cols.saturating_sub(1) - col, Position::new(row, cols.saturating_sub(1))),
    ];
    candidates
        .into_iter()
        .min_by_key(|(distance, _)| *distance)
        .map_or(Position::new(row, col), |(_, edge)| edge)
}

/// Blank grid with a single [`Tile::Entry`] nudged onto the border.
///
/// Returns the grid and the position the entry ended up at.
pub fn blank_with_entry(
    rows: usize,
    cols: usize,
    entry: Position,
) -> Result<(Grid, Position), GridError> {
    let mut grid = Grid::new(rows, cols)?;
    let entry = nudge_to_edge(rows, cols, entry);
    grid.set(entry, Tile::Entry);
    Ok((grid, entry))
}
