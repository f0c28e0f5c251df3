use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::reservations::repo_types::Reservation;

/// Number of seat rows in the cabin.
pub const ROWS: usize = 12;
/// Number of seats per row.
pub const COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeatError {
    #[error("Row must be between 1 and 12.")]
    RowOutOfRange,
    #[error("Column must be between 1 and 4.")]
    ColumnOutOfRange,
}

/// A seat position that is known to lie on the grid (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Seat {
    row: i32,
    column: i32,
}

impl Seat {
    pub fn new(row: i32, column: i32) -> Result<Self, SeatError> {
        if !(1..=ROWS as i32).contains(&row) {
            return Err(SeatError::RowOutOfRange);
        }
        if !(1..=COLUMNS as i32).contains(&column) {
            return Err(SeatError::ColumnOutOfRange);
        }
        Ok(Self { row, column })
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    fn index(&self) -> (usize, usize) {
        ((self.row - 1) as usize, (self.column - 1) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cell {
    Free,
    Occupied,
}

impl Cell {
    /// Marker used on the seating chart.
    pub fn marker(&self) -> char {
        match self {
            Cell::Free => '_',
            Cell::Occupied => 'X',
        }
    }
}

/// Occupancy view of the cabin, derived from the current reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatGrid {
    cells: [[Cell; COLUMNS]; ROWS],
}

impl Default for SeatGrid {
    fn default() -> Self {
        Self {
            cells: [[Cell::Free; COLUMNS]; ROWS],
        }
    }
}

impl SeatGrid {
    #[cfg(test)]
    pub fn cell(&self, seat: Seat) -> Cell {
        let (r, c) = seat.index();
        self.cells[r][c]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLUMNS]> {
        self.cells.iter()
    }

    /// Occupied seats in row-major order; a seat held twice appears once.
    pub fn occupied_seats(&self) -> impl Iterator<Item = Seat> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| **cell == Cell::Occupied)
                .map(move |(c, _)| Seat {
                    row: r as i32 + 1,
                    column: c as i32 + 1,
                })
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied_seats().count()
    }

    fn mark(&mut self, seat: Seat) {
        let (r, c) = seat.index();
        self.cells[r][c] = Cell::Occupied;
    }
}

/// Builds the seating chart. Reservations with coordinates off the grid are skipped.
pub fn compute_grid(reservations: &[Reservation]) -> SeatGrid {
    let mut grid = SeatGrid::default();
    for r in reservations {
        match Seat::new(r.seat_row, r.seat_column) {
            Ok(seat) => grid.mark(seat),
            Err(e) => {
                debug!(id = r.id, row = r.seat_row, column = r.seat_column, error = %e, "seat off grid; skipped");
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn res(id: i64, row: i32, column: i32) -> Reservation {
        Reservation {
            id,
            passenger_name: format!("passenger {id}"),
            seat_row: row,
            seat_column: column,
            ticket_number: format!("{id:032x}"),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn seat_bounds_are_enforced() {
        assert!(Seat::new(1, 1).is_ok());
        assert!(Seat::new(12, 4).is_ok());
        assert_eq!(Seat::new(0, 1), Err(SeatError::RowOutOfRange));
        assert_eq!(Seat::new(13, 1), Err(SeatError::RowOutOfRange));
        assert_eq!(Seat::new(1, 0), Err(SeatError::ColumnOutOfRange));
        assert_eq!(Seat::new(1, 5), Err(SeatError::ColumnOutOfRange));
    }

    #[test]
    fn empty_set_gives_all_free() {
        let grid = compute_grid(&[]);
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.rows().flatten().all(|c| *c == Cell::Free));
    }

    #[test]
    fn marks_exactly_the_reserved_cells() {
        let reservations = vec![res(1, 1, 1), res(2, 5, 2), res(3, 12, 4)];
        let grid = compute_grid(&reservations);

        assert_eq!(grid.occupied_count(), 3);
        for row in 1..=ROWS as i32 {
            for col in 1..=COLUMNS as i32 {
                let seat = Seat::new(row, col).unwrap();
                let expected = reservations
                    .iter()
                    .any(|r| r.seat_row == row && r.seat_column == col);
                let cell = grid.cell(seat);
                assert_eq!(cell == Cell::Occupied, expected, "seat ({row}, {col})");
            }
        }
    }

    #[test]
    fn off_grid_reservations_are_ignored() {
        let reservations = vec![res(1, 0, 1), res(2, 13, 2), res(3, 3, 5), res(4, -1, -1), res(5, 2, 2)];
        let grid = compute_grid(&reservations);
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.cell(Seat::new(2, 2).unwrap()), Cell::Occupied);
    }

    #[test]
    fn doubled_seat_is_marked_once() {
        let grid = compute_grid(&[res(1, 1, 1), res(2, 1, 1), res(3, 4, 2)]);
        let seats: Vec<Seat> = grid.occupied_seats().collect();
        assert_eq!(seats, vec![Seat::new(1, 1).unwrap(), Seat::new(4, 2).unwrap()]);
        assert_eq!(grid.occupied_count(), 2);
    }

    #[test]
    fn markers_match_chart_legend() {
        assert_eq!(Cell::Free.marker(), '_');
        assert_eq!(Cell::Occupied.marker(), 'X');
    }
}
