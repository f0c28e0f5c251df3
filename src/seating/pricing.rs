use crate::reservations::repo_types::Reservation;
use crate::seating::grid::{compute_grid, Seat, SeatGrid, COLUMNS};

/// Price of a seat by column; identical for every row.
pub const PRICE_BY_COLUMN: [i64; COLUMNS] = [100, 75, 50, 100];

pub fn price_of(row: i32, column: i32) -> Option<i64> {
    let seat = Seat::new(row, column).ok()?;
    Some(PRICE_BY_COLUMN[(seat.column() - 1) as usize])
}

/// Sum of seat prices over the occupied cells of the chart built from
/// `reservations`. Seats off the grid count as zero, a doubled seat counts once.
pub fn total_revenue(reservations: &[Reservation]) -> i64 {
    grid_revenue(&compute_grid(reservations))
}

pub fn grid_revenue(grid: &SeatGrid) -> i64 {
    grid.occupied_seats()
        .filter_map(|seat| price_of(seat.row(), seat.column()))
        .sum()
}
