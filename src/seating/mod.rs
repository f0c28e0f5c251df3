pub mod grid;
pub mod pricing;

pub use grid::{compute_grid, Seat, SeatError, SeatGrid};
pub use pricing::total_revenue;
