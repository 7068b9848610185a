//! Per-venue subscribe frame construction.
//!
//! Every venue speaks its own subscription dialect; the frames here are
//! wire-exact, including each venue's request-type strings (`depth20`,
//! `book`, `books`, `order_book`, `orderbook.50`, upbit's `level: 1000`)
//! and casing of the symbol.

mod frames;

pub use frames::subscribe_frame;
