pub mod movies;
pub mod night_room;
pub mod providers;
pub mod selector;
pub mod spin;
pub mod users;
pub mod watched;
pub mod watchlist;

pub use night_room::NightRoom;
pub use selector::{Candidate, SelectionError, SelectionOutcome, Selector};
pub use spin::SpinRegistry;
