pub mod dining;
pub mod restaurant;
pub mod slots;
