pub mod ai;
pub mod booking;
pub mod nlp;

pub use booking::local_now;
