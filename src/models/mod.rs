pub mod block;
pub mod calendar;
pub mod conflict;
pub mod event;
pub mod range;
pub mod trainer;
pub mod travel;
