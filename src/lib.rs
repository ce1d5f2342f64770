pub mod ai;
pub mod calendar;
pub mod cli;
pub mod core;
pub mod google;
pub mod notify;
pub mod openai;
