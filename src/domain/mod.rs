pub mod countdown;
pub mod display;
pub mod models;
