pub mod control;
pub mod cost;
pub mod currency;
pub mod stoch;
