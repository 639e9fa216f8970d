pub mod error;
pub mod filler;
pub mod highlight;
pub mod outcome;
pub mod strategy;
