pub mod boundary;
pub mod cli;
pub mod controller;
pub mod detect;
pub mod dom;
pub mod filler;
pub mod mapping;
pub mod messaging;
pub mod report;
pub mod storage;
pub mod trace;
