pub mod controller;
pub mod observer;
pub mod page;
pub mod scenario;
pub mod timer;
