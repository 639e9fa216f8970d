pub mod matcher;
pub mod profile;
pub mod table;
