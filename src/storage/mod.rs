pub mod cloud;
pub mod saved_data;
pub mod store;
