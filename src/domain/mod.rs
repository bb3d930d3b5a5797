pub mod compare_settings;
pub mod dataset;
pub mod device;
pub mod error;
pub mod log_entry;
pub mod sign_in;
