mod file_type_handler;

pub use file_type_handler::*;
