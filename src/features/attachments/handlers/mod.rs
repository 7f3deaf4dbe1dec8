mod attachment_handler;
mod file_handler;
mod link_handler;
mod owner_handler;
mod upload_handler;

pub use attachment_handler::*;
pub use file_handler::*;
pub use link_handler::*;
pub use owner_handler::*;
pub use upload_handler::*;
