mod content_type;

pub use content_type::{object_link, ContentType, Owner};
