mod attachment;
mod attachment_flat;
mod attachment_link;

pub use attachment::{ensure_file_or_hyperlink, filename_of, Attachment, AttachmentDetail};
pub use attachment_flat::{AttachmentFlat, FlatRow, FlatValues};
pub use attachment_link::{AttachmentLink, AttachmentLinkDetail};
