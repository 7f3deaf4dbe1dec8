//! Deployment extension points, chosen by name in configuration.

mod denormalize;
mod filepath_prefix;
mod permissions;
mod registry;

pub use denormalize::{DefaultDenormalizer, Denormalizer, NoDenormalize, ObjectLinkDenormalizer};
pub use filepath_prefix::{FilepathPrefix, NoPrefix, StaticPrefix};
pub use permissions::{AllowAny, AttachmentPermission, IsAuthenticated, IsStaff, ReadOnlyOrAuthenticated};
pub use registry::{ExtensionRegistry, Extensions};
