use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::AttachmentConfig;
use crate::core::error::{AppError, Result};
use crate::shared::constants::DEFAULT_FLAT_TABLE;
use crate::shared::validation::is_valid_identifier;

use super::{
    AllowAny, AttachmentPermission, DefaultDenormalizer, Denormalizer, FilepathPrefix,
    IsAuthenticated, IsStaff, NoDenormalize, NoPrefix, ObjectLinkDenormalizer,
    ReadOnlyOrAuthenticated, StaticPrefix,
};

const DEFAULT_PERMISSION: &str = "is_authenticated";
const DEFAULT_DENORMALIZER: &str = "default";
const DEFAULT_FILEPATH_PREFIX: &str = "none";
const STATIC_PREFIX: &str = "static:";

/// Named implementations of each extension point
pub struct ExtensionRegistry {
    permissions: HashMap<String, Arc<dyn AttachmentPermission>>,
    denormalizers: HashMap<String, Arc<dyn Denormalizer>>,
    filepath_prefixes: HashMap<String, Arc<dyn FilepathPrefix>>,
}

/// Extension points resolved for this deployment
#[derive(Clone)]
pub struct Extensions {
    pub permission: Arc<dyn AttachmentPermission>,
    pub denormalizer: Arc<dyn Denormalizer>,
    pub filepath_prefix: Option<String>,
    pub flat_table: String,
}

impl ExtensionRegistry {
    pub fn empty() -> Self {
        Self {
            permissions: HashMap::new(),
            denormalizers: HashMap::new(),
            filepath_prefixes: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register_permission(DEFAULT_PERMISSION, Arc::new(IsAuthenticated));
        registry.register_permission("is_staff", Arc::new(IsStaff));
        registry.register_permission("read_only_or_authenticated", Arc::new(ReadOnlyOrAuthenticated));
        registry.register_permission("allow_any", Arc::new(AllowAny));

        registry.register_denormalizer(DEFAULT_DENORMALIZER, Arc::new(DefaultDenormalizer));
        registry.register_denormalizer("object_link", Arc::new(ObjectLinkDenormalizer));
        registry.register_denormalizer("none", Arc::new(NoDenormalize));

        registry.register_filepath_prefix(DEFAULT_FILEPATH_PREFIX, Arc::new(NoPrefix));

        registry
    }

    pub fn register_permission(&mut self, name: &str, permission: Arc<dyn AttachmentPermission>) {
        self.permissions.insert(name.to_string(), permission);
    }

    pub fn register_denormalizer(&mut self, name: &str, denormalizer: Arc<dyn Denormalizer>) {
        self.denormalizers.insert(name.to_string(), denormalizer);
    }

    pub fn register_filepath_prefix(&mut self, name: &str, prefix: Arc<dyn FilepathPrefix>) {
        self.filepath_prefixes.insert(name.to_string(), prefix);
    }

    /// Resolve the configured names. Unset settings fall back to the
    /// defaults; names that are set but unknown are configuration errors.
    pub fn resolve(&self, config: &AttachmentConfig) -> Result<Extensions> {
        let permission = lookup(
            &self.permissions,
            "ATTACHMENT_PERMISSIONS",
            config.permissions.as_deref().unwrap_or(DEFAULT_PERMISSION),
        )?;

        let denormalizer = lookup(
            &self.denormalizers,
            "ATTACHMENT_DENORMALIZE_FUNC",
            config
                .denormalize_func
                .as_deref()
                .unwrap_or(DEFAULT_DENORMALIZER),
        )?;

        let prefix_name = config
            .filepath_prefix_func
            .as_deref()
            .unwrap_or(DEFAULT_FILEPATH_PREFIX);
        let filepath_prefix = match prefix_name.strip_prefix(STATIC_PREFIX) {
            Some(value) => StaticPrefix(value.to_string()).prefix(),
            None => lookup(
                &self.filepath_prefixes,
                "ATTACHMENT_FILEPATH_PREFIX_FUNC",
                prefix_name,
            )?
            .prefix(),
        };

        let flat_table = config
            .flat_model
            .clone()
            .unwrap_or_else(|| DEFAULT_FLAT_TABLE.to_string());
        if !is_valid_identifier(&flat_table) {
            return Err(AppError::Configuration(format!(
                "Could not use ATTACHMENT_FLAT_MODEL {}: not a valid table name",
                flat_table
            )));
        }

        Ok(Extensions {
            permission,
            denormalizer,
            filepath_prefix,
            flat_table,
        })
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn lookup<T: ?Sized>(
    entries: &HashMap<String, Arc<T>>,
    setting: &str,
    name: &str,
) -> Result<Arc<T>> {
    entries.get(name).cloned().ok_or_else(|| {
        let mut known: Vec<&str> = entries.keys().map(String::as_str).collect();
        known.sort_unstable();
        AppError::Configuration(format!(
            "Could not import {} {}: expected one of {}",
            setting,
            name,
            known.join(", ")
        ))
    })
}
