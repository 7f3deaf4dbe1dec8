/// Leading segment for generated file keys, resolved once at startup
pub trait FilepathPrefix: Send + Sync {
    fn prefix(&self) -> Option<String>;
}

pub struct NoPrefix;

impl FilepathPrefix for NoPrefix {
    fn prefix(&self) -> Option<String> {
        None
    }
}

/// Fixed prefix, configured as `static:<prefix>`
pub struct StaticPrefix(pub String);

impl FilepathPrefix for StaticPrefix {
    fn prefix(&self) -> Option<String> {
        Some(self.0.clone()).filter(|p| !p.is_empty())
    }
}
