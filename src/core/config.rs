use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub attachments: AttachmentConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Host names absolute links may be built for. `*` allows any host and a
    /// leading dot matches the domain and its subdomains.
    pub allowed_hosts: Vec<String>,
    /// Take the request host from `X-Forwarded-Host` (behind a trusted proxy)
    pub use_x_forwarded_host: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Bearer token validation settings (HS256 shared secret)
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Which backend stores uploaded attachment files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MinIO,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub minio: MinIOConfig,
    pub local: LocalStorageConfig,
}

/// MinIO/S3 storage configuration for attachment files
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Endpoint used when building direct URLs (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Serve files through direct public URLs instead of presigned ones
    pub public_read: bool,
    /// Presigned URL expiry time in seconds
    pub presigned_url_expiry_secs: u32,
}

/// Local filesystem storage, mostly for development
#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    pub root: PathBuf,
    pub base_url: String,
}

/// Attachment behaviour and the names of the extension points to plug in
#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    pub permissions: Option<String>,
    pub denormalize_func: Option<String>,
    pub filepath_prefix_func: Option<String>,
    pub flat_model: Option<String>,
    pub invalid_file_types: Vec<String>,
    pub mime_lookup_length: usize,
    pub max_file_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            attachments: AttachmentConfig::from_env()?,
        })
    }
}

/// Read an optional variable, treating an empty value as unset
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_hosts = env::var("ALLOWED_HOSTS")
            .unwrap_or_else(|_| "localhost,127.0.0.1,[::1]".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let use_x_forwarded_host = env::var("USE_X_FORWARDED_HOST")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            allowed_hosts,
            use_x_forwarded_host,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            issuer: optional_var("JWT_ISSUER"),
            audience: optional_var("JWT_AUDIENCE"),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = optional_var("SWAGGER_USERNAME");
        let password = optional_var("SWAGGER_PASSWORD");
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Attachments API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Generic file and hyperlink attachments".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "minio".to_string())
            .to_lowercase()
            .as_str()
        {
            "minio" | "s3" => StorageBackend::MinIO,
            "local" => StorageBackend::Local,
            other => {
                return Err(format!(
                    "STORAGE_BACKEND must be 'minio' or 'local', got '{}'",
                    other
                ))
            }
        };

        Ok(Self {
            backend,
            minio: MinIOConfig::from_env()?,
            local: LocalStorageConfig::from_env(),
        })
    }
}

impl MinIOConfig {
    const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u32 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "attachments".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let public_read = env::var("MINIO_PUBLIC_READ")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let presigned_url_expiry_secs = env::var("MINIO_PRESIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PRESIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "MINIO_PRESIGNED_URL_EXPIRY_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            public_read,
            presigned_url_expiry_secs,
        })
    }
}

impl LocalStorageConfig {
    pub fn from_env() -> Self {
        Self {
            root: PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string())),
            base_url: env::var("MEDIA_URL").unwrap_or_else(|_| "/media".to_string()),
        }
    }
}

impl AttachmentConfig {
    pub const DEFAULT_INVALID_FILE_TYPES: &'static [&'static str] = &[
        "application/x-msdownload",
        "applications/x-ms-installer",
        "application/x-sh",
        "text/x-perl",
        "text/x-python",
    ];
    const DEFAULT_MIME_LOOKUP_LENGTH: usize = 4096;
    const DEFAULT_MAX_FILE_SIZE: usize = 20 * 1024 * 1024; // 20MB

    pub fn from_env() -> Result<Self, String> {
        let invalid_file_types = match optional_var("ATTACHMENT_INVALID_FILE_TYPES") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Self::DEFAULT_INVALID_FILE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let mime_lookup_length = env::var("ATTACHMENT_MIME_LOOKUP_LENGTH")
            .unwrap_or_else(|_| Self::DEFAULT_MIME_LOOKUP_LENGTH.to_string())
            .parse::<usize>()
            .map_err(|_| "ATTACHMENT_MIME_LOOKUP_LENGTH must be a valid number".to_string())?;

        let max_file_size = env::var("ATTACHMENT_MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "ATTACHMENT_MAX_FILE_SIZE must be a valid number".to_string())?;

        Ok(Self {
            permissions: optional_var("ATTACHMENT_PERMISSIONS"),
            denormalize_func: optional_var("ATTACHMENT_DENORMALIZE_FUNC"),
            filepath_prefix_func: optional_var("ATTACHMENT_FILEPATH_PREFIX_FUNC"),
            flat_model: optional_var("ATTACHMENT_FLAT_MODEL"),
            invalid_file_types,
            mime_lookup_length,
            max_file_size,
        })
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            permissions: None,
            denormalize_func: None,
            filepath_prefix_func: None,
            flat_model: None,
            invalid_file_types: Self::DEFAULT_INVALID_FILE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mime_lookup_length: Self::DEFAULT_MIME_LOOKUP_LENGTH,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }
}
