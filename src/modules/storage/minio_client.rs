//! MinIO/S3-compatible storage backend
//!
//! Uses rust-s3 for object operations. The bucket policy is put with a
//! hand-signed (SigV4) request since rust-s3 has no policy API.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::FileStorage;
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    config: MinIOConfig,
    http_client: Client,
}

impl MinIOClient {
    /// Connect, create the bucket if needed and, for public-read
    /// deployments, allow anonymous GETs on it.
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to create MinIO bucket: {}", e)))?;

        // http://endpoint/bucket instead of http://bucket.endpoint
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            config,
            http_client,
        };

        client.ensure_bucket_exists().await;
        if client.config.public_read {
            client.set_public_read_policy().await;
        }

        info!(
            "MinIO storage initialized for endpoint: {}, bucket: {}, public_read: {}",
            client.config.endpoint,
            client.bucket.name(),
            client.config.public_read
        );

        Ok(client)
    }

    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    async fn set_public_read_policy(&self) {
        let bucket_name = self.bucket.name();

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket_name}/*")]
                }
            ]
        })
        .to_string();

        match self.put_bucket_policy(&bucket_name, &policy).await {
            Ok(()) => info!("Set public read policy for {}/*", bucket_name),
            // Startup continues; the policy can be set with `mc anonymous set download`
            Err(e) => warn!("Failed to set bucket policy for '{}': {}", bucket_name, e),
        }
    }

    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.config.endpoint)
            .map_err(|e| AppError::Storage(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Storage("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        let url = format!("{}/{}?policy", self.config.endpoint, bucket_name);
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_request = format!(
            "PUT\n/{}\npolicy=\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            bucket_name, host_header, payload_hash, amz_date, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let signature = self.signature(&date_stamp, &string_to_sign)?;

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.config.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::Storage(format!(
            "Failed to set bucket policy: {} - {}",
            status, body
        )))
    }

    fn signature(&self, date_stamp: &str, string_to_sign: &str) -> Result<String, AppError> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.config.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;

        Ok(hex::encode(hmac_sha256(
            &k_signing,
            string_to_sign.as_bytes(),
        )?))
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_endpoint.trim_end_matches('/'),
            self.bucket.name(),
            key
        )
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Storage(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[async_trait]
impl FileStorage for MinIOClient {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        match self.bucket.head_object(key).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("404") || error_str.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check if file '{}' exists: {}",
                        key, e
                    )))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file '{}': {}", key, e)))?;

        debug!("Deleted file '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn url(&self, key: &str) -> Result<String, AppError> {
        if self.config.public_read {
            return Ok(self.public_url(key));
        }

        self.bucket
            .presign_get(key, self.config.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    key, e
                ))
            })
    }

    fn name(&self) -> &str {
        "minio"
    }
}
