//! Amazon S3 object and bucket tools.

use base64::Engine;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{remote_failure, Input};
use crate::aws::{ApiRequest, ClientHandle};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;

const SERVICE: &str = "s3api";
const LABEL: &str = "S3";
const TEXT_EXTENSIONS: [&str; 4] = [".txt", ".csv", ".json", ".md"];

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    registry.register_tool(
        "s3_read_file",
        "Reads a file from S3 and returns its contents and metadata.",
        client.clone(),
        read_file,
    )?;
    registry.register_tool(
        "s3_list_objects",
        "Lists objects and folder prefixes in an S3 bucket.",
        client.clone(),
        list_objects,
    )?;
    registry.register_tool(
        "s3_head_object",
        "Retrieves metadata from an S3 object without returning the object itself.",
        client.clone(),
        head_object,
    )?;
    registry.register_tool(
        "s3_list_buckets",
        "Lists all S3 buckets accessible to the user.",
        client.clone(),
        list_buckets,
    )?;
    registry.register_tool(
        "s3_upload_object",
        "Uploads text content to an S3 bucket.",
        client.clone(),
        upload_object,
    )?;
    registry.register_tool(
        "s3_get_object",
        "Retrieves an object from Amazon S3. The body is returned base64 encoded.",
        client,
        get_object,
    )?;
    Ok(())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// The name of the S3 bucket
    pub bucket_name: String,
    /// The path to the file in the bucket
    pub file_path: String,
}

async fn read_file(client: ClientHandle, params: ReadFileParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (bucket, path) = (params.bucket_name, params.file_path);
    tracing::info!(%bucket, %path, "Reading file");

    let response = api
        .call(ApiRequest::new(SERVICE, "GetObject", json!({"Bucket": bucket, "Key": path})))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("NoSuchKey") => format!("File {} not found in bucket {}", path, bucket),
                Some("AccessDenied") => format!("Access denied to file {} in bucket {}", path, bucket),
                _ => format!("Error reading file {}: {}", path, e),
            };
            remote_failure("read_file", &e, message)
        })?;

    let content_type = response.get("ContentType").and_then(Value::as_str).unwrap_or("");
    let encoded = response.get("Body").and_then(Value::as_str).unwrap_or("");
    let as_text = content_type.starts_with("text/") || TEXT_EXTENSIONS.iter().any(|ext| path.ends_with(ext));

    // Text that is not valid UTF-8 stays base64 encoded, like any binary body.
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()
        .filter(|_| as_text)
        .and_then(|bytes| String::from_utf8(bytes).ok());
    let (content, encoding) = match decoded {
        Some(text) => (Value::String(text), "utf-8"),
        None => (Value::String(encoded.to_string()), "base64"),
    };

    Ok(json!({
        "content": content,
        "content_encoding": encoding,
        "metadata": {
            "content_type": response.get("ContentType"),
            "content_length": response.get("ContentLength"),
            "last_modified": response.get("LastModified"),
            "etag": response.get("ETag"),
        }
    }))
}

fn default_max_items() -> u32 {
    100
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListObjectsParams {
    /// The name of the S3 bucket
    pub bucket_name: String,
    /// Prefix to filter objects (like a folder path)
    #[serde(default)]
    pub prefix: String,
    /// Maximum number of items to return
    #[serde(default = "default_max_items")]
    pub max_items: u32,
}

async fn list_objects(client: ClientHandle, params: ListObjectsParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let bucket = params.bucket_name;
    let mut prefix = params.prefix;
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }
    tracing::info!(%bucket, %prefix, "Listing objects");

    let input = Input::new()
        .set("Bucket", &bucket)
        .set("Prefix", &prefix)
        .set("MaxKeys", params.max_items)
        .set("Delimiter", "/")
        .build();
    let response = api
        .call(ApiRequest::new(SERVICE, "ListObjectsV2", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("NoSuchBucket") => format!("Bucket {} does not exist", bucket),
                Some("AccessDenied") => format!("Access denied to bucket {}", bucket),
                _ => format!("Error listing objects in bucket {}: {}", bucket, e),
            };
            remote_failure("list_objects", &e, message)
        })?;

    let objects: Vec<Value> = array(&response, "Contents")
        .iter()
        .filter(|object| object.get("Key").and_then(Value::as_str) != Some(prefix.as_str()))
        .map(|object| {
            let key = object.get("Key").and_then(Value::as_str).unwrap_or("");
            json!({
                "key": key,
                "size_bytes": object.get("Size"),
                "last_modified": object.get("LastModified"),
                "type": file_type(key),
            })
        })
        .collect();
    let common_prefixes: Vec<Value> = array(&response, "CommonPrefixes")
        .iter()
        .map(|p| json!({"prefix": p.get("Prefix"), "type": "folder"}))
        .collect();

    Ok(json!({
        "bucket": bucket,
        "prefix": prefix,
        "objects": objects,
        "common_prefixes": common_prefixes,
    }))
}

/// File type inferred from the key's extension.
fn file_type(key: &str) -> &'static str {
    let ends_with_any = |exts: &[&str]| exts.iter().any(|ext| key.ends_with(ext));
    if key.ends_with(".csv") {
        "csv"
    } else if key.ends_with(".json") {
        "json"
    } else if key.ends_with(".parquet") {
        "parquet"
    } else if ends_with_any(&[".txt", ".log", ".md"]) {
        "text"
    } else if ends_with_any(&[".jpg", ".jpeg", ".png", ".gif"]) {
        "image"
    } else if key.ends_with('/') {
        "folder"
    } else {
        "unknown"
    }
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ObjectParams {
    /// The name of the S3 bucket
    pub bucket_name: String,
    /// The key of the object
    pub object_key: String,
    /// The version ID of the object
    #[serde(default)]
    pub version_id: Option<String>,
}

async fn head_object(client: ClientHandle, params: ObjectParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (bucket, key) = (params.bucket_name, params.object_key);

    let input = Input::new()
        .set("Bucket", &bucket)
        .set("Key", &key)
        .opt("VersionId", params.version_id)
        .build();
    let response = api
        .call(ApiRequest::new(SERVICE, "HeadObject", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("404") | Some("NoSuchKey") => format!("Object {} not found in bucket {}", key, bucket),
                Some("403") | Some("AccessDenied") => format!("Access denied to object {} in bucket {}", key, bucket),
                _ => format!("Error retrieving metadata for object {}: {}", key, e),
            };
            remote_failure("head_object", &e, message)
        })?;

    Ok(json!({
        "LastModified": response.get("LastModified"),
        "ContentLength": response.get("ContentLength"),
        "ContentType": response.get("ContentType"),
        "ETag": response.get("ETag"),
        "VersionId": response.get("VersionId"),
        "StorageClass": response.get("StorageClass"),
        "Metadata": response.get("Metadata").cloned().unwrap_or_else(|| json!({})),
        "RestoreStatus": response.get("Restore"),
        "ArchiveStatus": response.get("ArchiveStatus"),
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListBucketsParams {}

async fn list_buckets(client: ClientHandle, _params: ListBucketsParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let response = api
        .call(ApiRequest::new(SERVICE, "ListBuckets", json!({})))
        .await
        .map_err(|e| remote_failure("list_buckets", &e, format!("Error listing S3 buckets: {}", e)))?;

    let buckets: Vec<Value> = array(&response, "Buckets")
        .iter()
        .map(|bucket| json!({"name": bucket.get("Name"), "creation_date": bucket.get("CreationDate")}))
        .collect();
    tracing::info!(count = buckets.len(), "Listed buckets");
    Ok(json!({ "buckets": buckets }))
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadObjectParams {
    /// The name of the S3 bucket
    pub bucket_name: String,
    /// The key to assign to the object
    pub object_key: String,
    /// The content to upload
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

async fn upload_object(client: ClientHandle, params: UploadObjectParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (bucket, key) = (params.bucket_name, params.object_key);
    tracing::info!(%bucket, %key, "Uploading object");

    let input = json!({
        "Bucket": bucket,
        "Key": key,
        "Body": params.content,
        "ContentType": params.content_type,
    });
    let response = api
        .call(ApiRequest::new(SERVICE, "PutObject", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("AccessDenied") => format!("Access denied to bucket {}", bucket),
                _ => format!("Error uploading to bucket {}: {}", bucket, e),
            };
            remote_failure("upload_object", &e, message)
        })?;

    Ok(json!({
        "etag": response.get("ETag"),
        "status": "success",
        "bucket": bucket,
        "key": key,
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetObjectParams {
    /// The name of the S3 bucket
    pub bucket_name: String,
    /// The key of the object
    pub object_key: String,
    #[serde(default)]
    pub version_id: Option<String>,
    /// Start byte for a range request; used together with `range_end`
    #[serde(default)]
    pub range_start: Option<u64>,
    /// End byte for a range request; used together with `range_start`
    #[serde(default)]
    pub range_end: Option<u64>,
}

async fn get_object(client: ClientHandle, params: GetObjectParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (bucket, key) = (params.bucket_name, params.object_key);
    let range = match (params.range_start, params.range_end) {
        (Some(start), Some(end)) => Some(format!("bytes={}-{}", start, end)),
        _ => None,
    };

    let input = Input::new()
        .set("Bucket", &bucket)
        .set("Key", &key)
        .opt("VersionId", params.version_id)
        .opt("Range", range)
        .build();
    let response = api
        .call(ApiRequest::new(SERVICE, "GetObject", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("404") | Some("NoSuchKey") => format!("Object {} not found in bucket {}", key, bucket),
                Some("403") | Some("AccessDenied") => format!("Access denied to object {} in bucket {}", key, bucket),
                _ => format!("Error retrieving object {}: {}", key, e),
            };
            remote_failure("get_object", &e, message)
        })?;

    Ok(json!({
        "Body": response.get("Body"),
        "ContentType": response.get("ContentType"),
        "ContentLength": response.get("ContentLength"),
        "LastModified": response.get("LastModified"),
        "ETag": response.get("ETag"),
        "VersionId": response.get("VersionId"),
        "Metadata": response.get("Metadata").cloned().unwrap_or_else(|| json!({})),
        "StorageClass": response.get("StorageClass"),
    }))
}
