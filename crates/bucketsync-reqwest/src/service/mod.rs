//! Storage provider implementation.
//!
//! This module implements [`StorageProvider`] for [`ReqwestClient`].

mod wire;

use bucketsync_core::StorageProvider;
use bucketsync_core::types::{
    BucketInfo, CreateBucket, ListEntry, ListOptions, ObjectBody, UploadOptions,
};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use self::wire::{BucketRecord, CreateBucketBody, ListObjectsBody, ObjectRecord};
use crate::connect::{ReqwestClient, TRACING_TARGET};
use crate::error::Error;

/// Content type sent when the source did not report one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Header controlling overwrite behaviour of uploads.
const UPSERT_HEADER: &str = "x-upsert";

#[async_trait::async_trait]
impl StorageProvider for ReqwestClient {
    async fn list_buckets(&self) -> bucketsync_core::Result<Vec<BucketInfo>> {
        let url = self.api_url(["bucket"])?;
        let response = self.http().get(url).send().await.map_err(Error::from)?;
        let records: Vec<BucketRecord> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            count = records.len(),
            "Buckets listed"
        );

        Ok(records.into_iter().map(BucketInfo::from).collect())
    }

    async fn create_bucket(&self, request: &CreateBucket) -> bucketsync_core::Result<()> {
        let url = self.api_url(["bucket"])?;
        let body = CreateBucketBody {
            id: &request.id,
            name: &request.id,
            public: request.public,
        };

        let response = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::from)?;
        Self::check(response).await?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = %request.id,
            public = request.public,
            "Bucket created"
        );

        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> bucketsync_core::Result<Vec<ListEntry>> {
        let url = self.api_url(["object", "list", bucket])?;
        let body = ListObjectsBody {
            prefix,
            limit: options.limit,
            offset: options.offset,
            sort_by: &options.sort_by,
            search: options.search.as_deref(),
        };

        let response = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::from)?;
        let records: Vec<ObjectRecord> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Error::from)?;

        Ok(records.into_iter().map(ListEntry::from).collect())
    }

    async fn download(&self, bucket: &str, path: &str) -> bucketsync_core::Result<ObjectBody> {
        let url = self.object_url(bucket, path)?;
        let response = self.http().get(url).send().await.map_err(Error::from)?;
        let response = Self::check(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let data = response.bytes().await.map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            path = %path,
            size = data.len(),
            "Object downloaded"
        );

        Ok(ObjectBody { data, content_type })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: ObjectBody,
        options: &UploadOptions,
    ) -> bucketsync_core::Result<()> {
        let url = self.object_url(bucket, path)?;
        let content_type = options
            .content_type
            .as_deref()
            .or(body.content_type.as_deref())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let size = body.len();

        let mut request = self
            .http()
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(UPSERT_HEADER, options.upsert.to_string());

        if let Some(cache_control) = options.cache_control.as_deref() {
            request = request.header(CACHE_CONTROL, format!("max-age={cache_control}"));
        }

        let response = request
            .body(body.data)
            .send()
            .await
            .map_err(Error::from)?;
        Self::check(response).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            path = %path,
            size,
            "Object uploaded"
        );

        Ok(())
    }
}
