//! Blob-storage collaborator: upload/delete client and the compensating
//! upload saga.
//!
//! The blob store is an external, slow, fallible call. When a later step of
//! an operation fails after uploads succeeded, the saga deletes the
//! uploaded blobs in reverse order before the error is surfaced. A failed
//! compensation leaves an orphaned blob — the accepted residual risk — and
//! is logged at warn.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// A stored blob: public URL plus the provider-assigned id used for
/// deletion. `duration_secs` is reported by the provider for video media.
#[derive(Debug, Clone)]
pub struct BlobRef {
    pub url: String,
    pub public_id: String,
    pub duration_secs: Option<f64>,
}

/// External blob-storage collaborator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a file, returning its public reference.
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<BlobRef, Error>;

    /// Delete a blob by its provider-assigned id.
    async fn delete(&self, public_id: &str) -> Result<(), Error>;
}

/// HTTP blob store speaking a simple upload/delete protocol:
/// `POST {endpoint}/upload` (multipart, `file` part) returning
/// `{url, publicId, durationSecs?}`, and `DELETE {endpoint}/blobs/{id}`.
pub struct HttpBlobStore {
    endpoint: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    url: String,
    public_id: String,
    duration_secs: Option<f64>,
}

impl HttpBlobStore {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    fn join(&self, path: &str) -> Result<Url, Error> {
        self.endpoint
            .join(path)
            .map_err(|e| Error::Internal(format!("blob store url: {e}")))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<BlobRef, Error> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.join("upload")?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("blob upload: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("blob upload: {e}")))?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("blob upload response: {e}")))?;
        debug!(public_id = %body.public_id, "uploaded blob");
        Ok(BlobRef {
            url: body.url,
            public_id: body.public_id,
            duration_secs: body.duration_secs,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), Error> {
        self.client
            .delete(self.join(&format!("blobs/{public_id}"))?)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("blob delete: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("blob delete: {e}")))?;
        Ok(())
    }
}

/// Compensating-cleanup tracker for multi-upload operations.
///
/// Each successful upload is recorded; if a later step of the operation
/// fails, [`UploadSaga::abort`] deletes the recorded blobs in reverse
/// order. Dropping the saga after success (or calling [`UploadSaga::commit`])
/// keeps the blobs.
pub struct UploadSaga<'a> {
    store: &'a dyn BlobStore,
    uploaded: Vec<BlobRef>,
}

impl<'a> UploadSaga<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self {
            store,
            uploaded: Vec::new(),
        }
    }

    /// Upload and record the blob for potential compensation.
    pub async fn upload(&mut self, filename: &str, bytes: Vec<u8>) -> Result<BlobRef, Error> {
        let blob = self.store.upload(filename, bytes).await?;
        self.uploaded.push(blob.clone());
        Ok(blob)
    }

    /// The operation succeeded: keep all uploaded blobs.
    pub fn commit(mut self) {
        self.uploaded.clear();
    }

    /// A later step failed: delete the recorded blobs, newest first. A
    /// compensation failure is logged and swallowed; the orphaned blob is
    /// the logged residual risk.
    pub async fn abort(mut self) {
        while let Some(blob) = self.uploaded.pop() {
            if let Err(e) = self.store.delete(&blob.public_id).await {
                warn!(public_id = %blob.public_id, error = %e, "blob compensation failed");
            }
        }
    }
}

/// Delete a blob outside a saga, logging instead of failing — used when a
/// record swap succeeded and the old blob is garbage.
pub async fn delete_blob_best_effort(store: &dyn BlobStore, public_id: &str) {
    if let Err(e) = store.delete(public_id).await {
        warn!(public_id = %public_id, error = %e, "stale blob delete failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls; uploads fail after a configurable count.
    struct FakeStore {
        uploads: Mutex<u32>,
        fail_after: u32,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn new(fail_after: u32) -> Self {
            Self {
                uploads: Mutex::new(0),
                fail_after,
                deleted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BlobStore for FakeStore {
        async fn upload(&self, filename: &str, _bytes: Vec<u8>) -> Result<BlobRef, Error> {
            let mut count = self.uploads.lock().unwrap();
            if *count >= self.fail_after {
                return Err(Error::Upstream("upload failed".into()));
            }
            *count += 1;
            Ok(BlobRef {
                url: format!("https://blobs.test/{filename}"),
                public_id: format!("blob-{count}"),
                duration_secs: None,
            })
        }

        async fn delete(&self, public_id: &str) -> Result<(), Error> {
            self.deleted.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn abort_deletes_in_reverse_order() {
        let store = FakeStore::new(10);
        let mut saga = UploadSaga::new(&store);
        saga.upload("a.mp4", vec![1]).await.unwrap();
        saga.upload("b.png", vec![2]).await.unwrap();
        saga.abort().await;
        assert_eq!(*store.deleted.lock().unwrap(), vec!["blob-2", "blob-1"]);
    }

    #[tokio::test]
    async fn commit_keeps_blobs() {
        let store = FakeStore::new(10);
        let mut saga = UploadSaga::new(&store);
        saga.upload("a.mp4", vec![1]).await.unwrap();
        saga.commit();
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_leaves_earlier_blobs_for_abort() {
        let store = FakeStore::new(1);
        let mut saga = UploadSaga::new(&store);
        saga.upload("a.mp4", vec![1]).await.unwrap();
        let err = saga.upload("b.png", vec![2]).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        saga.abort().await;
        assert_eq!(*store.deleted.lock().unwrap(), vec!["blob-1"]);
    }
}
