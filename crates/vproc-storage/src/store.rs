//! Object store capability.

use std::path::Path;

use async_trait::async_trait;
use vproc_models::ArtifactRef;

use crate::error::StorageResult;

/// Content type declared for every uploaded video.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Keyed artifact storage.
///
/// Keys are derived from the artifact reference (`<kind>/<object_id>`).
/// Implementations must be safe to call from every worker at once.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `artifact` into the local file `dest`.
    async fn fetch(&self, artifact: &ArtifactRef, dest: &Path) -> StorageResult<()>;

    /// Upload the local file `src` as `artifact`.
    async fn store(&self, src: &Path, artifact: &ArtifactRef) -> StorageResult<()>;
}
