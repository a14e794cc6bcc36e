mod error;
mod traits;

#[cfg(feature = "object-storage")]
pub mod bucket;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use error::StorageError;
pub use traits::{BoxReader, ObjectInfo, ObjectStore, StoredObject};

#[cfg(feature = "object-storage")]
pub use bucket::{BucketStore, build_object_store};
