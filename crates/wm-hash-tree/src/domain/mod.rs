//! Bucketing, leaf/bucket/root hash construction (§4.2).

pub mod bucket;
pub mod errors;
pub mod tree;

pub use bucket::{bucket_key, bucket_key_for};
pub use errors::HashTreeError;
pub use tree::{build_bucket, build_root, bucket_hash, leaf_view, root_hash, BucketView, LeafView, RootView};
