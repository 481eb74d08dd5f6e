//! Object-store access for Sealdrop.
//!
//! The object store is addressed exclusively through scoped credentials:
//! short-lived presigned URLs minted by [`ScopedUrlSigner`], and one
//! header-signed batch-delete call used by the reconciler. The signer is the
//! only place in the codebase that touches the long-lived store credentials.

mod delete;
mod delete_result;
mod sign;

pub use delete::{ObjectStoreClient, ObjectStoreDelete};
pub use delete_result::{escape_xml, parse_deleted_keys};
pub use sign::ScopedUrlSigner;
