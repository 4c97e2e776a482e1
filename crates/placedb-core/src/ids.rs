use md5::{Digest, Md5};
use uuid::Builder;

/// Content-addressed record id: a version-3 UUID over the MD5 of the raw UTF-8 bytes of
/// the upstream id, with no namespace prefix. Stable across runs, platforms and
/// re-ingestion, and equal to `UUID.nameUUIDFromBytes` on the JVM.
pub fn stable_hash(external_id: &str) -> String {
    let digest = Md5::digest(external_id.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    Builder::from_md5_bytes(bytes).into_uuid().to_string()
}
