mod digest;

pub use digest::{hash_file, ContentDigest, SHORT_DIGEST_LEN};
