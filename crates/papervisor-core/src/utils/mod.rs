//! Small pure helpers shared by services and adapters.

pub mod file_name;
pub mod hash;

pub use file_name::is_plain_file_name;
pub use hash::{file_sha256, file_sha256_blocking};
