//! Shared infrastructure utilities for vantage.
//!
//! Cross-cutting helpers multiple vantage crates need but that don't belong
//! in the domain-pure `vantage-types` crate:
//!
//! - **`secure_fs`**: Owner-only directory permission hardening, shared by
//!   the on-disk counter cache
//! - **`windows_acl`**: The Windows counterpart to Unix mode bits for the
//!   above

pub mod secure_fs;
pub mod windows_acl;

pub use secure_fs::ensure_secure_dir;
pub use windows_acl::set_owner_only_dir_acl;
