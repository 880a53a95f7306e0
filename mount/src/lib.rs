//! Read-only file injection over a container path.
//!
//! The target of an injection is typically a kernel-exposed file the hook
//! cannot edit in place, so the patched content is materialized in a
//! private tmpfs and bind-mounted over the target instead.

mod error;
mod inject;

pub use error::MountError;
pub use inject::inject_readonly_file;
