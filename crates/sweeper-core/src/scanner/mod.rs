pub mod kind;
pub mod walk;

pub use kind::{classify_kind, FileKind};
pub use walk::{collect_descriptors, scan_repository};
