pub mod error;
pub mod matcher;
pub mod operations;
pub mod options;
pub mod parser;
pub mod patcher;
pub mod types;

pub use error::{PatchError, PatchResult};
pub use matcher::HunkLocator;
pub use operations::{apply_patch, resolve_root};
pub use options::PatchOptions;
pub use parser::parse_patches;
pub use patcher::ContextualPatch;
pub use types::{BinaryPayload, Hunk, HunkLine, PatchReport, PatchStatus, SinglePatch};
