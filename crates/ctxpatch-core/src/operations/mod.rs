pub mod file_operations;
pub mod patch_applicator;
pub mod root_resolver;

pub use patch_applicator::apply_patch;
pub use root_resolver::resolve_root;
