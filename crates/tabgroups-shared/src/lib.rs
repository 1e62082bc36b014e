pub mod diagnostics;
pub mod paths;
