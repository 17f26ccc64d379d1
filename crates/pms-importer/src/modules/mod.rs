//! 임포트 실행 모듈.

pub mod check;
pub mod import;

pub use check::check_file;
pub use import::{import_file, ImportOptions};
