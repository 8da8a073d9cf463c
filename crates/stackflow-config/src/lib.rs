//! stackflow のスタック設定
//!
//! `stack.kdl` 系のファイルを発見・パースし、名前付きの文字列パラメータとして提供します。

pub mod discovery;
pub mod error;
pub mod parser;
pub mod stack;

pub use discovery::{DiscoveredFiles, discover_stack_files, find_project_root};
pub use error::*;
pub use stack::{ENV_PREFIX, StackConfig, ValueSource};
