//! 应用层 - 命令（写操作）

mod speaker_commands;

pub use speaker_commands::*;
