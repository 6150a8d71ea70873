//! # lsb_marker 库
//!
//! 本库包含单通道 LSB 隐写工具的核心逻辑：
//! 以 `###` 终止符界定消息边界，把每个字节逐位写入指定颜色通道的最低有效位。

// 声明库包含的所有模块。

pub mod bits;
pub mod cli;
pub mod constants;
pub mod error;
pub mod handler;
pub mod pixels;
pub mod steganography;
