//! # 错误类型模块
//!
//! 编解码器本身只返回 `StegoError`；文件 I/O 等外部错误由 `handler` 用 `anyhow` 处理。

use thiserror::Error;

use crate::pixels::Channel;

/// 隐写编解码过程中可能出现的错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// 消息 (含终止符) 所需比特数超过了图像的像素数。
    #[error("Not enough space in the image to hide the text: required {required} bits, available {available} bits")]
    Capacity { required: usize, available: usize },

    /// 消息中含有无法用单个字节表示的字符 (码位大于 255)。
    #[error("Character {character:?} at index {index} cannot be encoded in a single byte")]
    UnencodableCharacter { character: char, index: usize },

    /// `embed` 收到的比特流比像素数还长，调用方未事先检查容量。
    #[error("Bitstream of {bits} bits does not fit into {pixels} pixels")]
    BitstreamOverrun { bits: usize, pixels: usize },

    /// 指定的通道在该图像的颜色模式中不存在。
    #[error("Channel {channel} is not available in an image with {channels} channel(s)")]
    ChannelUnavailable { channel: Channel, channels: usize },

    /// 像素数据长度与宽、高、通道数不一致。
    #[error("Pixel data of {len} bytes does not match a {width}x{height} image with {channels} channel(s)")]
    InvalidBuffer {
        len: usize,
        width: u32,
        height: u32,
        channels: usize,
    },
}
