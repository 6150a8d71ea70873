//! # 隐写核心算法
//!
//! 每个像素只有一个指定通道携带一个比特：
//! 消息逐字符转换为单字节，末尾追加终止符 `###`，再按高位在前展开成比特流，
//! 依行扫描顺序写入各像素指定通道的最低有效位。
//!
//! 解码时读出所有像素的最低有效位，按 8 位一组还原字节，**跳过值为 0 的字节**，
//! 然后在得到的文本中查找第一个终止符。跳过 0 字节意味着消息中的 NUL 字符无法恢复，
//! 这是为了兼容已有隐写图像而保留的已知限制。
//!
//! 同理，解码只认第一个 `###`：以 `#` 结尾或本身含有 `###` 的消息会在该处被截断，
//! 例如 `"C#"` 打包为 `"C####"`，解码得到 `"C"`。

use image::DynamicImage;
use log::debug;

use crate::bits::{Bitstream, bits_to_bytes};
use crate::constants::{BITS_PER_BYTE, TERMINATOR};
use crate::error::StegoError;
use crate::pixels::{Channel, PixelBuffer};

/// 解码结果：找到消息，或者图像中不存在终止符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Found(String),
    NotFound,
}

impl DecodeResult {
    pub fn into_message(self) -> Option<String> {
        match self {
            DecodeResult::Found(message) => Some(message),
            DecodeResult::NotFound => None,
        }
    }
}

/// 像素缓冲区可携带的比特数，每个像素一个比特。
pub fn capacity(pixels: &PixelBuffer) -> usize {
    pixels.pixel_count()
}

/// 给定像素数时最多能隐藏的字符数 (已扣除终止符)。
pub fn max_message_len(pixel_count: usize) -> usize {
    (pixel_count / BITS_PER_BYTE).saturating_sub(TERMINATOR.len())
}

/// 把消息和终止符打包成比特流，并检查 `pixel_count` 个像素是否放得下。
///
/// # Errors
///
/// * 消息中某个字符的码位大于 255 时返回 `StegoError::UnencodableCharacter`。
/// * 所需比特数大于 `pixel_count` 时返回 `StegoError::Capacity`。
pub fn pack(message: &str, pixel_count: usize) -> Result<Bitstream, StegoError> {
    let mut bytes = message
        .chars()
        .enumerate()
        .map(|(index, character)| {
            u8::try_from(character)
                .map_err(|_| StegoError::UnencodableCharacter { character, index })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    bytes.extend_from_slice(TERMINATOR);

    let required = bytes.len() * BITS_PER_BYTE;
    if required > pixel_count {
        return Err(StegoError::Capacity {
            required,
            available: pixel_count,
        });
    }

    Ok(Bitstream::from_bytes(&bytes))
}

/// 把比特流依次写入各像素指定通道的最低有效位，返回新的像素缓冲区。
///
/// 比特流用完之后的像素，以及所有像素的其他通道，都原样复制。
///
/// # Errors
///
/// * 比特流长度超过像素数时返回 `StegoError::BitstreamOverrun` (应先调用 [`pack`] 检查容量)。
/// * 通道在图像颜色模式中不存在时返回 `StegoError::ChannelUnavailable`。
pub fn embed(
    pixels: &PixelBuffer,
    bits: &Bitstream,
    channel: Channel,
) -> Result<PixelBuffer, StegoError> {
    let index = pixels.channel_index(channel)?;
    if bits.len() > pixels.pixel_count() {
        return Err(StegoError::BitstreamOverrun {
            bits: bits.len(),
            pixels: pixels.pixel_count(),
        });
    }

    let mut output = pixels.clone();
    output
        .pixels_mut()
        .zip(bits.iter())
        .for_each(|(pixel, bit)| pixel[index] = (pixel[index] & !1) | bit);

    debug!("Embedded {} bits into channel {}", bits.len(), channel);
    Ok(output)
}

/// [`pack`] 与 [`embed`] 的组合：检查容量后把消息写入图像。
///
/// 失败时不会产生任何部分写入的结果，输入缓冲区也不会被修改。
pub fn encode(
    pixels: &PixelBuffer,
    message: &str,
    channel: Channel,
) -> Result<PixelBuffer, StegoError> {
    pixels.channel_index(channel)?;
    let bits = pack(message, capacity(pixels))?;
    embed(pixels, &bits, channel)
}

/// 读出每个像素指定通道的最低有效位并还原消息。
///
/// 对任何像素缓冲区都不会失败；没有终止符时返回 `DecodeResult::NotFound`。
///
/// # Errors
///
/// 只有在通道于图像颜色模式中不存在时返回 `StegoError::ChannelUnavailable`。
pub fn extract_and_decode(
    pixels: &PixelBuffer,
    channel: Channel,
) -> Result<DecodeResult, StegoError> {
    let index = pixels.channel_index(channel)?;

    let bits: Vec<u8> = pixels.pixels().map(|pixel| pixel[index] & 1).collect();
    let candidate: Vec<u8> = bits_to_bytes(&bits).filter(|&byte| byte != 0).collect();

    let end = candidate
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR);
    debug!(
        "Read {} bits, {} non-zero bytes, terminator at {:?}",
        bits.len(),
        candidate.len(),
        end
    );

    Ok(match end {
        Some(end) => {
            DecodeResult::Found(candidate[..end].iter().map(|&b| char::from(b)).collect())
        }
        None => DecodeResult::NotFound,
    })
}

/// 从解码后的图像中恢复消息，[`PixelBuffer::from_image`] 与 [`extract_and_decode`] 的组合。
pub fn decode(image: DynamicImage, channel: Channel) -> Result<DecodeResult, StegoError> {
    extract_and_decode(&PixelBuffer::from_image(image), channel)
}
