use image::ImageFormat;

/// 附加在每条消息末尾的终止符。
/// 解码时以它在候选文本中第一次出现的位置作为消息的结尾。
pub const TERMINATOR: &[u8; 3] = b"###";

/// 每个字节展开成的比特数 (高位在前)。
pub const BITS_PER_BYTE: usize = 8;

/// 默认允许处理的最大像素数。
/// 编解码的耗时与像素数成线性关系，超过此值的图像会在进入编解码器之前被拒绝。
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// 未指定 `--dest` 时，隐写结果图像文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";

/// 未指定 `--text` 时，恢复文本文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";

/// 隐写结果允许保存的无损格式。
/// `image` 的 WebP 编码器只输出无损 WebP。
pub const LOSSLESS_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::Qoi,
    ImageFormat::WebP,
];
