//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、图像的解码与无损保存、调用核心隐写算法以及向用户报告结果。

use crate::cli::{CapacityArgs, HideArgs, RecoverArgs};
use crate::constants::{DOCTORED_PREFIX, LOSSLESS_FORMATS, RECOVERED_PREFIX};
use crate::error::StegoError;
use crate::pixels::PixelBuffer;
use crate::steganography::{capacity, decode, encode, max_message_len};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{DynamicImage, ImageFormat};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责确定输出路径、读取消息和图像、调用隐写核心函数，
/// 最后把结果以无损格式写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径和通道设置的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误，且不会写出任何文件：
/// * 目标文件已存在且未指定 `--force`，或目标格式不是无损格式。
/// * 无法读取输入的图像或文本文件，或消息为空。
/// * 图像像素数超过 `--max-pixels`。
/// * 消息含有无法用单字节表示的字符，或图像没有足够的空间。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output_path(&args.image, DOCTORED_PREFIX, "png"));
    ensure_writable(&dest, args.force)?;
    ensure_lossless(&dest)?;

    let message = match (&args.message, &args.text) {
        (Some(message), _) => message.clone(),
        (None, Some(text)) => fs::read_to_string(text).with_context(|| {
            format!(
                "Unable to read text file: {} \nThe file must exist and be UTF-8 encoded.",
                text.to_string_lossy().red().bold()
            )
        })?,
        (None, None) => anyhow::bail!("Please provide a message with --text or --message."),
    };
    anyhow::ensure!(!message.is_empty(), "Please enter a message to hide.");

    let pixels = load_pixels(&args.image, args.max_pixels)?;
    debug!(
        "Hiding {} characters in {} pixels using channel {}",
        message.chars().count(),
        pixels.pixel_count(),
        args.channel
    );

    let stego = match encode(&pixels, &message, args.channel) {
        Ok(stego) => stego,
        Err(StegoError::Capacity {
            required,
            available,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the text. \nRequired: {} bits, Available: {} bits (at most {} characters)",
            required.to_string().red().bold(),
            available.to_string().green().bold(),
            max_message_len(available).to_string().green().bold()
        ),
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to hide the message in {}",
                    args.image.to_string_lossy().red().bold()
                )
            });
        }
    };

    stego
        .into_image()?
        .save(&dest)
        .with_context(|| {
            format!(
                "Unable to write to target image file: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

    info!("Wrote stego image to {}", dest.display());
    println!(
        "The text has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 读取经过隐写的图像并恢复消息。找到消息时写入目标文本文件；
/// 找不到终止符时只提示用户，不写出任何文件，也不视为错误。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件，或像素数超过 `--max-pixels`。
/// * 指定通道在图像中不存在。
/// * 目标文件已存在且未指定 `--force`，或无法写入。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let image = load_image(&args.image, args.max_pixels)?;

    let result = decode(image, args.channel).with_context(|| {
        format!(
            "Failed to recover the message from '{}'.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let Some(message) = result.into_message() else {
        info!("No terminator found in {}", args.image.display());
        println!(
            "No hidden message found in: {}",
            args.image.to_string_lossy().yellow().bold()
        );
        return Ok(());
    };

    let dest = args
        .text
        .clone()
        .unwrap_or_else(|| default_output_path(&args.image, RECOVERED_PREFIX, "txt"));
    ensure_writable(&dest, args.force)?;

    fs::write(&dest, message).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The text has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令：报告图像的像素数、可用比特数和最多可隐藏的字符数。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let pixels = load_pixels(&args.image, args.max_pixels)?;
    let bits = capacity(&pixels);

    println!(
        "{}: {}x{} pixels, {} bits available, up to {} characters",
        args.image.to_string_lossy().bold(),
        pixels.width(),
        pixels.height(),
        bits.to_string().green().bold(),
        max_message_len(bits).to_string().green().bold()
    );
    Ok(())
}

fn load_pixels(path: &Path, max_pixels: u64) -> Result<PixelBuffer> {
    load_image(path, max_pixels).map(PixelBuffer::from_image)
}

/// 读取并解码图像，在进入编解码器之前检查像素数上限。
fn load_image(path: &Path, max_pixels: u64) -> Result<DynamicImage> {
    let image = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    let pixel_count = u64::from(image.width()) * u64::from(image.height());
    anyhow::ensure!(
        pixel_count <= max_pixels,
        "Image is too large: {} pixels, the limit is {}",
        pixel_count.to_string().red().bold(),
        max_pixels.to_string().green().bold()
    );

    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// 在源文件旁生成 `<prefix><stem>.<extension>` 形式的默认输出路径。
fn default_output_path(source: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    source.with_file_name(format!("{prefix}{stem}.{extension}"))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 隐写数据依赖逐位精确的像素值，有损格式会破坏 LSB 平面。
fn ensure_lossless(path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).with_context(|| {
        format!(
            "Unable to determine the image format of: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    anyhow::ensure!(
        LOSSLESS_FORMATS.contains(&format),
        "Output format {:?} is not lossless. \nUse one of: png, bmp, tiff, qoi, webp",
        format
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_sit_next_to_the_source() {
        assert_eq!(
            default_output_path(Path::new("/tmp/pics/cat.jpg"), DOCTORED_PREFIX, "png"),
            PathBuf::from("/tmp/pics/doctored_cat.png")
        );
        assert_eq!(
            default_output_path(Path::new("doctored_cat.png"), RECOVERED_PREFIX, "txt"),
            PathBuf::from("recovered_doctored_cat.txt")
        );
    }

    #[test]
    fn lossy_output_formats_are_refused() {
        assert!(ensure_lossless(Path::new("out.png")).is_ok());
        assert!(ensure_lossless(Path::new("out.bmp")).is_ok());
        assert!(ensure_lossless(Path::new("out.jpg")).is_err());
        assert!(ensure_lossless(Path::new("out")).is_err());
    }
}
