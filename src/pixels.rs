//! # 像素缓冲区模块
//!
//! 把 `image` 解码得到的图像整理成按行扫描顺序排列的像素序列，
//! 同时保留宽、高和颜色模式，以便原样重建图像。

use std::fmt;

use clap::ValueEnum;
use image::{DynamicImage, ImageBuffer};
use log::warn;

use crate::error::StegoError;

/// 承载隐写比特的通道。编码和解码必须使用同一个通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Channel {
    /// 通道 0 (RGB 图像中的红色，灰度图像中的亮度)。
    #[default]
    Red,
    /// 通道 1。
    Green,
    /// 通道 2。
    Blue,
}

impl Channel {
    /// 该通道在一个像素内的下标。
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        write!(f, "{name} ({})", self.index())
    }
}

/// 8 位像素的颜色模式，决定每个像素的通道数和通道顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Luma => 1,
            ColorMode::LumaAlpha => 2,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }
}

/// 按行扫描顺序排列的像素数据，以及重建图像所需的元数据。
///
/// 各通道的取值交错存放在 `data` 中，长度恒等于 `width * height * channels`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 由原始通道数据构造像素缓冲区。
    ///
    /// # Errors
    ///
    /// 如果 `data` 的长度与 `width * height * channels` 不一致，返回 `StegoError::InvalidBuffer`。
    pub fn new(
        width: u32,
        height: u32,
        mode: ColorMode,
        data: Vec<u8>,
    ) -> Result<Self, StegoError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(mode.channels()));

        if expected != Some(data.len()) {
            return Err(StegoError::InvalidBuffer {
                len: data.len(),
                width,
                height,
                channels: mode.channels(),
            });
        }

        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    /// 从解码后的图像构造像素缓冲区。
    ///
    /// 8 位的灰度、灰度+透明、RGB、RGBA 图像保持原有颜色模式；
    /// 其他模式 (16 位、浮点) 会先转换为 8 位 RGBA。
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (mode, data) = match image {
            DynamicImage::ImageLuma8(buf) => (ColorMode::Luma, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (ColorMode::LumaAlpha, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (ColorMode::Rgb, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (ColorMode::Rgba, buf.into_raw()),
            other => {
                warn!(
                    "Converting {:?} image to 8-bit RGBA before processing",
                    other.color()
                );
                (ColorMode::Rgba, other.into_rgba8().into_raw())
            }
        };

        Self {
            width,
            height,
            mode,
            data,
        }
    }

    /// 按原有宽、高和颜色模式重建图像。
    pub fn into_image(self) -> Result<DynamicImage, StegoError> {
        let Self {
            width,
            height,
            mode,
            data,
        } = self;
        let len = data.len();
        let invalid = || StegoError::InvalidBuffer {
            len,
            width,
            height,
            channels: mode.channels(),
        };

        let image = match mode {
            ColorMode::Luma => DynamicImage::ImageLuma8(
                ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?,
            ),
            ColorMode::LumaAlpha => DynamicImage::ImageLumaA8(
                ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?,
            ),
            ColorMode::Rgb => DynamicImage::ImageRgb8(
                ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?,
            ),
            ColorMode::Rgba => DynamicImage::ImageRgba8(
                ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?,
            ),
        };

        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// 像素个数，即 `width * height`。
    pub fn pixel_count(&self) -> usize {
        self.data.len() / self.mode.channels()
    }

    /// 按行扫描顺序遍历每个像素的通道值。
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.mode.channels())
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data.chunks_exact_mut(self.mode.channels())
    }

    /// 检查通道在当前颜色模式中存在，并返回它在像素内的下标。
    pub fn channel_index(&self, channel: Channel) -> Result<usize, StegoError> {
        let channels = self.mode.channels();
        let index = channel.index();
        if index >= channels {
            return Err(StegoError::ChannelUnavailable { channel, channels });
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn mismatched_length_is_rejected() {
        let result = PixelBuffer::new(2, 2, ColorMode::Rgb, vec![0; 11]);
        assert_eq!(
            result,
            Err(StegoError::InvalidBuffer {
                len: 11,
                width: 2,
                height: 2,
                channels: 3
            })
        );
    }

    #[test]
    fn rgb_image_keeps_mode_and_raster_order() -> Result<(), StegoError> {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, Rgb([1, 2, 3]));
        img.put_pixel(0, 1, Rgb([4, 5, 6]));

        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgb8(img.clone()));
        assert_eq!(buffer.mode(), ColorMode::Rgb);
        assert_eq!(buffer.pixel_count(), 4);

        let pixels: Vec<&[u8]> = buffer.pixels().collect();
        assert_eq!(pixels[1], &[1, 2, 3]);
        assert_eq!(pixels[2], &[4, 5, 6]);

        let rebuilt = buffer.into_image()?;
        assert_eq!(rebuilt.as_rgb8(), Some(&img));
        Ok(())
    }

    #[test]
    fn sixteen_bit_image_is_normalised_to_rgba8() {
        let img = DynamicImage::new_rgb16(3, 1);
        let buffer = PixelBuffer::from_image(img);
        assert_eq!(buffer.mode(), ColorMode::Rgba);
        assert_eq!(buffer.pixel_count(), 3);
        assert!(buffer.pixels().all(|pixel| pixel.len() == 4));
    }

    #[test]
    fn grayscale_image_only_offers_the_first_channel() {
        let img = GrayImage::from_pixel(2, 2, Luma([7]));
        let buffer = PixelBuffer::from_image(DynamicImage::ImageLuma8(img));

        assert_eq!(buffer.channel_index(Channel::Red), Ok(0));
        assert_eq!(
            buffer.channel_index(Channel::Blue),
            Err(StegoError::ChannelUnavailable {
                channel: Channel::Blue,
                channels: 1
            })
        );
    }
}
