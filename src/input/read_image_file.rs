// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入与预处理
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Otopark Contributors

use crate::{FromUrl, FromUrlWithScheme, frame::TensorFrame};

use image::{ImageReader, RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 从文件读取一张图像，缩放至 `W×H` 后作为模型输入
pub struct ImageFileInput<const W: u32, const H: u32> {
  image: Option<RgbImage>,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for ImageFileInput<W, H> {
  const SCHEME: &'static str = "image";
}

impl<const W: u32, const H: u32> FromUrl for ImageFileInput<W, H> {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = url.path();
    debug!("读取图像文件: {}", path);
    // to_rgb8 同时丢弃 alpha 通道
    let image = ImageReader::open(path)?.decode()?.to_rgb8();

    Ok(Self::from_image(image))
  }
}

impl<const W: u32, const H: u32> ImageFileInput<W, H> {
  pub fn from_image(image: RgbImage) -> Self {
    Self { image: Some(image) }
  }

  pub fn into_nchw(self) -> ImageFileInputNchw<W, H> {
    ImageFileInputNchw { inner: self }
  }
}

pub struct ImageFileInputNchw<const W: u32, const H: u32> {
  inner: ImageFileInput<W, H>,
}

impl<const W: u32, const H: u32> Iterator for ImageFileInputNchw<W, H> {
  type Item = TensorFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.image.take().map(TensorFrame::from)
  }
}

impl<const W: u32, const H: u32> From<RgbImage> for TensorFrame<W, H> {
  fn from(image: RgbImage) -> Self {
    // 拉伸填充，不保持宽高比
    let resized = if image.dimensions() == (W, H) {
      image
    } else {
      image::imageops::resize(&image, W, H, FilterType::Triangle)
    };

    let mut frame = TensorFrame::<W, H>::default();
    let plane = frame.width() * frame.height();
    let slice = frame.as_mut();

    for (idx, pixel) in resized.pixels().enumerate() {
      for c in 0..3 {
        slice[c * plane + idx] = pixel[c] as f32 / 255.0;
      }
    }
    frame
  }
}
