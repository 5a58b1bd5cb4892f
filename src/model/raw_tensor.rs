// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/model/raw_tensor.rs - 回放已导出的模型输出张量
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::Model};

#[derive(Error, Debug)]
pub enum RawTensorError {
  #[error("张量文件加载错误: {0}")]
  LoadError(#[from] std::io::Error),
  #[error("张量文件大小 {0} 字节不是 4 的整数倍")]
  Misaligned(usize),
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch {
    expected: &'static str,
    actual: String,
  },
}

/// 从文件回放模型输出的推理后端
///
/// 文件内容为小端序 `f32` 的扁平张量（通道优先），例如 `output0` 的原始导出。
/// 每次推理都返回同一份张量，输入帧不参与计算。
pub struct RawTensorModel<Frame> {
  output: Box<[f32]>,
  _phantom: std::marker::PhantomData<Frame>,
}

impl<Frame> FromUrlWithScheme for RawTensorModel<Frame> {
  const SCHEME: &'static str = "tensor";
}

impl<Frame> FromUrl for RawTensorModel<Frame> {
  type Error = RawTensorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(RawTensorError::SchemeMismatch {
        expected: Self::SCHEME,
        actual: url.scheme().to_string(),
      });
    }

    Self::open(url.path())
  }
}

impl<Frame> RawTensorModel<Frame> {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RawTensorError> {
    let path = path.as_ref();
    info!("加载张量文件: {}", path.display());
    let bytes = std::fs::read(path)?;
    debug!(
      "张量文件大小: {:.2} MB",
      bytes.len() as f64 / (1024.0 * 1024.0)
    );
    Self::from_le_bytes(&bytes)
  }

  pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, RawTensorError> {
    if bytes.len() % 4 != 0 {
      return Err(RawTensorError::Misaligned(bytes.len()));
    }

    let output = bytes
      .chunks_exact(4)
      .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
      .collect::<Vec<_>>();

    Ok(Self::from_output(output))
  }

  pub fn from_output(output: Vec<f32>) -> Self {
    Self {
      output: output.into_boxed_slice(),
      _phantom: std::marker::PhantomData,
    }
  }

  pub fn len(&self) -> usize {
    self.output.len()
  }

  pub fn is_empty(&self) -> bool {
    self.output.is_empty()
  }
}

impl<Frame> Model for RawTensorModel<Frame> {
  type Input = Frame;
  type Output = Box<[f32]>;
  type Error = RawTensorError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("回放 {} 个输出值", self.output.len());
    Ok(self.output.clone())
  }
}
