// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/model/decode.rs - 锚点解码
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

use thiserror::Error;

use crate::{
  config::{AnchorLayout, ConfigError},
  model::{BoundingBox, Detection},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
  #[error("模型输出大小不匹配: 期望 {expected}, 实际 {actual}")]
  InputShape { expected: usize, actual: usize },
  #[error("张量布局无效: {0}")]
  Layout(#[from] ConfigError),
}

/// 将通道优先的模型输出解码为候选检测框
///
/// 输出张量按 `num_attributes` 个平面排列，每个平面含 `num_anchors` 个值，
/// 平面 0..4 依次为 cx, cy, w, h。置信度严格大于 `threshold` 的锚点才会保留，
/// NaN 置信度一律丢弃。几何量非有限值的锚点同样丢弃，
/// 因此输出中的框坐标总是有限的。
///
/// 输出顺序与锚点索引一致，未按置信度排序。
/// 布局在读取缓冲区前先行校验，非法布局返回 [`DecodeError::Layout`]。
pub fn decode(
  buffer: &[f32],
  layout: &AnchorLayout,
  threshold: f32,
) -> Result<Vec<Detection>, DecodeError> {
  layout.validate()?;
  let expected = layout
    .expected_len()
    .ok_or(ConfigError::TensorTooLarge {
      num_anchors: layout.num_anchors,
      num_attributes: layout.num_attributes,
    })?;
  if buffer.len() != expected {
    return Err(DecodeError::InputShape {
      expected,
      actual: buffer.len(),
    });
  }

  let spatial = layout.num_anchors;
  let scores = &buffer[layout.confidence_index * spatial..(layout.confidence_index + 1) * spatial];

  let mut items = Vec::new();
  for (idx, &score) in scores.iter().enumerate() {
    if score.is_nan() || score <= threshold {
      continue;
    }

    let cx = buffer[idx];
    let cy = buffer[spatial + idx];
    let w = buffer[2 * spatial + idx];
    let h = buffer[3 * spatial + idx];

    let bbox = BoundingBox::from_center(cx, cy, w, h);
    if !bbox.is_finite() {
      continue;
    }

    items.push(Detection::new(bbox, score));
  }

  Ok(items)
}
