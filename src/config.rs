// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/config.rs - 后处理配置
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

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.45;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.50;
pub const DEFAULT_CAPACITY: f64 = 20.0;

// YOLOv8n 320x320 输出: [1, 84, 2100]，第 6 个平面为 "car" 类别
pub const DEFAULT_NUM_ANCHORS: usize = 2100;
pub const DEFAULT_NUM_ATTRIBUTES: usize = 84;
pub const DEFAULT_CONFIDENCE_INDEX: usize = 6;

/// 边界框占用的平面数量 (cx, cy, w, h)
pub const BOX_PLANES: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("阈值 {name} 必须位于 [0, 1] 区间内, 实际为 {value}")]
  Threshold { name: &'static str, value: f32 },
  #[error("容量必须为大于 0 的有限值, 实际为 {0}")]
  Capacity(f64),
  #[error("属性数量必须大于 4, 实际为 {0}")]
  TooFewAttributes(usize),
  #[error("置信度平面索引 {index} 必须位于 [4, {num_attributes}) 区间内")]
  ConfidenceIndex { index: usize, num_attributes: usize },
  #[error("张量大小溢出: {num_attributes} 个平面 x {num_anchors} 个锚点")]
  TensorTooLarge {
    num_anchors: usize,
    num_attributes: usize,
  },
}

/// 检测后处理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
  /// 置信度阈值，严格大于该值的候选框才会保留
  pub confidence_threshold: f32,
  /// NMS IoU 阈值，严格大于该值的重叠框会被抑制
  pub iou_threshold: f32,
  /// 停车场容量，占用率的分母
  pub capacity: f64,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      capacity: DEFAULT_CAPACITY,
    }
  }
}

impl PipelineConfig {
  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn with_capacity(mut self, capacity: f64) -> Self {
    self.capacity = capacity;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    check_threshold("confidence_threshold", self.confidence_threshold)?;
    check_threshold("iou_threshold", self.iou_threshold)?;
    check_capacity(self.capacity)
  }
}

/// 模型输出张量的布局（通道优先）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorLayout {
  pub num_anchors: usize,
  pub num_attributes: usize,
  pub confidence_index: usize,
}

impl Default for AnchorLayout {
  fn default() -> Self {
    Self {
      num_anchors: DEFAULT_NUM_ANCHORS,
      num_attributes: DEFAULT_NUM_ATTRIBUTES,
      confidence_index: DEFAULT_CONFIDENCE_INDEX,
    }
  }
}

impl AnchorLayout {
  pub fn new(num_anchors: usize, num_attributes: usize, confidence_index: usize) -> Self {
    Self {
      num_anchors,
      num_attributes,
      confidence_index,
    }
  }

  /// 输出张量的元素个数，溢出时返回 `None`
  pub fn expected_len(&self) -> Option<usize> {
    self.num_attributes.checked_mul(self.num_anchors)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.num_attributes <= BOX_PLANES {
      return Err(ConfigError::TooFewAttributes(self.num_attributes));
    }
    if self.confidence_index < BOX_PLANES || self.confidence_index >= self.num_attributes {
      return Err(ConfigError::ConfidenceIndex {
        index: self.confidence_index,
        num_attributes: self.num_attributes,
      });
    }
    if self.expected_len().is_none() {
      return Err(ConfigError::TensorTooLarge {
        num_anchors: self.num_anchors,
        num_attributes: self.num_attributes,
      });
    }
    Ok(())
  }
}

pub(crate) fn check_capacity(capacity: f64) -> Result<(), ConfigError> {
  if capacity.is_finite() && capacity > 0.0 {
    Ok(())
  } else {
    Err(ConfigError::Capacity(capacity))
  }
}

fn check_threshold(name: &'static str, value: f32) -> Result<(), ConfigError> {
  // NaN 不在任何区间内
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(ConfigError::Threshold { name, value })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    assert!(PipelineConfig::default().validate().is_ok());
    assert!(AnchorLayout::default().validate().is_ok());
    assert_eq!(AnchorLayout::default().expected_len(), Some(84 * 2100));
  }

  #[test]
  fn thresholds_outside_unit_interval_are_rejected() {
    let err = PipelineConfig::default()
      .with_confidence_threshold(1.5)
      .validate()
      .unwrap_err();
    assert_eq!(
      err,
      ConfigError::Threshold {
        name: "confidence_threshold",
        value: 1.5
      }
    );

    let err = PipelineConfig::default()
      .with_iou_threshold(-0.1)
      .validate()
      .unwrap_err();
    assert!(matches!(
      err,
      ConfigError::Threshold {
        name: "iou_threshold",
        ..
      }
    ));

    assert!(
      PipelineConfig::default()
        .with_iou_threshold(f32::NAN)
        .validate()
        .is_err()
    );
  }

  #[test]
  fn threshold_bounds_are_inclusive() {
    let config = PipelineConfig::default()
      .with_confidence_threshold(0.0)
      .with_iou_threshold(1.0);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn capacity_must_be_positive_and_finite() {
    for capacity in [0.0, -3.0, f64::NAN, f64::INFINITY] {
      let err = PipelineConfig::default()
        .with_capacity(capacity)
        .validate()
        .unwrap_err();
      assert!(matches!(err, ConfigError::Capacity(_)));
    }
  }

  #[test]
  fn layout_rejects_confidence_plane_outside_range() {
    assert_eq!(
      AnchorLayout::new(10, 4, 3).validate(),
      Err(ConfigError::TooFewAttributes(4))
    );
    assert_eq!(
      AnchorLayout::new(10, 7, 2).validate(),
      Err(ConfigError::ConfidenceIndex {
        index: 2,
        num_attributes: 7
      })
    );
    assert_eq!(
      AnchorLayout::new(10, 7, 7).validate(),
      Err(ConfigError::ConfidenceIndex {
        index: 7,
        num_attributes: 7
      })
    );
    assert!(AnchorLayout::new(0, 5, 4).validate().is_ok());
  }

  #[test]
  fn layout_rejects_tensor_size_overflow() {
    let layout = AnchorLayout::new(usize::MAX / 2, 84, 6);
    assert_eq!(layout.expected_len(), None);
    assert_eq!(
      layout.validate(),
      Err(ConfigError::TensorTooLarge {
        num_anchors: usize::MAX / 2,
        num_attributes: 84
      })
    );
    assert_eq!(AnchorLayout::new(usize::MAX / 84, 84, 6).validate(), Ok(()));
  }
}
