// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/pipeline.rs - 解码、抑制与分级流水线
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
  config::{AnchorLayout, ConfigError, PipelineConfig},
  model::{DecodeError, DetectResult, Detection, decode, suppress},
  occupancy::{OccupancyVerdict, verdict},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("输入错误: {0}")]
  Decode(#[from] DecodeError),
}

/// 单张图像的分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingAnalysis {
  pub detections: DetectResult,
  pub verdict: OccupancyVerdict,
}

/// 无状态的后处理流水线
///
/// 构造时校验配置，之后每次调用互不影响，可在多个线程中共享。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipeline {
  config: PipelineConfig,
  layout: AnchorLayout,
}

impl Pipeline {
  pub fn new(config: PipelineConfig, layout: AnchorLayout) -> Result<Self, ConfigError> {
    config.validate()?;
    layout.validate()?;
    Ok(Self { config, layout })
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn layout(&self) -> &AnchorLayout {
    &self.layout
  }

  pub fn decode(&self, buffer: &[f32]) -> Result<Vec<Detection>, DecodeError> {
    decode(buffer, &self.layout, self.config.confidence_threshold)
  }

  pub fn suppress(&self, candidates: Vec<Detection>) -> DetectResult {
    suppress(&candidates, self.config.iou_threshold).into()
  }

  pub fn classify(&self, detections: &DetectResult) -> OccupancyVerdict {
    // 容量已在构造时校验
    verdict(detections.len(), self.config.capacity)
  }

  pub fn run(&self, buffer: &[f32]) -> Result<ParkingAnalysis, PipelineError> {
    let candidates = self.decode(buffer)?;
    let detections = self.suppress(candidates);
    let verdict = self.classify(&detections);
    Ok(ParkingAnalysis {
      detections,
      verdict,
    })
  }
}
