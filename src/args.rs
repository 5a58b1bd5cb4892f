// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use otopark::config::{
  AnchorLayout, DEFAULT_CAPACITY, DEFAULT_CONFIDENCE_INDEX, DEFAULT_CONFIDENCE_THRESHOLD,
  DEFAULT_IOU_THRESHOLD, DEFAULT_NUM_ANCHORS, DEFAULT_NUM_ATTRIBUTES, PipelineConfig,
};

/// Otopark 停车场占用估计
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型输出来源，例如 tensor:///path/to/output0.bin
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像，例如 image:///path/to/parking.jpg
  /// 仅回放张量时可省略
  #[arg(long, value_name = "SOURCE", default_value = "blank:")]
  pub input: Url,

  /// 输出方式: console: / console:?boxes / json:///path/to/result.json
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou: f32,

  /// 停车场容量
  #[arg(long, default_value_t = DEFAULT_CAPACITY, value_name = "SPACES")]
  pub capacity: f64,

  /// 锚点数量
  #[arg(long, default_value_t = DEFAULT_NUM_ANCHORS, value_name = "COUNT")]
  pub num_anchors: usize,

  /// 每个锚点的属性数量 (4 + 类别数)
  #[arg(long, default_value_t = DEFAULT_NUM_ATTRIBUTES, value_name = "COUNT")]
  pub num_attributes: usize,

  /// 目标类别置信度所在的平面索引
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_INDEX, value_name = "INDEX")]
  pub confidence_index: usize,
}

impl Args {
  pub fn pipeline_config(&self) -> PipelineConfig {
    PipelineConfig::default()
      .with_confidence_threshold(self.confidence)
      .with_iou_threshold(self.iou)
      .with_capacity(self.capacity)
  }

  pub fn anchor_layout(&self) -> AnchorLayout {
    AnchorLayout::new(self.num_anchors, self.num_attributes, self.confidence_index)
  }
}
