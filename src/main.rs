// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use otopark::{
  FromUrl, Pipeline,
  frame::TensorFrame,
  input::InputWrapper,
  model::RawTensorModel,
  output::OutputWrapper,
  report::{MemorySnapshot, StageTimer},
  task::{OneShotTask, Task},
};

const INPUT_SIZE: u32 = 320;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型输出来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出方式: {}", args.output);

  let pipeline = Pipeline::new(args.pipeline_config(), args.anchor_layout())?;
  let config = pipeline.config();
  let layout = pipeline.layout();
  info!("置信度阈值: {}", config.confidence_threshold);
  info!("NMS 阈值: {}", config.iou_threshold);
  info!("停车场容量: {}", config.capacity);
  info!(
    "输出布局: {} 个平面 x {} 个锚点, 置信度平面 {}",
    layout.num_attributes, layout.num_anchors, layout.confidence_index
  );

  let memory_start = MemorySnapshot::capture();
  let mut timer = StageTimer::new();

  let model = timer.stage("模型加载", || {
    RawTensorModel::<TensorFrame<INPUT_SIZE, INPUT_SIZE>>::from_url(&args.model)
  })?;
  let input = timer.stage("图像读取", || {
    InputWrapper::<INPUT_SIZE, INPUT_SIZE>::from_url(&args.input)
  })?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask::new(pipeline)
    .with_timer(timer, memory_start)
    .run_task(input.into_nchw(), model, output)?;

  Ok(())
}
