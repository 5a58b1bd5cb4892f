// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 后处理基准测试
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

#[path = "../args.rs"]
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
  task::{RepeatShotTask, Task},
};

const INPUT_SIZE: u32 = 320;

/// Otopark 基准测试参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct BenchArgs {
  #[command(flatten)]
  pub common: args::Args,

  /// 重复次数
  #[arg(long, default_value_t = RepeatShotTask::DEFAULT_REPEAT, value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = BenchArgs::parse();

  info!("模型输出来源: {}", args.common.model);
  info!("输入来源: {}", args.common.input);
  info!("重复次数: {}", args.repeat);

  let pipeline = Pipeline::new(args.common.pipeline_config(), args.common.anchor_layout())?;
  let model =
    RawTensorModel::<TensorFrame<INPUT_SIZE, INPUT_SIZE>>::from_url(&args.common.model)?;
  let input = InputWrapper::<INPUT_SIZE, INPUT_SIZE>::from_url(&args.common.input)?;
  let output = OutputWrapper::from_url(&args.common.output)?;

  RepeatShotTask::new(pipeline)
    .with_repeat(args.repeat)
    .run_task(input.into_nchw(), model, output)?;

  Ok(())
}
