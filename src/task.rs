// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/task.rs - 任务执行
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

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{
  model::Model,
  output::Render,
  pipeline::{ParkingAnalysis, Pipeline},
  report::{MemorySnapshot, PerformanceReport, StageTimer},
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 单张图像：逐阶段计时并输出性能报告
pub struct OneShotTask {
  pipeline: Pipeline,
  timer: StageTimer,
  memory_start: Option<MemorySnapshot>,
}

impl OneShotTask {
  pub fn new(pipeline: Pipeline) -> Self {
    Self {
      pipeline,
      timer: StageTimer::new(),
      memory_start: MemorySnapshot::capture(),
    }
  }

  /// 沿用调用方已开始的计时（例如包含模型加载阶段）
  pub fn with_timer(mut self, timer: StageTimer, memory_start: Option<MemorySnapshot>) -> Self {
    self.timer = timer;
    self.memory_start = memory_start;
    self
  }
}

impl<
  F,
  T: AsRef<[f32]>,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = T, Error = ME>,
  O: Render<ParkingAnalysis, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Output = (ParkingAnalysis, PerformanceReport);
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    let OneShotTask {
      pipeline,
      mut timer,
      memory_start,
    } = self;

    info!("开始任务...");
    let frame = timer
      .stage("预处理", || input.next())
      .ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");

    let tensor = timer.stage("模型推理", || model.infer(&frame))?;
    let candidates = timer.stage("框提取", || pipeline.decode(tensor.as_ref()))?;
    info!("置信度过滤后剩余 {} 个候选框", candidates.len());

    let analysis = timer.stage("NMS", || {
      let detections = pipeline.suppress(candidates);
      let verdict = pipeline.classify(&detections);
      ParkingAnalysis {
        detections,
        verdict,
      }
    });
    info!(
      "检测到 {} 辆车, 占用率 {:.1}%, 状态 {}",
      analysis.verdict.detection_count, analysis.verdict.ratio, analysis.verdict.tier
    );

    let report = PerformanceReport::from_timer(&timer, memory_start, MemorySnapshot::capture());
    output.render_result(&analysis)?;
    info!("性能报告:\n{}", report);

    Ok((analysis, report))
  }
}

/// 基准测试：对同一帧重复推理与后处理
pub struct RepeatShotTask {
  pipeline: Pipeline,
  repeat: usize,
}

impl RepeatShotTask {
  pub const DEFAULT_REPEAT: usize = 1000;

  pub fn new(pipeline: Pipeline) -> Self {
    Self {
      pipeline,
      repeat: Self::DEFAULT_REPEAT,
    }
  }

  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat;
    self
  }
}

impl<
  F,
  T: AsRef<[f32]>,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = T, Error = ME>,
  O: Render<ParkingAnalysis, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  /// 平均单次耗时（跳过前两次预热）
  type Output = Duration;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    if self.repeat == 0 {
      anyhow::bail!("重复次数必须大于 0");
    }

    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");

    let mut times = Vec::with_capacity(self.repeat);
    let mut last = None;
    for i in 0..self.repeat {
      let now = Instant::now();
      let tensor = model.infer(&frame)?;
      let analysis = self.pipeline.run(tensor.as_ref())?;
      let elapsed = now.elapsed();
      info!("({})推理与后处理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(analysis);
    }

    if let Some(analysis) = last {
      output.render_result(&analysis)?;
    }

    let warm = if times.len() > 2 { &times[2..] } else { &times[..] };
    let average = warm.iter().sum::<Duration>() / warm.len() as u32;
    warn!("平均耗时: {:.2?}", average);

    Ok(average)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible};

  use super::*;
  use crate::{
    config::{AnchorLayout, PipelineConfig},
    model::RawTensorModel,
    occupancy::OccupancyTier,
  };

  #[derive(Default)]
  struct Collect {
    results: RefCell<Vec<ParkingAnalysis>>,
  }

  impl Render<ParkingAnalysis> for &Collect {
    type Error = Infallible;

    fn render_result(&self, result: &ParkingAnalysis) -> Result<(), Self::Error> {
      self.results.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  // 两个重叠框 + 一个低分框，5 个平面
  fn tensor() -> Vec<f32> {
    vec![
      5.0, 6.0, 50.0, // cx
      5.0, 6.0, 50.0, // cy
      10.0, 10.0, 10.0, // w
      10.0, 10.0, 10.0, // h
      0.9, 0.6, 0.3, // score
    ]
  }

  fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default(), AnchorLayout::new(3, 5, 4)).unwrap()
  }

  #[test]
  fn one_shot_renders_analysis_and_reports_stages() {
    let sink = Collect::default();
    let model = RawTensorModel::<()>::from_output(tensor());
    let (analysis, report) = OneShotTask::new(pipeline())
      .run_task(std::iter::once(()), model, &sink)
      .unwrap();

    assert_eq!(analysis.detections.len(), 1);
    assert_eq!(analysis.detections.items[0].score, 0.9);
    assert_eq!(analysis.verdict.ratio, 5.0);
    assert_eq!(analysis.verdict.tier, OccupancyTier::Available);
    assert_eq!(sink.results.borrow().as_slice(), &[analysis]);

    let names: Vec<&str> = report.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["预处理", "模型推理", "框提取", "NMS"]);
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let sink = Collect::default();
    let model = RawTensorModel::<()>::from_output(tensor());
    let err = OneShotTask::new(pipeline())
      .run_task(std::iter::empty(), model, &sink)
      .unwrap_err();
    assert!(err.to_string().contains("没有输入帧"));
    assert!(sink.results.borrow().is_empty());
  }

  #[test]
  fn one_shot_surfaces_shape_errors() {
    let sink = Collect::default();
    let model = RawTensorModel::<()>::from_output(vec![0.0; 7]);
    let err = OneShotTask::new(pipeline())
      .run_task(std::iter::once(()), model, &sink)
      .unwrap_err();
    assert!(err.to_string().contains("期望 15, 实际 7"));
  }

  #[test]
  fn repeat_shot_renders_last_result_once() {
    let sink = Collect::default();
    let model = RawTensorModel::<()>::from_output(tensor());
    RepeatShotTask::new(pipeline())
      .with_repeat(5)
      .run_task(std::iter::once(()), model, &sink)
      .unwrap();
    assert_eq!(sink.results.borrow().len(), 1);
  }

  #[test]
  fn repeat_shot_rejects_zero_repeat() {
    let sink = Collect::default();
    let model = RawTensorModel::<()>::from_output(tensor());
    assert!(
      RepeatShotTask::new(pipeline())
        .with_repeat(0)
        .run_task(std::iter::once(()), model, &sink)
        .is_err()
    );
  }
}
