// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/report.rs - 性能报告
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

use std::{
  fmt,
  time::{Duration, Instant},
};

/// 单个阶段的耗时
#[derive(Debug, Clone, PartialEq)]
pub struct StageTime {
  pub name: String,
  pub elapsed: Duration,
}

/// 按顺序记录各阶段耗时
#[derive(Debug)]
pub struct StageTimer {
  started: Instant,
  stage_started: Instant,
  stages: Vec<StageTime>,
}

impl Default for StageTimer {
  fn default() -> Self {
    Self::new()
  }
}

impl StageTimer {
  pub fn new() -> Self {
    let now = Instant::now();
    Self {
      started: now,
      stage_started: now,
      stages: Vec::new(),
    }
  }

  /// 结束当前阶段并开始下一个阶段
  pub fn lap(&mut self, name: impl Into<String>) -> Duration {
    let now = Instant::now();
    let elapsed = now - self.stage_started;
    self.stages.push(StageTime {
      name: name.into(),
      elapsed,
    });
    self.stage_started = now;
    elapsed
  }

  /// 在计时器内执行一个阶段
  pub fn stage<T>(&mut self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
    self.stage_started = Instant::now();
    let value = f();
    self.lap(name);
    value
  }

  pub fn stages(&self) -> &[StageTime] {
    &self.stages
  }

  pub fn total(&self) -> Duration {
    self.started.elapsed()
  }
}

/// 进程内存快照（单位 MB）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemorySnapshot {
  pub rss: f64,
  pub peak_rss: f64,
}

impl MemorySnapshot {
  /// 读取 `/proc/self/status`，其他平台返回 `None`
  pub fn capture() -> Option<Self> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    Self::parse_status(&status)
  }

  pub fn parse_status(status: &str) -> Option<Self> {
    let field = |key: &str| -> Option<f64> {
      let line = status.lines().find(|line| line.starts_with(key))?;
      let kb: f64 = line[key.len()..].split_whitespace().next()?.parse().ok()?;
      Some(kb / 1024.0)
    };

    Some(Self {
      rss: field("VmRSS:")?,
      peak_rss: field("VmHWM:")?,
    })
  }
}

#[derive(Debug, Clone)]
pub struct PerformanceReport {
  pub stages: Vec<StageTime>,
  pub total: Duration,
  pub memory_start: Option<MemorySnapshot>,
  pub memory_end: Option<MemorySnapshot>,
}

impl PerformanceReport {
  pub fn from_timer(
    timer: &StageTimer,
    memory_start: Option<MemorySnapshot>,
    memory_end: Option<MemorySnapshot>,
  ) -> Self {
    Self {
      stages: timer.stages().to_vec(),
      total: timer.total(),
      memory_start,
      memory_end,
    }
  }
}

fn millis(d: Duration) -> f64 {
  d.as_secs_f64() * 1000.0
}

impl fmt::Display for PerformanceReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "============= 性能报告 =============")?;
    for stage in &self.stages {
      writeln!(f, "{:<16}: {:.2} ms", stage.name, millis(stage.elapsed))?;
    }
    writeln!(f, "{:<16}: {:.2} ms", "总耗时", millis(self.total))?;
    writeln!(f, "------------------------------------")?;
    match (self.memory_start, self.memory_end) {
      (Some(start), Some(end)) => {
        writeln!(f, "{:<16}: {:.2} -> {:.2} MB", "RSS", start.rss, end.rss)?;
        writeln!(
          f,
          "{:<16}: {:.2} -> {:.2} MB",
          "Peak RSS", start.peak_rss, end.peak_rss
        )?;
      }
      _ => writeln!(f, "内存信息不可用")?,
    }
    write!(f, "====================================")
  }
}
