// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/output/console.rs - 控制台输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  occupancy::OccupancyTier,
  output::Render,
  pipeline::ParkingAnalysis,
};

const RULE: &str = "========================================";

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 将分析结果打印到标准输出
///
/// `console:?boxes` 会额外逐行打印每个检测框。
#[derive(Debug, Default)]
pub struct ConsoleOutput {
  show_boxes: bool,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(url.scheme().to_string()));
    }

    let show_boxes = url.query_pairs().any(|(k, _)| k == "boxes");
    Ok(ConsoleOutput { show_boxes })
  }
}

fn tier_line(tier: OccupancyTier) -> &'static str {
  match tier {
    OccupancyTier::Full => "🔴 状态: 已满",
    OccupancyTier::Busy => "🟠 状态: 繁忙",
    OccupancyTier::Available => "🟢 状态: 空闲",
  }
}

impl ConsoleOutput {
  pub fn summary(&self, result: &ParkingAnalysis) -> String {
    let verdict = &result.verdict;
    let mut lines = vec![
      RULE.to_string(),
      "📸 分析完成".to_string(),
      format!("🚗 检测到的车辆: {}", verdict.detection_count),
      format!("🅿️  占用率:       {:.1}%", verdict.ratio),
      tier_line(verdict.tier).to_string(),
    ];

    if self.show_boxes {
      for (i, item) in result.detections.iter().enumerate() {
        let b = &item.bbox;
        lines.push(format!(
          "  - #{}: {:.2}% at ({:.1}, {:.1}) - ({:.1}, {:.1})",
          i,
          item.score * 100.0,
          b.x1,
          b.y1,
          b.x2,
          b.y2
        ));
      }
    }

    lines.push(RULE.to_string());
    lines.join("\n")
  }
}

impl Render<ParkingAnalysis> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, result: &ParkingAnalysis) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", self.summary(result))?;
    Ok(())
  }
}
