// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/output/json_file.rs - JSON 文件记录输出
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

use std::path::PathBuf;

use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, pipeline::ParkingAnalysis};

#[derive(Error, Debug)]
pub enum JsonFileOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
}

/// 将分析结果写为 JSON 记录
pub struct JsonFileOutput {
  path: PathBuf,
  pretty: bool,
}

impl FromUrlWithScheme for JsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonFileOutput {
  type Error = JsonFileOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonFileOutputError::SchemeMismatch(uri.scheme().to_string()));
    }

    let pretty = uri.query_pairs().any(|(k, _)| k == "pretty");

    Ok(JsonFileOutput {
      path: PathBuf::from(uri.path()),
      pretty,
    })
  }
}

pub fn to_record(result: &ParkingAnalysis) -> Value {
  let detections: Vec<Value> = result
    .detections
    .iter()
    .map(|item| {
      json!({
        "score": item.score,
        "bbox": item.bbox.to_array(),
      })
    })
    .collect();

  json!({
    "timestamp": Utc::now().to_rfc3339(),
    "detection_count": result.verdict.detection_count,
    "ratio": result.verdict.ratio,
    "tier": result.verdict.tier.as_str(),
    "detections": detections,
  })
}

impl Render<ParkingAnalysis> for JsonFileOutput {
  type Error = JsonFileOutputError;

  fn render_result(&self, result: &ParkingAnalysis) -> Result<(), Self::Error> {
    let record = to_record(result);
    let text = if self.pretty {
      serde_json::to_string_pretty(&record)?
    } else {
      serde_json::to_string(&record)?
    };

    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, text)?;
    info!("分析结果已写入: {}", self.path.display());
    Ok(())
  }
}
