// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/occupancy.rs - 占用率分级
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

use crate::config::{ConfigError, check_capacity};

const FULL_RATIO: f64 = 100.0;
const BUSY_RATIO: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccupancyTier {
  Available,
  Busy,
  Full,
}

impl OccupancyTier {
  pub fn from_ratio(ratio: f64) -> Self {
    if ratio >= FULL_RATIO {
      OccupancyTier::Full
    } else if ratio > BUSY_RATIO {
      OccupancyTier::Busy
    } else {
      OccupancyTier::Available
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      OccupancyTier::Available => "AVAILABLE",
      OccupancyTier::Busy => "BUSY",
      OccupancyTier::Full => "FULL",
    }
  }
}

impl std::fmt::Display for OccupancyTier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyVerdict {
  pub detection_count: usize,
  /// 占用百分比，可超过 100
  pub ratio: f64,
  pub tier: OccupancyTier,
}

/// 根据检测数量与容量计算占用率
pub fn classify(count: usize, capacity: f64) -> Result<OccupancyVerdict, ConfigError> {
  check_capacity(capacity)?;
  Ok(verdict(count, capacity))
}

/// 调用方须保证 `capacity` 已通过校验
pub(crate) fn verdict(count: usize, capacity: f64) -> OccupancyVerdict {
  let ratio = (count as f64 / capacity) * 100.0;
  OccupancyVerdict {
    detection_count: count,
    ratio,
    tier: OccupancyTier::from_ratio(ratio),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tier_boundaries() {
    let full = classify(20, 20.0).unwrap();
    assert_eq!(full.ratio, 100.0);
    assert_eq!(full.tier, OccupancyTier::Full);

    let busy = classify(17, 20.0).unwrap();
    assert_eq!(busy.ratio, 85.0);
    assert_eq!(busy.tier, OccupancyTier::Busy);

    let edge = classify(16, 20.0).unwrap();
    assert_eq!(edge.ratio, 80.0);
    assert_eq!(edge.tier, OccupancyTier::Available);

    let empty = classify(0, 20.0).unwrap();
    assert_eq!(empty.ratio, 0.0);
    assert_eq!(empty.tier, OccupancyTier::Available);
    assert_eq!(empty.detection_count, 0);
  }

  #[test]
  fn over_capacity_is_still_full() {
    let verdict = classify(25, 20.0).unwrap();
    assert_eq!(verdict.ratio, 125.0);
    assert_eq!(verdict.tier, OccupancyTier::Full);
  }

  #[test]
  fn empty_lot_is_available_for_any_capacity() {
    for capacity in [0.5, 1.0, 20.0, 1e6] {
      let verdict = classify(0, capacity).unwrap();
      assert_eq!(verdict.ratio, 0.0);
      assert_eq!(verdict.tier, OccupancyTier::Available);
    }
  }

  #[test]
  fn non_positive_capacity_is_a_configuration_error() {
    assert_eq!(classify(3, 0.0), Err(ConfigError::Capacity(0.0)));
    assert_eq!(classify(3, -5.0), Err(ConfigError::Capacity(-5.0)));
  }

  #[test]
  fn tier_labels() {
    assert_eq!(OccupancyTier::Available.to_string(), "AVAILABLE");
    assert_eq!(OccupancyTier::Busy.to_string(), "BUSY");
    assert_eq!(OccupancyTier::Full.to_string(), "FULL");
  }
}
