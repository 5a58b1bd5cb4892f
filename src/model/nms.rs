// 该文件是 Otopark （停车场占用估计） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use crate::model::{BoundingBox, Detection};

/// 计算两个边界框的 IoU
///
/// 并集面积为 0 时返回 0，两个退化框永远不会互相抑制。
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
  let x1 = a.x1.max(b.x1);
  let y1 = a.y1.max(b.y1);
  let x2 = a.x2.min(b.x2);
  let y2 = a.y2.min(b.y2);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let union = a.area() + b.area() - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

/// 贪心非极大值抑制
///
/// 按置信度降序稳定排序（同分时保持输入顺序），每轮取出最高分的框，
/// 并丢弃与其 IoU 严格大于 `threshold` 的剩余框。
/// 返回结果同样按置信度降序排列。
pub fn suppress(candidates: &[Detection], threshold: f32) -> Vec<Detection> {
  if candidates.is_empty() {
    return Vec::new();
  }

  let mut remaining = candidates.to_vec();
  remaining.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut kept = Vec::new();
  while let Some((&best, rest)) = remaining.split_first() {
    // 每轮重建剩余集合，不在遍历中原地删除
    let survivors: Vec<Detection> = rest
      .iter()
      .filter(|det| !(iou(&best.bbox, &det.bbox) > threshold))
      .copied()
      .collect();
    kept.push(best);
    remaining = survivors;
  }

  kept
}
