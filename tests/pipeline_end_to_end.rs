use otopark::{
  AnchorLayout, ConfigError, OccupancyTier, Pipeline, PipelineConfig, PipelineError,
  model::{BoundingBox, DecodeError, Detection, decode, iou, suppress},
  occupancy::classify,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// 按通道优先布局写入锚点：平面 0..4 为 cx, cy, w, h，`confidence_index` 平面为置信度
struct TensorBuilder {
  layout: AnchorLayout,
  data: Vec<f32>,
}

impl TensorBuilder {
  fn new(layout: AnchorLayout) -> Self {
    Self {
      data: vec![0.0; layout.expected_len().unwrap()],
      layout,
    }
  }

  fn anchor(mut self, idx: usize, corners: (f32, f32, f32, f32), score: f32) -> Self {
    let n = self.layout.num_anchors;
    let (x1, y1, x2, y2) = corners;
    self.data[idx] = (x1 + x2) / 2.0;
    self.data[n + idx] = (y1 + y2) / 2.0;
    self.data[2 * n + idx] = x2 - x1;
    self.data[3 * n + idx] = y2 - y1;
    self.data[self.layout.confidence_index * n + idx] = score;
    self
  }

  fn build(self) -> Vec<f32> {
    self.data
  }
}

#[test]
fn overlapping_pair_reduces_to_single_vehicle() {
  let layout = AnchorLayout::new(8, 7, 6);
  let tensor = TensorBuilder::new(layout)
    .anchor(2, (0.0, 0.0, 10.0, 10.0), 0.9)
    .anchor(5, (1.0, 1.0, 11.0, 11.0), 0.6)
    .build();

  let pipeline = Pipeline::new(PipelineConfig::default(), layout).unwrap();
  let analysis = pipeline.run(&tensor).unwrap();

  assert_eq!(analysis.detections.len(), 1);
  let kept = analysis.detections.items[0];
  assert_eq!(kept.score, 0.9);
  assert_eq!(kept.bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
  assert_eq!(analysis.verdict.detection_count, 1);
  assert_eq!(analysis.verdict.ratio, 5.0);
  assert_eq!(analysis.verdict.tier, OccupancyTier::Available);
}

#[test]
fn nothing_above_threshold_gives_empty_lot() {
  let layout = AnchorLayout::new(4, 5, 4);
  let tensor = TensorBuilder::new(layout)
    .anchor(0, (0.0, 0.0, 10.0, 10.0), 0.45)
    .anchor(1, (20.0, 0.0, 30.0, 10.0), 0.1)
    .build();

  let candidates = decode(&tensor, &layout, 0.45).unwrap();
  assert!(candidates.is_empty());
  assert!(suppress(&candidates, 0.5).is_empty());

  let analysis = Pipeline::new(PipelineConfig::default(), layout)
    .unwrap()
    .run(&tensor)
    .unwrap();
  assert!(analysis.detections.is_empty());
  assert_eq!(analysis.verdict.ratio, 0.0);
  assert_eq!(analysis.verdict.tier, OccupancyTier::Available);
}

#[test]
fn full_lot_of_separate_vehicles() {
  let layout = AnchorLayout::new(2100, 84, 6);
  let mut builder = TensorBuilder::new(layout);
  for i in 0..20 {
    let x = (i % 5) as f32 * 64.0;
    let y = (i / 5) as f32 * 64.0;
    builder = builder.anchor(i * 100, (x, y, x + 40.0, y + 30.0), 0.5 + i as f32 * 0.01);
  }
  let tensor = builder.build();

  let analysis = Pipeline::new(PipelineConfig::default(), layout)
    .unwrap()
    .run(&tensor)
    .unwrap();
  assert_eq!(analysis.verdict.detection_count, 20);
  assert_eq!(analysis.verdict.ratio, 100.0);
  assert_eq!(analysis.verdict.tier, OccupancyTier::Full);
  assert!(
    analysis
      .detections
      .items
      .windows(2)
      .all(|w| w[0].score >= w[1].score)
  );
}

#[test]
fn busy_lot_at_seventeen_vehicles() {
  let layout = AnchorLayout::new(17, 5, 4);
  let mut builder = TensorBuilder::new(layout);
  for i in 0..17 {
    let x = i as f32 * 50.0;
    builder = builder.anchor(i, (x, 0.0, x + 20.0, 20.0), 0.8);
  }

  let analysis = Pipeline::new(PipelineConfig::default(), layout)
    .unwrap()
    .run(&builder.build())
    .unwrap();
  assert_eq!(analysis.verdict.ratio, 85.0);
  assert_eq!(analysis.verdict.tier, OccupancyTier::Busy);
}

#[test]
fn invalid_configuration_and_shape_are_typed_errors() {
  let err = Pipeline::new(
    PipelineConfig::default().with_capacity(-1.0),
    AnchorLayout::default(),
  )
  .unwrap_err();
  assert_eq!(err, ConfigError::Capacity(-1.0));

  let err = Pipeline::new(
    PipelineConfig::default().with_confidence_threshold(2.0),
    AnchorLayout::default(),
  )
  .unwrap_err();
  assert!(matches!(err, ConfigError::Threshold { .. }));

  let pipeline = Pipeline::new(PipelineConfig::default(), AnchorLayout::default()).unwrap();
  let err = pipeline.run(&[0.0; 100]).unwrap_err();
  assert_eq!(
    err,
    PipelineError::Decode(DecodeError::InputShape {
      expected: 84 * 2100,
      actual: 100
    })
  );

  assert!(classify(1, 0.0).is_err());

  let err = Pipeline::new(
    PipelineConfig::default(),
    AnchorLayout::new(usize::MAX / 2, 84, 6),
  )
  .unwrap_err();
  assert!(matches!(err, ConfigError::TensorTooLarge { .. }));
}

#[test]
fn malformed_layout_passed_to_decoder_is_rejected() {
  let err = decode(&[0.0; 10], &AnchorLayout::new(2, 5, 7), 0.45).unwrap_err();
  assert!(matches!(
    err,
    DecodeError::Layout(ConfigError::ConfidenceIndex { .. })
  ));
}

#[test]
fn decoder_keeps_exactly_the_anchors_above_threshold() {
  let mut rng = StdRng::seed_from_u64(2026);
  let layout = AnchorLayout::new(300, 6, 5);
  let threshold = 0.45;

  let mut builder = TensorBuilder::new(layout);
  let mut scores = Vec::new();
  for i in 0..layout.num_anchors {
    // 部分锚点恰好落在阈值上
    let score = if i % 10 == 0 {
      threshold
    } else {
      rng.random_range(0.0..1.0f32)
    };
    scores.push(score);
    builder = builder.anchor(i, (0.0, 0.0, 4.0, 4.0), score);
  }

  let candidates = decode(&builder.build(), &layout, threshold).unwrap();
  let expected: Vec<f32> = scores.into_iter().filter(|&s| s > threshold).collect();
  let actual: Vec<f32> = candidates.iter().map(|d| d.score).collect();
  assert_eq!(actual, expected);
}

#[test]
fn suppressed_output_has_no_pair_above_threshold() {
  let mut rng = StdRng::seed_from_u64(99);
  let candidates: Vec<Detection> = (0..120)
    .map(|_| {
      let x = rng.random_range(0.0..200.0f32);
      let y = rng.random_range(0.0..200.0f32);
      let w = rng.random_range(5.0..40.0f32);
      let h = rng.random_range(5.0..40.0f32);
      Detection::new(
        BoundingBox::new(x, y, x + w, y + h),
        rng.random_range(0.0..1.0f32),
      )
    })
    .collect();

  for threshold in [0.2f32, 0.5, 0.7] {
    let kept = suppress(&candidates, threshold);
    assert!(kept.len() <= candidates.len());
    for (i, a) in kept.iter().enumerate() {
      for b in &kept[i + 1..] {
        assert!(iou(&a.bbox, &b.bbox) <= threshold);
      }
    }
    assert_eq!(suppress(&kept, threshold), kept);
  }
}
