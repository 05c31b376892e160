use crate::config::ScoringConfig;
use crate::error::FrameError;
use crate::pose::{Landmark, LandmarkFrame};

use super::result::{AssessmentContext, AssessmentResult};
use super::segment::{score_segment, Segment, SegmentRule};

/// 1 フレーム + 条件から REBA 風スコアを出す。状態を持たない
#[derive(Debug, Clone, Default)]
pub struct Assessor {
    config: ScoringConfig,
}

impl Assessor {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// 採点順（首・背中・腕・脚）に並べた部位ルール
    fn body_rules(&self) -> [(Segment, &SegmentRule); 4] {
        [
            (Segment::Neck, &self.config.neck),
            (Segment::Back, &self.config.back),
            (Segment::Arm, &self.config.arm),
            (Segment::Leg, &self.config.leg),
        ]
    }

    pub fn evaluate(&self, frame: &LandmarkFrame, context: &AssessmentContext) -> AssessmentResult {
        let mut segments = Vec::with_capacity(6);

        for (segment, rule) in self.body_rules() {
            if let Some(score) = score_segment(
                segment,
                rule,
                frame,
                self.config.side,
                self.config.min_visibility,
            ) {
                segments.push(score);
            }
        }

        if let Some(load) = self.config.load.score(context.object_weight_kg) {
            segments.push(load);
        }
        segments.push(self.config.activity.score(context.activity));

        // 設定次第で点数は大きくなりうるので飽和加算
        let total_score = segments
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.points));
        let risk_level = self.config.risk.classify(total_score);

        tracing::debug!(
            total_score,
            risk = %risk_level,
            segments = segments.len(),
            "posture evaluated"
        );

        AssessmentResult {
            total_score,
            risk_level,
            segments,
            overall_advice: risk_level.advice().to_string(),
        }
    }

    /// 生のスロット列を検証してから評価する
    pub fn evaluate_slots(
        &self,
        slots: &[Option<Landmark>],
        context: &AssessmentContext,
    ) -> Result<AssessmentResult, FrameError> {
        let frame = LandmarkFrame::from_slots(slots.to_vec())?;
        Ok(self.evaluate(&frame, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkIndex;
    use crate::reba::{ActivityType, BodySide, RiskLevel};

    /// vertex→toward 方向を deg 度回転させ、長さ len の位置を返す
    fn rotate_from(vertex: (f32, f32), toward: (f32, f32), deg: f32, len: f32) -> (f32, f32) {
        let dx = toward.0 - vertex.0;
        let dy = toward.1 - vertex.1;
        let norm = (dx * dx + dy * dy).sqrt();
        let (ux, uy) = (dx / norm, dy / norm);
        let (s, c) = deg.to_radians().sin_cos();
        (
            vertex.0 + len * (ux * c - uy * s),
            vertex.1 + len * (ux * s + uy * c),
        )
    }

    struct Angles {
        neck: f32,
        back: f32,
        arm: f32,
        leg: f32,
    }

    fn posed_frame(angles: &Angles, side: BodySide) -> LandmarkFrame {
        use LandmarkIndex::*;
        let (shoulder_i, other_i, elbow_i, wrist_i, hip_i, knee_i, ankle_i) = match side {
            BodySide::Left => (LeftShoulder, RightShoulder, LeftElbow, LeftWrist, LeftHip, LeftKnee, LeftAnkle),
            BodySide::Right => (RightShoulder, LeftShoulder, RightElbow, RightWrist, RightHip, RightKnee, RightAnkle),
        };

        let shoulder = (0.45, 0.30);
        let other_shoulder = (0.60, 0.30);
        let nose = rotate_from(shoulder, other_shoulder, angles.neck, 0.12);
        let hip = (0.45, 0.60);
        let knee = rotate_from(hip, shoulder, angles.back, 0.18);
        let ankle = rotate_from(knee, hip, angles.leg, 0.18);
        let elbow = rotate_from(shoulder, hip, 30.0, 0.14);
        let wrist = rotate_from(elbow, shoulder, angles.arm, 0.12);

        let mut frame = LandmarkFrame::empty();
        for (idx, (x, y)) in [
            (Nose, nose),
            (shoulder_i, shoulder),
            (other_i, other_shoulder),
            (hip_i, hip),
            (knee_i, knee),
            (ankle_i, ankle),
            (elbow_i, elbow),
            (wrist_i, wrist),
        ] {
            frame.set(idx, Landmark::with_visibility(x, y, 0.9));
        }
        frame
    }

    fn neutral() -> Angles {
        Angles { neck: 90.0, back: 175.0, arm: 90.0, leg: 175.0 }
    }

    fn points_of(result: &AssessmentResult, segment: Segment) -> Option<u32> {
        result.segment(segment).map(|s| s.points)
    }

    #[test]
    fn test_posed_frame_produces_requested_angles() {
        let assessor = Assessor::default();
        let angles = Angles { neck: 50.0, back: 150.0, arm: 100.0, leg: 120.0 };
        let result = assessor.evaluate(&posed_frame(&angles, BodySide::Left), &AssessmentContext::default());
        let angle = |seg| result.segment(seg).and_then(|s| s.angle_deg).unwrap();
        assert!((angle(Segment::Neck) - 50.0).abs() < 0.01);
        assert!((angle(Segment::Back) - 150.0).abs() < 0.01);
        assert!((angle(Segment::Arm) - 100.0).abs() < 0.01);
        assert!((angle(Segment::Leg) - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_upright_posture_is_low_risk() {
        // neck 170 は >140 なので 2 点、back は最低 1 点
        let assessor = Assessor::default();
        let angles = Angles { neck: 170.0, back: 175.0, arm: 90.0, leg: 170.0 };
        let result = assessor.evaluate(&posed_frame(&angles, BodySide::Left), &AssessmentContext::default());

        assert_eq!(points_of(&result, Segment::Neck), Some(2));
        assert_eq!(points_of(&result, Segment::Back), Some(1));
        assert_eq!(points_of(&result, Segment::Arm), Some(0));
        assert_eq!(points_of(&result, Segment::Leg), Some(0));
        assert_eq!(points_of(&result, Segment::Load), None);
        assert_eq!(points_of(&result, Segment::Activity), Some(0));
        assert_eq!(result.total_score, 3);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.overall_advice, "posture is good, maintain it");
    }

    #[test]
    fn test_heavy_lifting_posture_is_very_high() {
        let assessor = Assessor::default();
        let angles = Angles { neck: 30.0, back: 130.0, arm: 50.0, leg: 140.0 };
        let ctx = AssessmentContext::new(12.0, ActivityType::Lifting);
        let result = assessor.evaluate(&posed_frame(&angles, BodySide::Left), &ctx);

        assert_eq!(points_of(&result, Segment::Neck), Some(2));
        assert_eq!(points_of(&result, Segment::Back), Some(3));
        assert_eq!(points_of(&result, Segment::Arm), Some(2));
        assert_eq!(points_of(&result, Segment::Leg), Some(2));
        assert_eq!(points_of(&result, Segment::Load), Some(3));
        assert_eq!(points_of(&result, Segment::Activity), Some(1));
        assert_eq!(result.total_score, 13);
        assert_eq!(result.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_segment_order() {
        let assessor = Assessor::default();
        let ctx = AssessmentContext::new(3.0, ActivityType::Bending);
        let result = assessor.evaluate(&posed_frame(&neutral(), BodySide::Left), &ctx);
        let order: Vec<Segment> = result.segments.iter().map(|s| s.segment).collect();
        assert_eq!(
            order,
            vec![
                Segment::Neck,
                Segment::Back,
                Segment::Arm,
                Segment::Leg,
                Segment::Load,
                Segment::Activity
            ]
        );
    }

    #[test]
    fn test_only_neck_and_back_present() {
        let assessor = Assessor::default();
        let mut frame = posed_frame(&Angles { neck: 50.0, back: 150.0, arm: 50.0, leg: 140.0 }, BodySide::Left);
        frame.clear(LandmarkIndex::LeftElbow);
        frame.clear(LandmarkIndex::LeftWrist);
        frame.clear(LandmarkIndex::LeftAnkle);

        let ctx = AssessmentContext::new(3.0, ActivityType::None);
        let result = assessor.evaluate(&frame, &ctx);
        let order: Vec<Segment> = result.segments.iter().map(|s| s.segment).collect();
        assert_eq!(order, vec![Segment::Neck, Segment::Back, Segment::Load, Segment::Activity]);
        // neck 1 + back 2 + load 1
        assert_eq!(result.total_score, 4);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_missing_landmark_removes_only_that_segment() {
        let assessor = Assessor::default();
        let angles = Angles { neck: 30.0, back: 130.0, arm: 50.0, leg: 140.0 };
        let ctx = AssessmentContext::new(7.0, ActivityType::Bending);
        let full_frame = posed_frame(&angles, BodySide::Left);
        let full = assessor.evaluate(&full_frame, &ctx);

        let mut frame = full_frame.clone();
        frame.clear(LandmarkIndex::LeftWrist);
        let partial = assessor.evaluate(&frame, &ctx);

        assert!(partial.segment(Segment::Arm).is_none());
        assert_eq!(partial.total_score, full.total_score - 2);
        for seg in [Segment::Neck, Segment::Back, Segment::Leg, Segment::Load, Segment::Activity] {
            assert_eq!(partial.segment(seg), full.segment(seg), "{} changed", seg);
        }
    }

    #[test]
    fn test_low_visibility_landmark_is_skipped() {
        let assessor = Assessor::default();
        let mut frame = posed_frame(&neutral(), BodySide::Left);
        let knee = *frame.get(LandmarkIndex::LeftKnee).unwrap();
        frame.set(LandmarkIndex::LeftKnee, Landmark { visibility: Some(0.1), ..knee });
        let result = assessor.evaluate(&frame, &AssessmentContext::default());
        // 膝は back と leg の両方で使う
        assert!(result.segment(Segment::Back).is_none());
        assert!(result.segment(Segment::Leg).is_none());
        assert!(result.segment(Segment::Neck).is_some());
    }

    #[test]
    fn test_empty_frame_scores_context_only() {
        let assessor = Assessor::default();
        let ctx = AssessmentContext::new(20.0, ActivityType::Lifting);
        let result = assessor.evaluate(&LandmarkFrame::empty(), &ctx);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.total_score, 4);
    }

    #[test]
    fn test_deterministic() {
        let assessor = Assessor::default();
        let frame = posed_frame(&Angles { neck: 47.0, back: 152.0, arm: 131.0, leg: 158.0 }, BodySide::Left);
        let ctx = AssessmentContext::new(6.5, ActivityType::Bending);
        let first = assessor.evaluate(&frame, &ctx);
        for _ in 0..10 {
            let again = assessor.evaluate(&frame, &ctx);
            assert_eq!(again, first);
            assert_eq!(
                serde_json::to_vec(&again).unwrap(),
                serde_json::to_vec(&first).unwrap()
            );
        }
    }

    #[test]
    fn test_weight_never_decreases_score() {
        let assessor = Assessor::default();
        let frame = posed_frame(&neutral(), BodySide::Left);
        let mut prev = 0;
        for w in [0.0, 0.5, 5.0, 5.5, 10.0, 10.5, 30.0] {
            let total = assessor
                .evaluate(&frame, &AssessmentContext::new(w, ActivityType::None))
                .total_score;
            assert!(total >= prev, "weight {} dropped score {} -> {}", w, prev, total);
            prev = total;
        }
    }

    #[test]
    fn test_lifting_never_decreases_score() {
        let assessor = Assessor::default();
        let frame = posed_frame(&neutral(), BodySide::Left);
        let none = assessor.evaluate(&frame, &AssessmentContext::new(4.0, ActivityType::None));
        let lifting = assessor.evaluate(&frame, &AssessmentContext::new(4.0, ActivityType::Lifting));
        assert!(lifting.total_score >= none.total_score);
        assert_eq!(lifting.total_score, none.total_score + 1);
    }

    #[test]
    fn test_total_score_is_unclamped() {
        let mut config = ScoringConfig::default();
        config.load.over_points = 50;
        let assessor = Assessor::new(config);
        let result = assessor.evaluate(
            &LandmarkFrame::empty(),
            &AssessmentContext::new(100.0, ActivityType::Lifting),
        );
        assert_eq!(result.total_score, 51);
        assert_eq!(result.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_weight_past_f32_range_keeps_top_load_band() {
        use crate::reba::parse_weight;

        let assessor = Assessor::default();
        let frame = LandmarkFrame::empty();
        let score = |w: f32| {
            assessor
                .evaluate(&frame, &AssessmentContext::new(w, ActivityType::None))
                .total_score
        };
        let heavy = score(parse_weight("1e38"));
        assert_eq!(heavy, 3);
        assert_eq!(score(parse_weight("1e39")), heavy);
        assert_eq!(score(f32::INFINITY), heavy);
        assert_eq!(score(f32::NAN), 0);
    }

    #[test]
    fn test_total_score_saturates() {
        let mut config = ScoringConfig::default();
        config.load.over_points = u32::MAX;
        config.activity.lifting_points = u32::MAX;
        let result = Assessor::new(config).evaluate(
            &LandmarkFrame::empty(),
            &AssessmentContext::new(100.0, ActivityType::Lifting),
        );
        assert_eq!(result.total_score, u32::MAX);
        assert_eq!(result.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_right_side_scoring() {
        let mut config = ScoringConfig::default();
        config.side = BodySide::Right;
        let assessor = Assessor::new(config);
        let angles = Angles { neck: 30.0, back: 130.0, arm: 50.0, leg: 140.0 };

        let right = assessor.evaluate(&posed_frame(&angles, BodySide::Right), &AssessmentContext::default());
        assert_eq!(right.total_score, 9);

        // 左側のみのフレームでは neck 以外は採点されない
        let left = assessor.evaluate(&posed_frame(&angles, BodySide::Left), &AssessmentContext::default());
        assert!(left.segment(Segment::Back).is_none());
        assert!(left.segment(Segment::Neck).is_some());
    }

    #[test]
    fn test_evaluate_slots_rejects_malformed() {
        let assessor = Assessor::default();
        let err = assessor
            .evaluate_slots(&[None; 17], &AssessmentContext::default())
            .unwrap_err();
        assert_eq!(err, FrameError::Malformed { expected: 33, actual: 17 });

        let frame = posed_frame(&neutral(), BodySide::Left);
        let via_slots = assessor
            .evaluate_slots(frame.slots(), &AssessmentContext::default())
            .unwrap();
        assert_eq!(via_slots, assessor.evaluate(&frame, &AssessmentContext::default()));
    }
}
