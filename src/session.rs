use crate::matcher::SimilarityScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionStatus {
    Sampling,
    Recognized,
}

/// What a session made of one score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Still below threshold; `best` is the running maximum.
    Sampling { best: SimilarityScore },
    /// This score pushed the session over the threshold.
    Recognized { best: SimilarityScore },
    /// The session was already recognized; nothing changed.
    Ignored,
}

/// Mutable state of one recognition attempt.
///
/// `best` only grows while sampling and is frozen once recognized, until
/// [`RecognitionSession::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSession {
    best: SimilarityScore,
    threshold: f32,
    status: RecognitionStatus,
}

impl RecognitionSession {
    pub fn new(threshold: f32) -> Self {
        RecognitionSession {
            best: SimilarityScore::ZERO,
            threshold,
            status: RecognitionStatus::Sampling,
        }
    }

    pub fn observe(&mut self, score: SimilarityScore) -> Observation {
        if self.status == RecognitionStatus::Recognized {
            return Observation::Ignored;
        }
        if score > self.best {
            self.best = score;
        }
        if self.best.value() >= self.threshold {
            self.status = RecognitionStatus::Recognized;
            Observation::Recognized { best: self.best }
        } else {
            Observation::Sampling { best: self.best }
        }
    }

    pub fn reset(&mut self) {
        self.best = SimilarityScore::ZERO;
        self.status = RecognitionStatus::Sampling;
    }

    pub fn best(&self) -> SimilarityScore {
        self.best
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn status(&self) -> RecognitionStatus {
        self.status
    }

    pub fn is_sampling(&self) -> bool {
        self.status == RecognitionStatus::Sampling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: f32) -> SimilarityScore {
        SimilarityScore::new(v)
    }

    #[test]
    fn best_is_running_maximum() {
        let mut session = RecognitionSession::new(0.9);
        let bests: Vec<f32> = [0.2, 0.1, 0.4, 0.3, 0.0]
            .iter()
            .map(|&v| match session.observe(s(v)) {
                Observation::Sampling { best } => best.value(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(bests, vec![0.2, 0.2, 0.4, 0.4, 0.4]);
    }

    #[test]
    fn recognized_is_terminal_until_reset() {
        let mut session = RecognitionSession::new(0.3);
        assert_eq!(session.observe(s(0.5)), Observation::Recognized { best: s(0.5) });
        assert_eq!(session.observe(s(0.9)), Observation::Ignored);
        assert_eq!(session.best(), s(0.5));
        assert_eq!(session.status(), RecognitionStatus::Recognized);

        session.reset();
        assert!(session.is_sampling());
        assert_eq!(session.best(), SimilarityScore::ZERO);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut session = RecognitionSession::new(0.25);
        assert!(matches!(session.observe(s(0.25)), Observation::Recognized { .. }));
    }
}
