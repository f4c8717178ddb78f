use chrono::{DateTime, Utc};
use std::fmt;

use crate::indicators::{IndicatorFrame, IndicatorRow};
use crate::models::{Candle, Signal};
use crate::settings::IndicatorConfig;

/// Votes needed on one side before a trade is taken
const MIN_AGREEING_RULES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bullish,
    Bearish,
}

/// A rule that fired during scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    BullishTrendCross,
    BearishTrendCross,
    MomentumOversold,
    MomentumOverbought,
    SmaCrossedAbove,
    SmaCrossedBelow,
}

impl Evidence {
    pub fn bias(&self) -> Bias {
        match self {
            Evidence::BullishTrendCross | Evidence::MomentumOversold | Evidence::SmaCrossedAbove => {
                Bias::Bullish
            }
            Evidence::BearishTrendCross
            | Evidence::MomentumOverbought
            | Evidence::SmaCrossedBelow => Bias::Bearish,
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Evidence::BullishTrendCross => "bullish trend cross",
            Evidence::BearishTrendCross => "bearish trend cross",
            Evidence::MomentumOversold => "momentum oversold",
            Evidence::MomentumOverbought => "momentum overbought",
            Evidence::SmaCrossedAbove => "short SMA crossed above long SMA",
            Evidence::SmaCrossedBelow => "short SMA crossed below long SMA",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationStatus {
    /// Rules were scored at `index` (the last closed candle)
    Scored {
        index: usize,
        timestamp: DateTime<Utc>,
        row: IndicatorRow,
    },
    /// Fewer closed candles than the slowest indicator needs
    InsufficientData { required: usize, available: usize },
}

/// Outcome of scoring one candle window
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub signal: Signal,
    pub evidence: Vec<Evidence>,
    pub bull_score: u8,
    pub bear_score: u8,
    pub status: EvaluationStatus,
}

impl Evaluation {
    fn insufficient(required: usize, available: usize) -> Self {
        Self {
            signal: Signal::NoAction,
            evidence: Vec::new(),
            bull_score: 0,
            bear_score: 0,
            status: EvaluationStatus::InsufficientData {
                required,
                available,
            },
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self.status, EvaluationStatus::InsufficientData { .. })
    }

    /// Evidence joined for log lines, e.g. "momentum oversold; bullish trend cross"
    pub fn reasons(&self) -> String {
        self.evidence
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Final vote: a side needs two agreeing rules and must strictly outvote the other
pub fn decide(bull_score: u8, bear_score: u8) -> Signal {
    if bull_score > bear_score && bull_score >= MIN_AGREEING_RULES {
        Signal::Call
    } else if bear_score > bull_score && bear_score >= MIN_AGREEING_RULES {
        Signal::Put
    } else {
        Signal::NoAction
    }
}

/// Detect `fast` overtaking `slow` between two consecutive points
///
/// Strict inequalities on both sides: touching is not crossing. Any missing
/// value means no cross.
pub fn detect_cross(
    prev_fast: Option<f64>,
    prev_slow: Option<f64>,
    curr_fast: Option<f64>,
    curr_slow: Option<f64>,
) -> Option<Bias> {
    let (pf, ps, cf, cs) = (prev_fast?, prev_slow?, curr_fast?, curr_slow?);

    if pf < ps && cf > cs {
        Some(Bias::Bullish)
    } else if pf > ps && cf < cs {
        Some(Bias::Bearish)
    } else {
        None
    }
}

/// Check that candles are evenly spaced on the expected interval
///
/// Allows up to 1.5x the interval between neighbours before reporting a gap.
pub fn validate_candle_spacing(
    candles: &[Candle],
    expected_interval_secs: u64,
) -> anyhow::Result<()> {
    if candles.len() < 2 {
        return Ok(());
    }

    let max_gap_secs = expected_interval_secs + (expected_interval_secs / 2);

    for window in candles.windows(2) {
        let time_diff = (window[1].timestamp - window[0].timestamp).num_seconds();

        if time_diff <= 0 {
            anyhow::bail!("Candles are not sorted by timestamp");
        }

        if time_diff as u64 > max_gap_secs {
            anyhow::bail!(
                "Data gap detected: {}s between candles (expected ~{}s, max allowed {}s). Gap from {} to {}",
                time_diff,
                expected_interval_secs,
                max_gap_secs,
                window[0].timestamp.format("%H:%M:%S"),
                window[1].timestamp.format("%H:%M:%S")
            );
        }
    }

    Ok(())
}

/// Scores the last closed candle of a window against the one before it
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    config: IndicatorConfig,
}

impl SignalEvaluator {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn required_history(&self) -> usize {
        self.config.required_history()
    }

    /// Evaluate `frame`, computed from `candles`, at index `candles.len() - 2`
    ///
    /// The newest candle is skipped because it may still be forming.
    pub fn evaluate(&self, candles: &[Candle], frame: &IndicatorFrame) -> Evaluation {
        let required = self.required_history();
        let available = candles.len().saturating_sub(1);

        let index = match candles.len().checked_sub(2) {
            Some(i) if i >= required.max(1) => i,
            _ => return Evaluation::insufficient(required, available),
        };

        let (Some(prev), Some(curr)) = (frame.row(index - 1), frame.row(index)) else {
            // Frame shorter than the candles it was built from
            return Evaluation::insufficient(required, frame.len().saturating_sub(1));
        };

        tracing::debug!(
            "Indicators at {}: MACD={:?}/{:?}, RSI={:?}, SMA short={:?}, SMA long={:?}, AO={:?}",
            index,
            curr.macd,
            curr.macd_signal,
            curr.rsi,
            curr.sma_short,
            curr.sma_long,
            curr.awesome
        );

        let evidence = self.score(&prev, &curr);
        let bull_score = evidence.iter().filter(|e| e.bias() == Bias::Bullish).count() as u8;
        let bear_score = evidence.len() as u8 - bull_score;

        Evaluation {
            signal: decide(bull_score, bear_score),
            evidence,
            bull_score,
            bear_score,
            status: EvaluationStatus::Scored {
                index,
                timestamp: candles[index].timestamp,
                row: curr,
            },
        }
    }

    fn score(&self, prev: &IndicatorRow, curr: &IndicatorRow) -> Vec<Evidence> {
        let mut evidence = Vec::with_capacity(3);

        match detect_cross(prev.macd, prev.macd_signal, curr.macd, curr.macd_signal) {
            Some(Bias::Bullish) => evidence.push(Evidence::BullishTrendCross),
            Some(Bias::Bearish) => evidence.push(Evidence::BearishTrendCross),
            None => {}
        }

        if let Some(rsi) = curr.rsi {
            if rsi < self.config.oversold {
                evidence.push(Evidence::MomentumOversold);
            } else if rsi > self.config.overbought {
                evidence.push(Evidence::MomentumOverbought);
            }
        }

        match detect_cross(prev.sma_short, prev.sma_long, curr.sma_short, curr.sma_long) {
            Some(Bias::Bullish) => evidence.push(Evidence::SmaCrossedAbove),
            Some(Bias::Bearish) => evidence.push(Evidence::SmaCrossedBelow),
            None => {}
        }

        evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now() - Duration::minutes(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    /// Frame of `len` rows where only `index - 1` and `index` carry values
    fn frame_with_rows(
        len: usize,
        index: usize,
        prev: IndicatorRow,
        curr: IndicatorRow,
    ) -> IndicatorFrame {
        let mut frame = IndicatorFrame {
            macd: vec![None; len],
            macd_signal: vec![None; len],
            rsi: vec![None; len],
            sma_short: vec![None; len],
            sma_long: vec![None; len],
            awesome: vec![None; len],
        };
        for (i, row) in [(index - 1, prev), (index, curr)] {
            frame.macd[i] = row.macd;
            frame.macd_signal[i] = row.macd_signal;
            frame.rsi[i] = row.rsi;
            frame.sma_short[i] = row.sma_short;
            frame.sma_long[i] = row.sma_long;
            frame.awesome[i] = row.awesome;
        }
        frame
    }

    fn row(macd: f64, signal: f64, rsi: Option<f64>, short: f64, long: f64) -> IndicatorRow {
        IndicatorRow {
            macd: Some(macd),
            macd_signal: Some(signal),
            rsi,
            sma_short: Some(short),
            sma_long: Some(long),
            awesome: None,
        }
    }

    /// Score `prev` and `curr` as rows 37 and 38 of a 40 candle window
    fn evaluate_rows(prev: IndicatorRow, curr: IndicatorRow) -> Evaluation {
        let candles = create_test_candles(&[1.1; 40]);
        let frame = frame_with_rows(40, 38, prev, curr);
        SignalEvaluator::new(IndicatorConfig::default()).evaluate(&candles, &frame)
    }

    #[test]
    fn test_decision_grid() {
        for bull in 0..=3u8 {
            for bear in 0..=3u8 {
                let expected = if bull > bear && bull >= 2 {
                    Signal::Call
                } else if bear > bull && bear >= 2 {
                    Signal::Put
                } else {
                    Signal::NoAction
                };
                assert_eq!(decide(bull, bear), expected, "bull={} bear={}", bull, bear);
            }
        }
    }

    #[test]
    fn test_decision_needs_two_votes() {
        assert_eq!(decide(1, 0), Signal::NoAction);
        assert_eq!(decide(0, 1), Signal::NoAction);
        assert_eq!(decide(2, 0), Signal::Call);
        assert_eq!(decide(2, 1), Signal::Call);
        assert_eq!(decide(2, 2), Signal::NoAction);
        assert_eq!(decide(0, 3), Signal::Put);
    }

    #[test]
    fn test_detect_cross() {
        let s = Some;
        assert_eq!(detect_cross(s(1.0), s(2.0), s(3.0), s(2.0)), Some(Bias::Bullish));
        assert_eq!(detect_cross(s(3.0), s(2.0), s(1.0), s(2.0)), Some(Bias::Bearish));
        // Touching on either side is not a cross
        assert_eq!(detect_cross(s(2.0), s(2.0), s(3.0), s(2.0)), None);
        assert_eq!(detect_cross(s(1.0), s(2.0), s(2.0), s(2.0)), None);
        assert_eq!(detect_cross(None, s(2.0), s(3.0), s(2.0)), None);
    }

    #[test]
    fn test_cross_symmetric_when_roles_swap() {
        let (ps, pl, cs, cl) = (Some(1.0), Some(1.2), Some(1.3), Some(1.25));
        assert_eq!(detect_cross(ps, pl, cs, cl), Some(Bias::Bullish));
        assert_eq!(detect_cross(pl, ps, cl, cs), Some(Bias::Bearish));

        let bullish = evaluate_rows(
            row(0.0, 0.0, Some(50.0), 1.0, 1.2),
            row(0.0, 0.0, Some(50.0), 1.3, 1.25),
        );
        let bearish = evaluate_rows(
            row(0.0, 0.0, Some(50.0), 1.2, 1.0),
            row(0.0, 0.0, Some(50.0), 1.25, 1.3),
        );
        assert_eq!(bullish.evidence, vec![Evidence::SmaCrossedAbove]);
        assert_eq!(bearish.evidence, vec![Evidence::SmaCrossedBelow]);
    }

    #[test]
    fn test_insufficient_history() {
        let evaluator = SignalEvaluator::new(IndicatorConfig::default());

        // required = 34, so i = n - 2 must reach 34
        for n in [0usize, 1, 2, 20, 35] {
            let candles = create_test_candles(&vec![1.1; n]);
            let frame = IndicatorFrame::default();
            let evaluation = evaluator.evaluate(&candles, &frame);

            assert_eq!(evaluation.signal, Signal::NoAction);
            assert!(evaluation.evidence.is_empty());
            assert!(evaluation.is_insufficient(), "n={}", n);
        }
    }

    #[test]
    fn test_insufficient_ignores_indicator_values() {
        // Strong bullish rows, but the window is one candle short
        let candles = create_test_candles(&[1.1; 35]);
        let frame = frame_with_rows(
            35,
            33,
            row(-1.0, 0.0, Some(10.0), 1.0, 2.0),
            row(1.0, 0.0, Some(10.0), 3.0, 2.0),
        );
        let evaluator = SignalEvaluator::new(IndicatorConfig::default());
        let evaluation = evaluator.evaluate(&candles, &frame);

        assert_eq!(evaluation.signal, Signal::NoAction);
        assert_eq!(
            evaluation.status,
            EvaluationStatus::InsufficientData {
                required: 34,
                available: 34
            }
        );
    }

    #[test]
    fn test_all_bullish_rules() {
        let evaluation = evaluate_rows(
            row(-0.1, 0.0, Some(20.0), 1.0, 1.1),
            row(0.1, 0.0, Some(25.0), 1.2, 1.1),
        );

        assert_eq!(evaluation.signal, Signal::Call);
        assert_eq!((evaluation.bull_score, evaluation.bear_score), (3, 0));
        assert_eq!(
            evaluation.reasons(),
            "bullish trend cross; momentum oversold; short SMA crossed above long SMA"
        );
    }

    #[test]
    fn test_two_bearish_rules() {
        let evaluation = evaluate_rows(
            row(0.1, 0.0, Some(75.0), 1.1, 1.1),
            row(-0.1, 0.0, Some(80.0), 1.2, 1.1),
        );

        assert_eq!(evaluation.signal, Signal::Put);
        assert_eq!((evaluation.bull_score, evaluation.bear_score), (0, 2));
        assert_eq!(
            evaluation.evidence,
            vec![Evidence::BearishTrendCross, Evidence::MomentumOverbought]
        );
    }

    #[test]
    fn test_split_vote_is_no_action() {
        // Bullish trend cross, overbought momentum
        let evaluation = evaluate_rows(
            row(-0.1, 0.0, Some(75.0), 1.1, 1.1),
            row(0.1, 0.0, Some(75.0), 1.1, 1.1),
        );

        assert_eq!((evaluation.bull_score, evaluation.bear_score), (1, 1));
        assert_eq!(evaluation.signal, Signal::NoAction);
    }

    #[test]
    fn test_two_against_one_wins() {
        // Bullish trend + SMA crosses outvote overbought momentum
        let evaluation = evaluate_rows(
            row(-0.1, 0.0, Some(75.0), 1.0, 1.1),
            row(0.1, 0.0, Some(75.0), 1.2, 1.1),
        );

        assert_eq!((evaluation.bull_score, evaluation.bear_score), (2, 1));
        assert_eq!(evaluation.signal, Signal::Call);
    }

    #[test]
    fn test_missing_momentum_does_not_vote() {
        let evaluation = evaluate_rows(
            row(-0.1, 0.0, None, 1.0, 1.1),
            row(0.1, 0.0, None, 1.2, 1.1),
        );

        assert!(!evaluation.evidence.contains(&Evidence::MomentumOversold));
        assert_eq!((evaluation.bull_score, evaluation.bear_score), (2, 0));
    }

    #[test]
    fn test_momentum_at_threshold_does_not_vote() {
        let flat = |rsi| row(0.0, 0.0, Some(rsi), 1.1, 1.1);
        let at_low = evaluate_rows(flat(30.0), flat(30.0));
        let at_high = evaluate_rows(flat(70.0), flat(70.0));

        assert!(at_low.evidence.is_empty());
        assert!(at_high.evidence.is_empty());
    }

    #[test]
    fn test_scores_bounded() {
        let evaluator = SignalEvaluator::new(IndicatorConfig::default());
        let engine = crate::indicators::IndicatorEngine::new(IndicatorConfig::default());

        for seed in 0..20u64 {
            let closes: Vec<f64> = (0..100)
                .map(|i| 1.1 + (((i as u64 * 7919 + seed * 104729) % 97) as f64 - 48.0) * 0.0001)
                .collect();
            let candles = create_test_candles(&closes);
            let evaluation = evaluator.evaluate(&candles, &engine.compute(&candles));

            assert!(evaluation.bull_score <= 3 && evaluation.bear_score <= 3);
            assert_eq!(
                evaluation.signal,
                decide(evaluation.bull_score, evaluation.bear_score)
            );
        }
    }

    #[test]
    fn test_evaluates_last_closed_candle() {
        let candles = create_test_candles(&[1.1; 40]);
        let engine = crate::indicators::IndicatorEngine::new(IndicatorConfig::default());
        let evaluator = SignalEvaluator::new(IndicatorConfig::default());
        let evaluation = evaluator.evaluate(&candles, &engine.compute(&candles));

        match evaluation.status {
            EvaluationStatus::Scored { index, timestamp, .. } => {
                assert_eq!(index, 38);
                assert_eq!(timestamp, candles[38].timestamp);
            }
            other => panic!("expected scored evaluation, got {:?}", other),
        }
    }

    #[test]
    fn test_uniform_candles_pass() {
        let candles = create_test_candles(&[1.1, 1.2, 1.3]);
        assert!(validate_candle_spacing(&candles, 60).is_ok());
    }

    #[test]
    fn test_gap_detected() {
        let mut candles = create_test_candles(&[1.1, 1.2, 1.3]);
        candles[2].timestamp += Duration::minutes(5);

        let result = validate_candle_spacing(&candles, 60);
        assert!(result.unwrap_err().to_string().contains("gap"));
    }

    #[test]
    fn test_backwards_timestamps_fail() {
        let mut candles = create_test_candles(&[1.1, 1.2]);
        candles.reverse();

        let result = validate_candle_spacing(&candles, 60);
        assert!(result.unwrap_err().to_string().contains("not sorted"));
    }

    #[test]
    fn test_spacing_tolerance() {
        let mut candles = create_test_candles(&[1.1, 1.2]);
        candles[1].timestamp += Duration::seconds(25);
        assert!(validate_candle_spacing(&candles, 60).is_ok());
    }
}
