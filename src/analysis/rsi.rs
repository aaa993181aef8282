//! Wilder RSI on close-to-close deltas.

/// RSI for every input position. The first `period` positions are `None`;
/// position `period` is seeded with simple means of the first `period`
/// gains and losses, later positions use Wilder smoothing.
pub fn rsi(period: usize, closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let diff = closes[i] - closes[i - 1];
        if diff >= 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }
    let n = period as f64;
    let mut avg_gain = gains / n;
    let mut avg_loss = losses / n;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..closes.len() {
        let diff = closes[i] - closes[i - 1];
        let (gain, loss) = if diff >= 0.0 { (diff, 0.0) } else { (0.0, -diff) };
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat series: no momentum either way
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_until_lookback_satisfied() {
        let closes: Vec<f64> = (1..=14).map(|v| v as f64).collect();
        assert!(rsi(14, &closes).iter().all(Option::is_none));

        let closes: Vec<f64> = (1..=15).map(|v| v as f64).collect();
        let out = rsi(14, &closes);
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14].is_some());
    }

    #[test]
    fn rising_closes_reach_100() {
        let closes: Vec<f64> = (1..=40).map(|v| v as f64).collect();
        let out = rsi(14, &closes);
        for value in out.iter().flatten() {
            assert!(*value > 99.9, "rsi {value} should be ~100");
        }
    }

    #[test]
    fn falling_closes_reach_0() {
        let closes: Vec<f64> = (1..=40).rev().map(|v| v as f64).collect();
        let last = rsi(14, &closes).last().copied().flatten().unwrap();
        assert!(last < 0.1);
    }

    #[test]
    fn mixed_series_matches_hand_computation() {
        // period 2: diffs +1, -1, +2
        let closes = [1.0, 2.0, 1.0, 3.0];
        let out = rsi(2, &closes);
        // seed: avg_gain 0.5, avg_loss 0.5 -> 50
        assert!((out[2].unwrap() - 50.0).abs() < 1e-9);
        // next: avg_gain (0.5 + 2) / 2 = 1.25, avg_loss 0.25 -> rs 5 -> 83.33
        assert!((out[3].unwrap() - 83.333_333).abs() < 1e-4);
    }
}
