//! Human-readable rationale for each scoring factor.

use super::scorer::{Factor, ScoreInputs};
use super::signal::SignalKind;

/// Parameters that appear in reason text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasonContext {
    pub ema_periods: [usize; 3],
    pub volume_period: usize,
    pub rr_ceiling: f64,
    pub rsi_ideal: (f64, f64),
}

pub fn reason(factor: Factor, inputs: &ScoreInputs, ctx: &ReasonContext) -> String {
    match factor {
        Factor::SignalCount => {
            let total = SignalKind::ALL.len();
            if inputs.active_signals.is_empty() {
                format!("0/{total} signals active")
            } else {
                let labels: Vec<&str> = inputs.active_signals.iter().map(|k| k.label()).collect();
                format!(
                    "{}/{total} signals active ({})",
                    inputs.active_signals.len(),
                    labels.join(", ")
                )
            }
        }
        Factor::RiskReward => format!(
            "R:R = {:.1} ({:.1} scores full marks)",
            inputs.risk_reward, ctx.rr_ceiling
        ),
        Factor::Volume => match inputs.volume_ratio() {
            Some(ratio) => format!("volume is {ratio:.1}x the {}-day average", ctx.volume_period),
            None => "no volume average".to_string(),
        },
        Factor::TrendStrength => {
            let [short, mid, long] = ctx.ema_periods;
            let labels = [
                format!("close > EMA{short}"),
                format!("EMA{short} > EMA{mid}"),
                format!("EMA{mid} > EMA{long}"),
                format!("close > EMA{long}"),
            ];
            let held: Vec<String> = inputs
                .trend_checks()
                .iter()
                .zip(labels)
                .filter(|(ok, _)| **ok)
                .map(|(_, label)| label)
                .collect();
            if held.is_empty() {
                "no trend alignment".to_string()
            } else {
                held.join(", ")
            }
        }
        Factor::RsiPosition => {
            let (low, high) = ctx.rsi_ideal;
            let rsi = inputs.rsi;
            if rsi.is_nan() {
                "RSI undefined".to_string()
            } else if rsi < low {
                format!("RSI {rsi:.0}, below the {low:.0}-{high:.0} swing zone")
            } else if rsi > high {
                format!("RSI {rsi:.0}, above the {low:.0}-{high:.0} swing zone")
            } else {
                format!("RSI {rsi:.0}, inside the {low:.0}-{high:.0} swing zone")
            }
        }
    }
}
