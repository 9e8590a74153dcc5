//! Multi-bar chart morphology: double top/bottom, head-and-shoulders,
//! triangle convergence.
//!
//! Extrema are taken on closing prices.

use super::PatternSignal;
use crate::domain::bar::IndicatorBar;
use crate::domain::pivot::{local_maxima, local_minima};
use crate::domain::series::{closes, mean_volume, tail};

pub const MIN_BARS: usize = 60;
pub const TRIANGLE_BARS: usize = 30;

const DOUBLE_RADIUS: usize = 5;
const DOUBLE_WINDOW: usize = 60;
const DOUBLE_MIN_GAP: usize = 5;
const DOUBLE_TOLERANCE: f64 = 0.03;
const DOUBLE_BAND: f64 = 0.15;

const HS_RADIUS: usize = 4;
const HS_WINDOW: usize = 80;
const HS_SHOULDER_TOLERANCE: f64 = 0.10;
const HS_BOTTOM_VOLUME_RATIO: f64 = 1.2;

const TRIANGLE_CONTRACTION: f64 = 0.8;
const TRIANGLE_VOLUME_RATIO: f64 = 0.8;

/// Pivots whose index falls inside the trailing `window` bars.
fn recent(pivots: Vec<usize>, len: usize, window: usize) -> Vec<usize> {
    let start = len.saturating_sub(window);
    pivots.into_iter().filter(|&i| i > start).collect()
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    a > 0.0 && ((a - b) / a).abs() < tolerance
}

pub fn double_top_bottom(bars: &[IndicatorBar]) -> PatternSignal {
    let prices = closes(bars);
    let Some(&current) = prices.last() else {
        return PatternSignal::none();
    };
    let mut signal = PatternSignal::none();

    let lows = recent(local_minima(&prices, DOUBLE_RADIUS), prices.len(), DOUBLE_WINDOW);
    if let [.., a, b] = lows[..] {
        let (l1, l2) = (prices[a], prices[b]);
        if b - a > DOUBLE_MIN_GAP
            && within(l1, l2, DOUBLE_TOLERANCE)
            && current > l2
            && current < l2 * (1.0 + DOUBLE_BAND)
        {
            signal.merge(PatternSignal::single(
                "double_bottom",
                2.0,
                format!("double bottom near {l2:.2}, price holding above the neckline zone"),
            ));
        }
    }

    let highs = recent(local_maxima(&prices, DOUBLE_RADIUS), prices.len(), DOUBLE_WINDOW);
    if let [.., a, b] = highs[..] {
        let (h1, h2) = (prices[a], prices[b]);
        if b - a > DOUBLE_MIN_GAP
            && within(h1, h2, DOUBLE_TOLERANCE)
            && current < h2
            && current > h2 * (1.0 - DOUBLE_BAND)
        {
            signal.merge(PatternSignal::single(
                "double_top",
                -2.0,
                format!("double top near {h2:.2}, price rolling over"),
            ));
        }
    }

    signal
}

/// Mean volume over `[i - 2, i + 3)`, clipped to the window.
fn volume_around(bars: &[IndicatorBar], i: usize) -> f64 {
    let start = i.saturating_sub(2);
    let end = (i + 3).min(bars.len());
    let slice = &bars[start..end];
    if slice.is_empty() {
        return 0.0;
    }
    slice.iter().map(|b| b.volume).sum::<f64>() / slice.len() as f64
}

pub fn head_and_shoulders(bars: &[IndicatorBar]) -> PatternSignal {
    let prices = closes(bars);
    let Some(&current) = prices.last() else {
        return PatternSignal::none();
    };
    let mut signal = PatternSignal::none();

    let lows = recent(local_minima(&prices, HS_RADIUS), prices.len(), HS_WINDOW);
    if let [.., ls, head, rs] = lows[..] {
        let (p_ls, p_head, p_rs) = (prices[ls], prices[head], prices[rs]);
        if p_head < p_ls && p_head < p_rs && within(p_ls, p_rs, HS_SHOULDER_TOLERANCE) {
            let (v_ls, v_rs) = (volume_around(bars, ls), volume_around(bars, rs));
            if v_rs < HS_BOTTOM_VOLUME_RATIO * v_ls && current > p_rs {
                signal.merge(PatternSignal::single(
                    "head_and_shoulders_bottom",
                    3.0,
                    "inverse head and shoulders with contained right-shoulder volume",
                ));
            }
        }
    }

    let highs = recent(local_maxima(&prices, HS_RADIUS), prices.len(), HS_WINDOW);
    if let [.., ls, head, rs] = highs[..] {
        let (p_ls, p_head, p_rs) = (prices[ls], prices[head], prices[rs]);
        if p_head > p_ls && p_head > p_rs && within(p_ls, p_rs, HS_SHOULDER_TOLERANCE) {
            let (v_ls, v_rs) = (volume_around(bars, ls), volume_around(bars, rs));
            if v_rs < v_ls {
                signal.merge(PatternSignal::single(
                    "head_and_shoulders_top",
                    -3.0,
                    "head and shoulders top, right shoulder on fading volume",
                ));
            }
        }
    }

    signal
}

pub fn triangle(bars: &[IndicatorBar]) -> PatternSignal {
    if bars.len() < TRIANGLE_BARS {
        return PatternSignal::none();
    }
    let window = tail(bars, TRIANGLE_BARS);
    let (first, second) = window.split_at(TRIANGLE_BARS / 2);

    let extremes = |half: &[IndicatorBar]| {
        let high = half.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = half.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        (high, low)
    };
    let (h1, l1) = extremes(first);
    let (h2, l2) = extremes(second);
    let (range1, range2) = (h1 - l1, h2 - l2);

    let converging = range1 > 0.0 && range2 < TRIANGLE_CONTRACTION * range1 && h2 < h1 && l2 > l1;
    if !converging {
        return PatternSignal::none();
    }

    let quiet = match (mean_volume(bars, 5), mean_volume(bars, 20)) {
        (Some(short), Some(long)) => long > 0.0 && short < TRIANGLE_VOLUME_RATIO * long,
        _ => false,
    };
    if quiet {
        PatternSignal::single(
            "triangle",
            1.0,
            "symmetrical triangle with drying volume, breakout pending",
        )
    } else {
        PatternSignal::single("triangle", 0.0, "triangle convergence, monitor for volume contraction")
    }
}

/// Combined chart morphology. Needs at least 60 bars.
pub fn morphology(bars: &[IndicatorBar]) -> PatternSignal {
    if bars.len() < MIN_BARS {
        return PatternSignal::none();
    }
    let mut signal = double_top_bottom(bars);
    signal.merge(head_and_shoulders(bars));
    signal.merge(triangle(bars));
    signal
}
