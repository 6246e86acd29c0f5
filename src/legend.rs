use crate::aggregate::FlowCategory;
use crate::scale::{ColorDomain, ColorScale, Rgb};

/// Width of the gradient bar in character cells
pub const LEGEND_WIDTH: usize = 24;

/// Number of gradient intervals sampled from the scale
const GRADIENT_STOPS: usize = 10;

/// Requested tick count for the axis (a hint, like any nice-tick axis)
const AXIS_TICKS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the bar, 0.0 to 1.0
    pub offset: f64,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
    /// Column within the bar
    pub x: usize,
}

/// Legend for the current category: gradient bar, axis ticks, title.
///
/// Always rebuilt from scratch; stop colors and tick positions both depend on
/// the domain, so nothing carries over from a previous legend.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub domain: ColorDomain,
    pub stops: Vec<GradientStop>,
    pub ticks: Vec<Tick>,
    pub label: String,
}

impl Legend {
    pub fn build(scale: &ColorScale, category: FlowCategory) -> Self {
        let domain = scale.domain();
        let max = domain.max() as f64;

        let stops = ticks(0.0, 1.0, GRADIENT_STOPS)
            .into_iter()
            .map(|f| GradientStop {
                offset: f,
                color: scale.color_for(f * max),
            })
            .collect();

        let ticks = ticks(0.0, max, AXIS_TICKS)
            .into_iter()
            .map(|value| Tick {
                value,
                label: format_tick(value),
                x: (value / max * (LEGEND_WIDTH - 1) as f64).round() as usize,
            })
            .collect();

        Self {
            domain,
            stops,
            ticks,
            label: format!("{} project count", category.tag()),
        }
    }

    /// Color of the gradient at `fraction` of the bar, interpolating between stops
    pub fn color_at(&self, fraction: f64) -> Rgb {
        let fraction = fraction.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Rgb(0, 0, 0);
        };
        if fraction <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if fraction <= b.offset {
                let span = b.offset - a.offset;
                let t = if span > 0.0 { (fraction - a.offset) / span } else { 1.0 };
                return a.color.lerp(b.color, t);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

/// Evenly spaced "nice" values covering [start, stop], roughly `count` of them.
/// Steps are 1, 2 or 5 times a power of ten.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (lo, hi) = if stop < start { (stop, start) } else { (start, stop) };
    let Some((i1, i2, inc)) = tick_spec(lo, hi, count as f64) else {
        return Vec::new();
    };

    let mut out: Vec<f64> = (i1..=i2)
        .map(|i| if inc < 0.0 { i as f64 / -inc } else { i as f64 * inc })
        .collect();
    if stop < start {
        out.reverse();
    }
    out
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let f = 10f64.powf(-power) / factor;
        i1 = (start * f).round() as i64;
        i2 = (stop * f).round() as i64;
        if (i1 as f64) / f < start {
            i1 += 1;
        }
        if (i2 as f64) / f > stop {
            i2 -= 1;
        }
        inc = -f;
    } else {
        let f = 10f64.powf(power) * factor;
        i1 = (start / f).round() as i64;
        i2 = (stop / f).round() as i64;
        if (i1 as f64) * f < start {
            i1 += 1;
        }
        if (i2 as f64) * f > stop {
            i2 -= 1;
        }
        inc = f;
    }

    if i2 < i1 {
        if (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        return None;
    }
    Some((i1, i2, inc))
}

/// Integers with thousands separators, fractions as-is
pub fn format_tick(value: f64) -> String {
    if value.fract() != 0.0 {
        return value.to_string();
    }
    let digits = (value.abs() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
