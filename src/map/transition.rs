use crate::scale::Rgb;
use std::time::{Duration, Instant};

/// How long a fill takes to move to its new color after a category switch
pub const FILL_TRANSITION: Duration = Duration::from_millis(600);

/// Cubic ease-in-out over [0, 1]
#[inline]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Animated fill of one country shape
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillTransition {
    from: Rgb,
    to: Rgb,
    started: Instant,
    duration: Duration,
}

impl FillTransition {
    /// A fill that is already settled on `color`
    pub fn settled(color: Rgb, now: Instant) -> Self {
        Self {
            from: color,
            to: color,
            started: now,
            duration: Duration::ZERO,
        }
    }

    /// Retarget towards `to`, starting from whatever is on screen at `now`
    pub fn retarget(&mut self, to: Rgb, now: Instant) {
        self.from = self.color_at(now);
        self.to = to;
        self.started = now;
        self.duration = FILL_TRANSITION;
    }

    pub fn color_at(&self, now: Instant) -> Rgb {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        if t >= 1.0 {
            return self.to;
        }
        self.from.lerp(self.to, ease_cubic_in_out(t))
    }

    pub fn is_running(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) < self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Rgb = Rgb(0, 0, 0);
    const B: Rgb = Rgb(200, 100, 50);

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
    }

    #[test]
    fn test_settled() {
        let now = Instant::now();
        let fill = FillTransition::settled(A, now);
        assert_eq!(fill.color_at(now), A);
        assert!(!fill.is_running(now));
    }

    #[test]
    fn test_retarget_interpolates() {
        let start = Instant::now();
        let mut fill = FillTransition::settled(A, start);
        fill.retarget(B, start);

        assert_eq!(fill.color_at(start), A);
        assert!(fill.is_running(start + Duration::from_millis(300)));
        assert_eq!(fill.color_at(start + Duration::from_millis(300)), Rgb(100, 50, 25));
        assert_eq!(fill.color_at(start + FILL_TRANSITION), B);
        assert!(!fill.is_running(start + FILL_TRANSITION));
    }

    #[test]
    fn test_retarget_mid_flight_starts_from_current() {
        let start = Instant::now();
        let mut fill = FillTransition::settled(A, start);
        fill.retarget(B, start);

        let mid = start + Duration::from_millis(300);
        let shown = fill.color_at(mid);
        fill.retarget(A, mid);
        assert_eq!(fill.color_at(mid), shown);
        assert_eq!(fill.color_at(mid + FILL_TRANSITION), A);
    }
}
