/// One linear band of a [`PiecewiseLinear`] curve, active from `from` upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: f64,
    pub base: f64,
    pub slope: f64,
}

impl Segment {
    pub const fn new(from: f64, base: f64, slope: f64) -> Self {
        Self { from, base, slope }
    }

    fn value_at(&self, x: f64) -> f64 {
        self.base + (x - self.from) * self.slope
    }
}

/// Band-wise linear function used for every tunable scoring curve.
///
/// Segments are kept sorted by `from`; an input selects the last segment whose
/// lower bound it reaches (closed lower bound). Inputs below the first segment
/// use the first segment. The optional floor clamps the result from below.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    segments: Vec<Segment>,
    floor: Option<f64>,
}

impl PiecewiseLinear {
    pub fn new(mut segments: Vec<Segment>) -> Self {
        segments.sort_by(|a, b| a.from.total_cmp(&b.from));
        Self {
            segments,
            floor: None,
        }
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn eval(&self, x: f64) -> f64 {
        let raw = self
            .select_segment(x)
            .map(|segment| segment.value_at(x))
            .unwrap_or(0.0);
        self.clamp(raw)
    }

    fn select_segment(&self, x: f64) -> Option<&Segment> {
        self.segments
            .iter()
            .rev()
            .find(|segment| x >= segment.from)
            .or_else(|| self.segments.first())
    }

    fn clamp(&self, value: f64) -> f64 {
        self.floor.map_or(value, |floor| value.max(floor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_like() -> PiecewiseLinear {
        PiecewiseLinear::new(vec![
            Segment::new(0.0, 0.0, 0.08),
            Segment::new(6.0, 0.5, 0.05),
            Segment::new(25.0, 1.0, 0.0),
        ])
        .with_floor(0.3)
    }

    #[test]
    fn test_selects_band_with_closed_lower_bound() {
        let curve = volume_like();
        assert!((curve.eval(6.0) - 0.5).abs() < 1e-9);
        assert!((curve.eval(10.0) - 0.7).abs() < 1e-9);
        assert!((curve.eval(25.0) - 1.0).abs() < 1e-9);
        assert!((curve.eval(400.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_applies_in_low_band() {
        let curve = volume_like();
        assert!((curve.eval(1.0) - 0.3).abs() < 1e-9);
        assert!((curve.eval(5.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_segments_are_ordered() {
        let curve = PiecewiseLinear::new(vec![
            Segment::new(10.0, 1.0, 0.5),
            Segment::new(0.0, 0.0, 0.1),
        ]);

        assert!((curve.eval(5.0) - 0.5).abs() < 1e-9);
        assert!((curve.eval(12.0) - 2.0).abs() < 1e-9);
    }
}
