/// Fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Vertical distance of `(x, y)` from the line.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        (self.eval(x) - y).abs()
    }
}

/// Least-squares accumulator for points `(x, y)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineRegression {
    n: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    sxy: f64,
    syy: f64,
}

impl LineRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64, y: f64) {
        self.n += 1.0;
        self.sx += x;
        self.sy += y;
        self.sxx += x * x;
        self.sxy += x * y;
        self.syy += y * y;
    }

    pub fn len(&self) -> usize {
        self.n as usize
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0.0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Intercept from the normal equations, slope back-substituted through
    /// the x sum. `None` for fewer than two points or a degenerate x spread.
    pub fn fit(&self) -> Option<LineFit> {
        if self.n < 2.0 {
            return None;
        }
        let den = self.n * self.sxx - self.sx * self.sx;
        if den == 0.0 || self.sx == 0.0 {
            return None;
        }
        let intercept = (self.sy * self.sxx - self.sxy * self.sx) / den;
        let slope = (self.sy - intercept * self.n) / self.sx;
        Some(LineFit { slope, intercept })
    }

    /// Variant kept for comparison with archived results: the intercept
    /// numerator uses `sxy * sxx` instead of `sxy * sx`. Not used by the
    /// detectors.
    pub fn fit_legacy(&self) -> Option<LineFit> {
        if self.n < 2.0 {
            return None;
        }
        let den = self.n * self.sxx - self.sx * self.sx;
        if den == 0.0 || self.sx == 0.0 {
            return None;
        }
        let intercept = (self.sy * self.sxx - self.sxy * self.sxx) / den;
        let slope = (self.sy - intercept * self.n) / self.sx;
        Some(LineFit { slope, intercept })
    }

    /// Root-mean-square residual of `line` over the accumulated points.
    pub fn rms_error(&self, line: &LineFit) -> f64 {
        if self.n == 0.0 {
            return 0.0;
        }
        let (m, b) = (line.slope, line.intercept);
        let ss = self.syy + m * m * self.sxx + self.n * b * b
            - 2.0 * m * self.sxy
            - 2.0 * b * self.sy
            + 2.0 * m * b * self.sx;
        (ss.max(0.0) / self.n).sqrt()
    }
}
