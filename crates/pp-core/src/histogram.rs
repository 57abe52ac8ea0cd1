/// Counting histogram over the integer range `0..buckets`.
///
/// Values outside the range are clamped into the first or last bucket. Order
/// statistics are read straight from the bucket counts, so no sample list is
/// kept.
#[derive(Debug, Clone)]
pub struct BucketHistogram {
    counts: Vec<u32>,
    total: usize,
}

impl BucketHistogram {
    pub fn new(buckets: usize) -> Self {
        Self {
            counts: vec![0; buckets.max(1)],
            total: 0,
        }
    }

    pub fn add(&mut self, v: i32) {
        let idx = v.clamp(0, self.counts.len() as i32 - 1) as usize;
        self.counts[idx] += 1;
        self.total += 1;
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
        self.total = 0;
    }

    /// Value at position `place` of the ascending sample order.
    pub fn rank_value(&self, place: usize) -> Option<i32> {
        if place >= self.total {
            return None;
        }
        let mut seen = 0usize;
        for (v, &c) in self.counts.iter().enumerate() {
            seen += c as usize;
            if seen > place {
                return Some(v as i32);
            }
        }
        None
    }

    /// Most populated bucket and its count; the lowest bucket wins ties.
    pub fn peak(&self) -> Option<(i32, u32)> {
        if self.total == 0 {
            return None;
        }
        let mut best = (0usize, 0u32);
        for (v, &c) in self.counts.iter().enumerate() {
            if c > best.1 {
                best = (v, c);
            }
        }
        Some((best.0 as i32, best.1))
    }

    pub fn median(&self) -> Option<f32> {
        if self.total == 0 {
            return None;
        }
        let mid = self.total / 2;
        if self.total % 2 == 1 {
            return self.rank_value(mid).map(|v| v as f32);
        }
        let lo = self.rank_value(mid - 1)?;
        let hi = self.rank_value(mid)?;
        Some((lo + hi) as f32 / 2.0)
    }

    pub fn mean(&self) -> Option<f32> {
        self.mean_of_smallest(self.total)
    }

    /// Mean after discarding the largest `kill_percent` of the samples.
    ///
    /// `round(len * (100 - kill_percent) / 100)` of the smallest samples are
    /// kept (at least one when the histogram is not empty).
    pub fn trimmed_mean(&self, kill_percent: f32) -> Option<f32> {
        let keep_frac = ((100.0 - kill_percent) / 100.0).clamp(0.0, 1.0);
        let keep = ((self.total as f32 * keep_frac).round() as usize).max(1);
        self.mean_of_smallest(keep)
    }

    fn mean_of_smallest(&self, keep: usize) -> Option<f32> {
        if self.total == 0 || keep == 0 {
            return None;
        }
        let keep = keep.min(self.total);
        let mut left = keep;
        let mut sum = 0u64;
        for (v, &c) in self.counts.iter().enumerate() {
            if left == 0 {
                break;
            }
            let take = (c as usize).min(left);
            sum += v as u64 * take as u64;
            left -= take;
        }
        Some(sum as f32 / keep as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::BucketHistogram;

    #[test]
    fn median_even_and_odd() {
        let mut h = BucketHistogram::new(100);
        for v in [5, 1, 9] {
            h.add(v);
        }
        assert_eq!(h.median(), Some(5.0));
        h.add(7);
        assert_eq!(h.median(), Some(6.0));
        assert_eq!(h.rank_value(0), Some(1));
        assert_eq!(h.rank_value(3), Some(9));
        assert_eq!(h.rank_value(4), None);
        assert_eq!(h.peak(), Some((1, 1)));
        h.add(9);
        assert_eq!(h.peak(), Some((9, 2)));
    }

    #[test]
    fn trimmed_mean_drops_single_outlier() {
        let mut h = BucketHistogram::new(500);
        let samples: Vec<i32> = (0..20).map(|i| 2 + (i % 3)).chain([400]).collect();
        for &v in &samples {
            h.add(v);
        }

        // 21 samples, keep round(18.9) = 19 smallest.
        let mut sorted = samples.clone();
        sorted.sort_unstable();
        let expected = sorted[..19].iter().sum::<i32>() as f32 / 19.0;

        let got = h.trimmed_mean(10.0).expect("non-empty");
        assert!((got - expected).abs() < 1e-5);
        assert!(got < 4.0);
        assert!(h.mean().expect("non-empty") > 20.0);
    }

    #[test]
    fn values_are_clamped_into_range() {
        let mut h = BucketHistogram::new(10);
        h.add(-4);
        h.add(55);
        assert_eq!(h.rank_value(0), Some(0));
        assert_eq!(h.rank_value(1), Some(9));
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.median(), None);
    }
}
