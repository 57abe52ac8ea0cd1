/// Fixed-size window over the most recent values with a running sum.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    values: Vec<i32>,
    next: usize,
    len: usize,
    sum: i64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0; capacity.max(1)],
            next: 0,
            len: 0,
            sum: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }

    pub fn push(&mut self, v: i32) {
        if self.is_full() {
            self.sum -= self.values[self.next] as i64;
        } else {
            self.len += 1;
        }
        self.values[self.next] = v;
        self.sum += v as i64;
        self.next = (self.next + 1) % self.values.len();
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// Mean of the buffered values rounded to the nearest integer, 0 when empty.
    pub fn mean(&self) -> i32 {
        if self.len == 0 {
            return 0;
        }
        (self.sum as f64 / self.len as f64).round() as i32
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.len = 0;
        self.sum = 0;
    }
}
