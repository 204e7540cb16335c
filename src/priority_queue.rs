/// Bucket priority queue for region growing over quantized edge weights.
///
/// Priorities are discrete (0..n_bins); the highest non-empty bin is popped
/// first so that the most reliable edges are unwrapped before noisy ones.
pub struct BucketQueue<T> {
    bins: Vec<Vec<T>>,
    top: Option<usize>,
    count: usize,
}

impl<T> BucketQueue<T> {
    pub fn new(n_bins: usize) -> Self {
        BucketQueue {
            bins: (0..n_bins.max(1)).map(|_| Vec::new()).collect(),
            top: None,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Priorities above the last bin are clamped into it
    #[inline]
    pub fn push(&mut self, priority: usize, item: T) {
        let priority = priority.min(self.bins.len() - 1);
        self.bins[priority].push(item);
        self.count += 1;
        if self.top.map_or(true, |t| priority > t) {
            self.top = Some(priority);
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let mut p = self.top?;
        while self.bins[p].is_empty() {
            if p == 0 {
                self.top = None;
                return None;
            }
            p -= 1;
        }
        self.top = Some(p);
        self.count -= 1;
        self.bins[p].pop()
    }
}
