/// Append-only in-memory storage of accepted solver steps.
///
/// Entries are never mutated after insertion. On a failed solve the storage
/// keeps everything accepted before the failure.
#[derive(Debug, Clone)]
pub struct MemoryResult<State> {
    t: Vec<f64>,
    y: Vec<State>,
}

impl<State: Clone> MemoryResult<State> {
    pub fn new(capacity: usize) -> Self {
        Self {
            t: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, t: f64, state: &State) {
        debug_assert!(
            self.t.last().is_none_or(|last| t > *last),
            "steps must be recorded in increasing time order"
        );
        self.t.push(t);
        self.y.push(state.clone());
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn last(&self) -> Option<(f64, &State)> {
        match (self.t.last(), self.y.last()) {
            (Some(t), Some(y)) => Some((*t, y)),
            _ => None,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn states(&self) -> &[State] {
        &self.y
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &State)> {
        self.t.iter().copied().zip(self.y.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_back() {
        let mut result = MemoryResult::new(4);
        result.push(0.0, &1.5);
        result.push(0.1, &2.5);
        assert_eq!(result.len(), 2);
        assert_eq!(result.last(), Some((0.1, &2.5)));
        let collected: Vec<_> = result.iter().map(|(t, y)| (t, *y)).collect();
        assert_eq!(collected, vec![(0.0, 1.5), (0.1, 2.5)]);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut result = MemoryResult::new(1);
        for i in 0..100 {
            result.push(i as f64, &(i as f64));
        }
        assert_eq!(result.len(), 100);
        assert_eq!(result.times()[99], 99.0);
    }
}
