use fxhash::FxHashMap;

/// Keys of positions reached in the real game, in order.
#[derive(Clone, Debug, Default)]
pub struct GameHistory {
    positions: FxHashMap<u64, u32>,
    history: Vec<u64>, // Keep track of order for undo
}

impl GameHistory {
    pub fn new() -> Self {
        Self {
            positions: FxHashMap::default(),
            history: Vec::with_capacity(256),
        }
    }

    pub fn push(&mut self, zobrist_key: u64) {
        self.history.push(zobrist_key);
        *self.positions.entry(zobrist_key).or_insert(0) += 1;
    }

    pub fn pop(&mut self) -> Option<u64> {
        let zobrist_key = self.history.pop()?;

        if let Some(count) = self.positions.get_mut(&zobrist_key) {
            if *count > 1 {
                *count -= 1;
            } else {
                self.positions.remove(&zobrist_key);
            }
        }

        Some(zobrist_key)
    }

    pub fn contains(&self, zobrist_key: u64) -> bool {
        self.positions.contains_key(&zobrist_key)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_survive_a_single_pop() {
        let mut history = GameHistory::new();
        history.push(10);
        history.push(20);
        history.push(10);

        assert_eq!(history.pop(), Some(10));
        assert!(history.contains(10));
        assert_eq!(history.pop(), Some(20));
        assert!(!history.contains(20));
        assert_eq!(history.len(), 1);
    }
}
