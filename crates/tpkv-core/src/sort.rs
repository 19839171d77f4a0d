//! Composite-key ordering for result rows.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    }
}

type KeyCmp<'a, T> = Box<dyn Fn(&T, &T) -> Ordering + 'a>;

/// A chain of sort keys, each with its own direction. Later keys only break
/// ties left by earlier ones; rows equal on every key keep their input order.
pub struct OrderBy<'a, T> {
    keys: Vec<KeyCmp<'a, T>>,
}

impl<'a, T: 'a> Default for OrderBy<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: 'a> OrderBy<'a, T> {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn then<K, F>(mut self, dir: Direction, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + 'a,
    {
        self.keys
            .push(Box::new(move |a: &T, b: &T| dir.apply(key(a).cmp(&key(b)))));
        self
    }

    /// Float key compared with `total_cmp`, so NaN sorts deterministically.
    pub fn then_f64<F>(mut self, dir: Direction, key: F) -> Self
    where
        F: Fn(&T) -> f64 + 'a,
    {
        self.keys
            .push(Box::new(move |a: &T, b: &T| dir.apply(key(a).total_cmp(&key(b)))));
        self
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    pub fn sort(&self, rows: &mut [T]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}
