//! Capped tail of engine diagnostic output.

use std::collections::VecDeque;

/// Keeps only the last `capacity` lines pushed into it.
#[derive(Debug, Clone)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticTail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_lines() {
        let mut tail = DiagnosticTail::new(3);
        for i in 0..10 {
            tail.push(format!("line {}", i));
        }
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.to_vec(), vec!["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut tail = DiagnosticTail::new(0);
        tail.push("a");
        tail.push("b");
        assert_eq!(tail.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_empty() {
        let tail = DiagnosticTail::new(5);
        assert!(tail.is_empty());
        assert!(tail.to_vec().is_empty());
    }
}
