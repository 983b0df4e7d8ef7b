use std::ops::AddAssign;

use serde::Serialize;

/// Edit operations needed to turn a reference sequence into a hypothesis.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EditOps {
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
}

impl EditOps {
    pub fn total(&self) -> usize {
        self.substitutions + self.deletions + self.insertions
    }

    pub fn is_exact(&self) -> bool {
        self.total() == 0
    }
}

impl AddAssign for EditOps {
    fn add_assign(&mut self, rhs: Self) {
        self.substitutions += rhs.substitutions;
        self.deletions += rhs.deletions;
        self.insertions += rhs.insertions;
    }
}

/// Unit-cost Levenshtein alignment over opaque symbols.
///
/// Symbols are compared with `==` only, so multi-character phones never
/// partially match. The returned counts follow one optimal path, preferring
/// match/substitution, then deletion, then insertion when walking back.
pub fn edit_ops<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> EditOps {
    let rows = reference.len() + 1;
    let width = hypothesis.len() + 1;
    let at = |i: usize, j: usize| i * width + j;

    let mut dist = vec![0usize; rows * width];
    for i in 0..rows {
        dist[at(i, 0)] = i;
    }
    for j in 0..width {
        dist[at(0, j)] = j;
    }
    for i in 1..rows {
        for j in 1..width {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            let sub = dist[at(i - 1, j - 1)] + cost;
            let del = dist[at(i - 1, j)] + 1;
            let ins = dist[at(i, j - 1)] + 1;
            dist[at(i, j)] = sub.min(del).min(ins);
        }
    }

    let mut ops = EditOps::default();
    let (mut i, mut j) = (rows - 1, width - 1);
    while i > 0 || j > 0 {
        let here = dist[at(i, j)];
        if i > 0 && j > 0 {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            if dist[at(i - 1, j - 1)] + cost == here {
                ops.substitutions += cost;
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && dist[at(i - 1, j)] + 1 == here {
            ops.deletions += 1;
            i -= 1;
        } else {
            ops.insertions += 1;
            j -= 1;
        }
    }
    ops
}
