use derive_new::new;

/// One step of an edit script, read from the start of both sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert,
    Delete,
    Match,
}

/// Shortest sequence of inserts and deletes turning `src` into `dst`.
pub fn shortest_edit_script<T: Eq>(src: &[T], dst: &[T]) -> Vec<EditOp> {
    MyersDiff::new(src, dst).diff()
}

/// Myers' greedy O((N+M)·D) diff
///
/// For every edit distance `d` the frontier `v` maps a diagonal `k = x - y` to
/// the furthest `x` reached on it. The frontier of every round is kept in a
/// trace so the path can be recovered by walking it backwards from `(N, M)`.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<'d, T: Eq> MyersDiff<'d, T> {
    // diagonals -d-1..=d+1 are read while filling round d, keep them in bounds
    fn offset(&self) -> isize {
        (self.a.len() + self.b.len()) as isize + 1
    }

    fn index(&self, k: isize) -> usize {
        (self.offset() + k) as usize
    }

    /// Frontier snapshots taken before each round, up to the round reaching `(N, M)`
    pub fn shortest_edit(&self) -> Vec<Vec<isize>> {
        let (n, m) = (self.a.len() as isize, self.b.len() as isize);
        let max = n + m;

        let mut v = vec![0; (2 * self.offset() + 1) as usize];
        let mut trace = Vec::new();

        for d in 0..=max {
            trace.push(v.clone());

            for k in (-d..=d).step_by(2) {
                let mut x = if k == -d || (k != d && v[self.index(k - 1)] < v[self.index(k + 1)])
                {
                    // moving down from k+1, an insertion
                    v[self.index(k + 1)]
                } else {
                    // moving right from k-1, a deletion
                    v[self.index(k - 1)] + 1
                };
                let mut y = x - k;

                while x < n && y < m && self.a[x as usize] == self.b[y as usize] {
                    // snake
                    x += 1;
                    y += 1;
                }

                v[self.index(k)] = x;

                if x >= n && y >= m {
                    return trace;
                }
            }
        }

        trace
    }

    /// Walk the trace backwards, returning the edit script from the end to the start
    fn backtrack(&self) -> Vec<EditOp> {
        let (mut x, mut y) = (self.a.len() as isize, self.b.len() as isize);
        let mut script = Vec::new();

        for (d, v) in self.shortest_edit().iter().enumerate().rev() {
            let d = d as isize;
            let k = x - y;

            let prev_k = if k == -d || (k != d && v[self.index(k - 1)] < v[self.index(k + 1)]) {
                k + 1
            } else {
                k - 1
            };
            let prev_x = v[self.index(prev_k)];
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                script.push(EditOp::Match);
                x -= 1;
                y -= 1;
            }

            if d > 0 {
                script.push(if x == prev_x {
                    EditOp::Insert
                } else {
                    EditOp::Delete
                });
            }

            (x, y) = (prev_x, prev_y);
        }

        script
    }

    pub fn diff(&self) -> Vec<EditOp> {
        let mut script = self.backtrack();
        script.reverse();
        script
    }

    /// Number of inserts and deletes in the shortest edit script
    pub fn edit_distance(&self) -> usize {
        self.shortest_edit().len().saturating_sub(1)
    }
}
