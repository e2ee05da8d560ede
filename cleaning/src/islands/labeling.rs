//! Connected component labeling using union-find over horizontal runs.

use common::{BitBuffer2, Buffer2};
use serde::{Deserialize, Serialize};

/// Pixel connectivity for connected component labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors are connected.
    #[default]
    Four,
    /// Diagonal neighbors are connected too.
    Eight,
}

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32, // inclusive
    end: u32,   // exclusive
    label: u32,
}

impl Run {
    /// Window of x in the previous row that may touch this run (end exclusive).
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

/// Extract runs from one row using trailing-zero scans over the packed words.
fn extract_runs(row_words: &[u64], width: usize, runs: &mut Vec<Run>) {
    let mut run_start: Option<u32> = None;

    for (word_idx, &word) in row_words.iter().enumerate() {
        let base_x = (word_idx * 64) as u32;
        let word_end = (base_x + 64).min(width as u32);
        let mut pos = base_x;

        while pos < word_end {
            let remaining = word >> (pos - base_x);
            match run_start {
                Some(start) => {
                    // next zero bit closes the run
                    let ones = (!remaining).trailing_zeros();
                    let end = pos + ones;
                    if end >= word_end {
                        break;
                    }
                    runs.push(Run {
                        start,
                        end,
                        label: 0,
                    });
                    run_start = None;
                    pos = end;
                }
                None => {
                    if remaining == 0 {
                        break;
                    }
                    let start = pos + remaining.trailing_zeros();
                    if start >= word_end {
                        break;
                    }
                    run_start = Some(start);
                    pos = start;
                }
            }
        }
    }

    if let Some(start) = run_start {
        runs.push(Run {
            start,
            end: width as u32,
            label: 0,
        });
    }
}

/// A 2D label map from connected component analysis. Label 0 is background.
#[derive(Debug)]
pub struct LabelMap {
    labels: Buffer2<u32>,
    num_labels: usize,
}

impl LabelMap {
    pub fn from_mask(mask: &BitBuffer2, connectivity: Connectivity) -> Self {
        let width = mask.width();
        let height = mask.height();
        let mut labels = Buffer2::new_filled(width, height, 0u32);

        let mut uf = UnionFind::new();
        let mut prev_runs: Vec<Run> = Vec::new();
        let mut curr_runs: Vec<Run> = Vec::new();

        for y in 0..height {
            curr_runs.clear();
            extract_runs(mask.row_words(y), width, &mut curr_runs);

            if curr_runs.is_empty() {
                prev_runs.clear();
                continue;
            }

            merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);

            let row = labels.row_mut(y);
            for run in &curr_runs {
                row[run.start as usize..run.end as usize].fill(run.label);
            }

            std::mem::swap(&mut prev_runs, &mut curr_runs);
        }

        let num_labels = uf.flatten_labels(labels.pixels_mut());
        Self { labels, num_labels }
    }

    /// Number of connected components (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        self.labels.pixels()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }
}

/// Merge the current row's runs with the previous row's via union-find.
fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned_label = None;
        let mut check_idx = prev_idx;
        while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
            let prev_run = &prev_runs[check_idx];
            if runs_connected(prev_run, run, connectivity) {
                match assigned_label {
                    Some(label) if label != prev_run.label => uf.union(label, prev_run.label),
                    None => assigned_label = Some(prev_run.label),
                    _ => {}
                }
            }
            check_idx += 1;
        }

        run.label = assigned_label.unwrap_or_else(|| uf.make_set());
    }
}

/// Sequential union-find over provisional labels `1..`.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: Vec::new() }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[(root - 1) as usize] != root {
            root = self.parent[(root - 1) as usize];
        }

        let mut current = label;
        while current != root {
            let next = self.parent[(current - 1) as usize];
            self.parent[(current - 1) as usize] = root;
            current = next;
        }

        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Relabel to sequential `1..=n` in order of first appearance of each root.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        let len = self.parent.len();
        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }

        for l in labels.iter_mut() {
            *l = label_map[*l as usize];
        }

        num_labels as usize
    }
}
