//! Clustering of overlapping raw detections.

/// Similarity tolerance used when merging overlapping windows.
pub(crate) const GROUP_EPS: f64 = 0.2;

/// Signed rectangle used while scanning and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Merges clusters of similar rectangles into their average.
///
/// A cluster survives only if it holds more than `min_neighbors` members and
/// is not nested inside a stronger cluster. With `min_neighbors == 0` the raw
/// rectangles are returned untouched.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn group_rectangles(rects: Vec<Rect>, min_neighbors: u32, eps: f64) -> Vec<Rect> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects;
    }

    let (labels, class_count) = partition(&rects, eps);

    let mut sums = vec![(0_i64, 0_i64, 0_i64, 0_i64); class_count];
    let mut counts = vec![0_u32; class_count];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s.0 += i64::from(r.x);
        s.1 += i64::from(r.y);
        s.2 += i64::from(r.width);
        s.3 += i64::from(r.height);
        counts[label] += 1;
    }

    let averaged: Vec<Rect> = sums
        .iter()
        .zip(&counts)
        .map(|(&(x, y, w, h), &n)| {
            let n = f64::from(n);
            Rect::new(
                round(x as f64 / n),
                round(y as f64 / n),
                round(w as f64 / n),
                round(h as f64 / n),
            )
        })
        .collect();

    let mut out = Vec::new();
    for (i, (r1, &n1)) in averaged.iter().zip(&counts).enumerate() {
        if n1 <= min_neighbors {
            continue;
        }

        let nested = averaged.iter().zip(&counts).enumerate().any(|(j, (r2, &n2))| {
            if i == j || n2 <= min_neighbors {
                return false;
            }
            let dx = round(f64::from(r2.width) * eps);
            let dy = round(f64::from(r2.height) * eps);
            (n2 > n1.max(3) || n1 < 3)
                && r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.x + r1.width <= r2.x + r2.width + dx
                && r1.y + r1.height <= r2.y + r2.height + dy
        });

        if !nested {
            out.push(*r1);
        }
    }
    out
}

/// Whether two rectangles are close enough to belong to one cluster.
fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta =
        eps * (f64::from(a.width.min(b.width)) + f64::from(a.height.min(b.height))) * 0.5;
    f64::from((a.x - b.x).abs()) <= delta
        && f64::from((a.y - b.y).abs()) <= delta
        && f64::from((a.x + a.width - b.x - b.width).abs()) <= delta
        && f64::from((a.y + a.height - b.y - b.height).abs()) <= delta
}

/// Union-find over the similarity relation.
///
/// Class labels are numbered in order of first appearance.
fn partition(rects: &[Rect], eps: f64) -> (Vec<usize>, usize) {
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut classes = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if class_of_root[root] == usize::MAX {
            class_of_root[root] = classes;
            classes += 1;
        }
        labels.push(class_of_root[root]);
    }
    (labels, classes)
}

#[allow(clippy::cast_possible_truncation)]
fn round(v: f64) -> i32 {
    v.round_ties_even() as i32
}
