use crate::shared::region::Region;

/// Relative tolerance used when clustering raw cascade hits.
pub const GROUP_EPS: f64 = 0.2;

/// Clusters overlapping raw hits into detections.
///
/// Hits are partitioned by edge similarity, clusters with `min_neighbors`
/// or fewer members are discarded, and each survivor becomes the average
/// rectangle of its cluster. Clusters lying inside a better-supported
/// cluster are dropped. With `min_neighbors == 0` the raw hits are returned
/// unchanged.
pub fn group_rectangles(rects: &[Region], min_neighbors: u32, eps: f64) -> Vec<Region> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let labels = partition(rects, eps);
    let class_count = labels.iter().copied().max().map_or(0, |m| m + 1);

    let mut sums = vec![(0i64, 0i64, 0i64, 0i64); class_count];
    let mut counts = vec![0u32; class_count];
    for (rect, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s.0 += rect.x as i64;
        s.1 += rect.y as i64;
        s.2 += rect.width as i64;
        s.3 += rect.height as i64;
        counts[label] += 1;
    }

    let averaged: Vec<Region> = sums
        .iter()
        .zip(&counts)
        .map(|(&(x, y, w, h), &n)| {
            let n = n as f64;
            Region::new(
                (x as f64 / n).round() as i32,
                (y as f64 / n).round() as i32,
                (w as f64 / n).round() as i32,
                (h as f64 / n).round() as i32,
            )
        })
        .collect();

    let mut grouped = Vec::new();
    for (i, (r1, &n1)) in averaged.iter().zip(&counts).enumerate() {
        if n1 <= min_neighbors {
            continue;
        }
        let nested = averaged.iter().zip(&counts).enumerate().any(|(j, (r2, &n2))| {
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.x + r1.width <= r2.x + r2.width + dx
                && r1.y + r1.height <= r2.y + r2.height + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !nested {
            grouped.push(*r1);
        }
    }
    grouped
}

fn similar(a: &Region, b: &Region, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.x + a.width - b.x - b.width).abs() as f64 <= delta
        && (a.y + a.height - b.y - b.height).abs() as f64 <= delta
}

/// Union-find partition; labels are numbered by first appearance.
fn partition(rects: &[Region], eps: f64) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..rects.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rects.len() {
        for j in 0..i {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    let mut label_of_root = vec![usize::MAX; rects.len()];
    let mut next = 0;
    (0..rects.len())
        .map(|i| {
            let root = find(&mut parent, i);
            if label_of_root[root] == usize::MAX {
                label_of_root[root] = next;
                next += 1;
            }
            label_of_root[root]
        })
        .collect()
}
