use std::cmp::Ordering;

/// Squared Euclidean distance; ranks identically to L2.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the stored vector.
    pub position: usize,
    /// L2 distance to the query.
    pub distance: f32,
}

/// Exact nearest-neighbour scan.
///
/// Returns at most `k` neighbours by ascending distance; equal distances
/// keep insertion order.
pub fn nearest<'a, I>(query: &[f32], vectors: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f32)> =
        vectors.into_iter().enumerate().map(|(i, v)| (i, squared_l2(query, v))).collect();
    let by_rank = |a: &(usize, f32), b: &(usize, f32)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));
    if scored.len() > k {
        scored.select_nth_unstable_by(k - 1, by_rank);
        scored.truncate(k);
    }
    scored.sort_by(by_rank);
    scored
        .into_iter()
        .map(|(position, d)| Neighbor { position, distance: d.sqrt() })
        .collect()
}

/// Orders neighbours as [`nearest`] does.
pub fn compare(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(vs: &[Vec<f32>]) -> impl Iterator<Item = &[f32]> {
        vs.iter().map(Vec::as_slice)
    }

    #[test]
    fn returns_closest_first() {
        let vs = vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![1.0, 0.0]];
        let hits = nearest(&[0.9, 0.0], refs(&vs), 2);
        assert_eq!(hits.iter().map(|n| n.position).collect::<Vec<_>>(), vec![2, 0]);
        assert!((hits[0].distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let vs = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0], vec![0.0, -1.0]];
        let hits = nearest(&[0.0, 0.0], refs(&vs), 3);
        assert_eq!(hits.iter().map(|n| n.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let vs = vec![vec![3.0], vec![1.0]];
        let hits = nearest(&[0.0], refs(&vs), 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn empty_corpus_or_zero_k() {
        let vs: Vec<Vec<f32>> = Vec::new();
        assert!(nearest(&[0.0], refs(&vs), 3).is_empty());
        let vs = vec![vec![0.0]];
        assert!(nearest(&[0.0], refs(&vs), 0).is_empty());
    }

    #[test]
    fn partial_selection_matches_full_sort() {
        let vs: Vec<Vec<f32>> = (0..50).map(|i| vec![((i * 37) % 50) as f32, (i % 7) as f32]).collect();
        let all = nearest(&[10.0, 3.0], refs(&vs), 50);
        let top = nearest(&[10.0, 3.0], refs(&vs), 5);
        assert_eq!(&all[..5], &top[..]);
        assert!(all.windows(2).all(|w| compare(&w[0], &w[1]).is_le()));
    }
}
