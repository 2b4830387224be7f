//! Longest-matching-blocks (Ratcliff/Obershelp) similarity.
//!
//! `ratio = 2 * M / (len(a) + len(b))` where `M` counts the characters in the
//! longest common block plus, recursively, the blocks found to its left and
//! right. Lengths are in chars, not bytes.

/// Similarity of two strings in `[0, 1]`. Two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common block inside `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run[j + 1] = length of the common run ending at a[i - 1], b[j]
    let mut prev = vec![0usize; b_hi - b_lo + 1];
    let mut curr = vec![0usize; b_hi - b_lo + 1];

    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let k = j - b_lo + 1;
            curr[k] = if a[i] == b[j] { prev[k - 1] + 1 } else { 0 };
            if curr[k] > best_size {
                best_size = curr[k];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}
