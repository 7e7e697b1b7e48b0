//! Block-based sequence similarity

use rustc_hash::FxHashMap;

/// Similarity of two strings in `[0, 1]`: `2 * M / T`, where `M` is the
/// total length of the matching blocks found by repeatedly taking the
/// longest common substring and recursing on both sides of it, and `T` is
/// the combined length. Two empty strings are fully similar.
///
/// The arguments are put in a canonical order first, so the result does
/// not depend on which side a string came from.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

pub(crate) fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let (a, b) = if (a.len(), a) <= (b.len(), b) { (a, b) } else { (b, a) };
    2.0 * matching_characters(a, b) as f64 / total as f64
}

/// Upper bound on `ratio` from the lengths alone
pub(crate) fn length_bound(la: usize, lb: usize) -> f64 {
    let total = la + lb;
    if total == 0 {
        1.0
    } else {
        2.0 * la.min(lb) as f64 / total as f64
    }
}

/// Character multiset of a string, for `multiset_bound`
pub(crate) fn char_counts(s: &[char]) -> FxHashMap<char, usize> {
    let mut counts = FxHashMap::default();
    for &c in s {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

/// Upper bound on `ratio` from shared characters, ignoring order
pub(crate) fn multiset_bound(
    a: &FxHashMap<char, usize>,
    la: usize,
    b: &FxHashMap<char, usize>,
    lb: usize,
) -> f64 {
    let total = la + lb;
    if total == 0 {
        return 1.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared: usize = small
        .iter()
        .map(|(c, &n)| n.min(large.get(c).copied().unwrap_or(0)))
        .sum();
    2.0 * shared as f64 / total as f64
}

/// Total length of the matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: FxHashMap<char, Vec<usize>> = FxHashMap::default();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &FxHashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // j2len[j] = length of the match ending at a[i - 1], b[j]
    let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: FxHashMap<usize, usize> = FxHashMap::default();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next;
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("123|Jon Smith", "123|Jon Smith"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_known_values() {
        // "abcd" / "bcde": one block "bcd"
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // 13 matched chars out of 27
        assert!((ratio("123|Jon Smith", "123|John Smith") - 26.0 / 27.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("tide", "diet"),
            ("abxcd", "abcd"),
            ("qabxcd", "abycdf"),
            ("private Thread currentThread;", "private volatile Thread currentThread;"),
        ];
        for (a, b) in pairs {
            assert_eq!(ratio(a, b), ratio(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_bounds_hold() {
        let a: Vec<char> = "123|Jon Smith".chars().collect();
        let b: Vec<char> = "321|Smith Jon".chars().collect();
        let r = ratio_chars(&a, &b);
        assert!(length_bound(a.len(), b.len()) >= r);
        assert!(multiset_bound(&char_counts(&a), a.len(), &char_counts(&b), b.len()) >= r);
    }
}
