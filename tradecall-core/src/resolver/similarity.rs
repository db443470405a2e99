//! Ratcliff/Obershelp similarity ratio.
//!
//! `ratio = 2 * M / (|a| + |b|)` where `M` is the total length of the
//! matching blocks found by repeatedly taking the longest common substring
//! and recursing on both sides of it.

use std::collections::HashMap;

/// Similarity in `[0.0, 1.0]`; two empty strings score `1.0`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_len(&a, &b) as f64 / total as f64
}

/// Total length of matching blocks between `a` and `b`.
fn matched_len(a: &[char], b: &[char]) -> usize {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b_index.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b_index, alo, ahi, blo, bhi);
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

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, len)`; among equally long blocks the one starting
/// earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // run length of the match ending at b[j], for the previous row of a
    let mut run_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_index.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_at.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run.insert(j, k);
                if k > best_len {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_len = k;
                }
            }
        }
        run_at = next_run;
    }
    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(approx(ratio("NIFTY", "NIFTY"), 1.0));
        assert!(approx(ratio("", ""), 1.0));
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert!(approx(ratio("ABC", "XYZ"), 0.0));
        assert!(approx(ratio("ABC", ""), 0.0));
    }

    #[test]
    fn known_ratios() {
        // "abcd" vs "bcde": block "bcd" -> 2*3/8
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        // one dropped letter: 2*5/11
        assert!(approx(ratio("NIFTY", "NIFTTY"), 10.0 / 11.0));
        // BANKNIFTY vs BANKNIFY: "BANKNIF" + "Y" -> 2*8/17
        assert!(approx(ratio("BANKNIFTY", "BANKNIFY"), 16.0 / 17.0));
    }

    #[test]
    fn ratio_depends_on_argument_order() {
        assert!(approx(ratio("BKKNAK", "ANBBNB"), 1.0 / 3.0));
        assert!(approx(ratio("ANBBNB", "BKKNAK"), 1.0 / 6.0));
        assert!(approx(ratio("SENSEX", "ESX"), 4.0 / 9.0));
    }

    #[test]
    fn ratio_is_bounded() {
        for (a, b) in [("FINNIFTY", "MIDCPNIFTY"), ("SENSEX", "BANKEX"), ("X", "XX")] {
            let r = ratio(a, b);
            assert!((0.0..=1.0).contains(&r), "{a} vs {b} -> {r}");
        }
    }
}
