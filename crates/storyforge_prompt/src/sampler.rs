//! Random line selection from a scene corpus.

use rand::Rng;
use std::collections::BTreeSet;

/// Pick up to `count` lines from newline-delimited `corpus`.
///
/// Lines are trimmed and blank lines ignored. After a line is picked, it and
/// its neighbours (one above, two below) become ineligible, so consecutive
/// corpus lines never appear together. Sampling stops early once every line
/// is ineligible. The picks are returned in corpus order.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use storyforge_prompt::sample_lines;
///
/// let corpus = "a\nb\nc\nd\ne\nf\ng\nh";
/// let mut rng = StdRng::seed_from_u64(7);
/// let picked = sample_lines(corpus, 2, &mut rng);
/// assert_eq!(picked.len(), 2);
/// ```
pub fn sample_lines<R: Rng + ?Sized>(corpus: &str, count: usize, rng: &mut R) -> Vec<String> {
    let lines: Vec<&str> = corpus
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let total = lines.len();

    let mut excluded = vec![false; total];
    let mut remaining = total;
    let mut selected = BTreeSet::new();

    while selected.len() < count && remaining > 0 {
        let candidates: Vec<usize> = (0..total).filter(|&i| !excluded[i]).collect();
        let picked = candidates[rng.gen_range(0..candidates.len())];
        selected.insert(picked);

        let low = picked.saturating_sub(1);
        let high = (picked + 2).min(total - 1);
        for slot in &mut excluded[low..=high] {
            if !*slot {
                *slot = true;
                remaining -= 1;
            }
        }
    }

    selected.into_iter().map(|i| lines[i].to_string()).collect()
}
