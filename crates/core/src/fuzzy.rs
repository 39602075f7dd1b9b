use crate::config::{Containment, ResolverConfig};
use crate::normalize::normalize_for_compare;

/// An option accepted by the matcher. `label` borrows the caller's option
/// verbatim so no tier can hand back text outside the option set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub label: &'a str,
    pub index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuzzyMatcher {
    containment: Containment,
    fold_diacritics: bool,
}

impl FuzzyMatcher {
    pub fn new(containment: Containment, fold_diacritics: bool) -> Self {
        Self {
            containment,
            fold_diacritics,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.containment, config.fold_diacritics)
    }

    /// Containment short-circuit: the first option (in list order) whose
    /// normalized text satisfies the containment rule, with score 1.0.
    pub fn contains<'a>(&self, query: &str, options: &'a [String]) -> Option<FuzzyMatch<'a>> {
        let query = self.normalize(query);
        if query.is_empty() {
            return None;
        }

        options.iter().enumerate().find_map(|(index, option)| {
            self.containment
                .matches(&query, &self.normalize(option))
                .then_some(FuzzyMatch {
                    label: option.as_str(),
                    index,
                    score: 1.0,
                })
        })
    }

    /// Highest similarity ratio over all options; earlier options win ties.
    /// Returns `None` when the best ratio is below `threshold`.
    pub fn most_similar<'a>(
        &self,
        query: &str,
        options: &'a [String],
        threshold: f32,
    ) -> Option<FuzzyMatch<'a>> {
        let query = self.normalize(query);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<FuzzyMatch<'a>> = None;
        for (index, option) in options.iter().enumerate() {
            let score = similarity_ratio(&query, &self.normalize(option));
            if best.map_or(true, |current| score > current.score) {
                best = Some(FuzzyMatch {
                    label: option.as_str(),
                    index,
                    score,
                });
            }
        }

        best.filter(|candidate| candidate.score >= threshold)
    }

    /// Containment first, then similarity ranking.
    pub fn find<'a>(
        &self,
        query: &str,
        options: &'a [String],
        threshold: f32,
    ) -> Option<FuzzyMatch<'a>> {
        if options.is_empty() {
            return None;
        }
        self.contains(query, options)
            .or_else(|| self.most_similar(query, options, threshold))
    }

    fn normalize(&self, text: &str) -> String {
        normalize_for_compare(text, self.fold_diacritics)
    }
}

/// Fuzzy match with the default containment direction and no diacritic
/// folding.
pub fn fuzzy_match<'a>(
    query: &str,
    options: &'a [String],
    threshold: f32,
) -> Option<FuzzyMatch<'a>> {
    FuzzyMatcher::default().find(query, options, threshold)
}

/// Gestalt pattern matching ratio, `2 * M / (len(a) + len(b))`, where `M`
/// counts characters in matching blocks found by recursively taking the
/// longest common substring.
pub fn similarity_ratio(a: &str, b: &str) -> f32 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b);
    (2 * matched) as f32 / total as f32
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_common_block(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;

        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]`, preferring
/// the earliest start in `a`, then in `b`.
fn longest_common_block(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut previous = vec![0_usize; width + 1];
    let mut current = vec![0_usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let run = previous[slot - 1] + 1;
                current[slot] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            } else {
                current[slot] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
