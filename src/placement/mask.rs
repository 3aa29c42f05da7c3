//! Data masking and the selection of the mask pattern.
//!
//! A mask inverts the data modules for which a pattern function of the row
//! `i` and column `j` is true. QR symbols choose among eight patterns, Micro
//! QR among four of them and rMQR always uses pattern 4.
use super::{format, MatrixMap};
use crate::symbol_size::{EcLevel, Version};

#[cfg(test)]
use pretty_assertions::assert_eq;

const MICRO_PATTERNS: [u8; 4] = [1, 4, 6, 7];
const RMQR_PATTERN: u8 = 4;

/// Evaluate the QR mask pattern function.
pub fn is_masked(pattern: u8, i: usize, j: usize) -> bool {
    match pattern {
        0 => (i + j) % 2 == 0,
        1 => i % 2 == 0,
        2 => j % 3 == 0,
        3 => (i + j) % 3 == 0,
        4 => (i / 2 + j / 3) % 2 == 0,
        5 => (i * j) % 2 + (i * j) % 3 == 0,
        6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
        7 => ((i + j) % 2 + (i * j) % 3) % 2 == 0,
        _ => false,
    }
}

/// Number of masks selectable in the version.
pub fn num_masks(version: Version) -> u8 {
    match version {
        Version::Qr(_) => 8,
        Version::Micro(_) => 4,
        Version::Rmqr(_) => 1,
    }
}

/// The pattern function of a mask id, `None` if the id is not defined for the version.
fn pattern(version: Version, mask: u8) -> Option<u8> {
    match version {
        Version::Qr(_) => (mask < 8).then_some(mask),
        Version::Micro(_) => MICRO_PATTERNS.get(mask as usize).copied(),
        Version::Rmqr(_) => (mask == 0).then_some(RMQR_PATTERN),
    }
}

/// Invert the data modules selected by the mask.
///
/// Applying the same mask twice restores the grid. Undefined masks leave it unchanged.
pub fn apply(map: &mut MatrixMap<bool>, mask: u8) {
    let Some(pattern) = pattern(map.version(), mask) else {
        return;
    };
    for i in 0..map.height() {
        for j in 0..map.width() {
            if !map.is_reserved(i, j) && is_masked(pattern, i, j) {
                map.toggle(i, j);
            }
        }
    }
}

fn line_penalty(line: impl Iterator<Item = bool> + Clone) -> u32 {
    const FINDER_LIKE: [[bool; 11]; 2] = [
        [true, false, true, true, true, false, true, false, false, false, false],
        [false, false, false, false, true, false, true, true, true, false, true],
    ];
    let mut penalty = 0;

    // runs of five or more modules of the same color
    let mut run = 0;
    let mut last = None;
    for dark in line.clone() {
        if last == Some(dark) {
            run += 1;
        } else {
            if run >= 5 {
                penalty += 3 + (run - 5);
            }
            run = 1;
            last = Some(dark);
        }
    }
    if run >= 5 {
        penalty += 3 + (run - 5);
    }

    // 1:1:3:1:1 patterns with four light modules on one side, the
    // surroundings of the symbol count as light
    let padded: alloc::vec::Vec<bool> = [false; 4]
        .into_iter()
        .chain(line)
        .chain([false; 4])
        .collect();
    for window in padded.windows(11) {
        if FINDER_LIKE.iter().any(|p| p == window) {
            penalty += 40;
        }
    }
    penalty
}

/// Penalty score of a QR symbol, lower is better.
pub fn penalty(map: &MatrixMap<bool>) -> u32 {
    let (w, h) = (map.width(), map.height());
    let mut score = 0;
    for i in 0..h {
        score += line_penalty((0..w).map(|j| *map.get(i, j)));
    }
    for j in 0..w {
        score += line_penalty((0..h).map(|i| *map.get(i, j)));
    }

    // 2x2 blocks of one color
    for i in 0..h - 1 {
        for j in 0..w - 1 {
            let c = *map.get(i, j);
            if *map.get(i, j + 1) == c && *map.get(i + 1, j) == c && *map.get(i + 1, j + 1) == c {
                score += 3;
            }
        }
    }

    let dark = (0..h)
        .flat_map(|i| (0..w).map(move |j| (i, j)))
        .filter(|(i, j)| *map.get(*i, *j))
        .count() as u32;
    score + balance_penalty(dark, (w * h) as u32)
}

/// `10 * k` with `k = ceil(|dark% - 50| / 5) - 1`.
fn balance_penalty(dark: u32, total: u32) -> u32 {
    let deviation = (dark * 20).abs_diff(total * 10);
    let k = ((deviation + total - 1) / total).saturating_sub(1);
    10 * k
}

/// Score of a Micro QR symbol, higher is better.
///
/// Counts the dark modules on the right and the bottom edge, without the
/// timing patterns.
pub fn micro_score(map: &MatrixMap<bool>) -> u32 {
    let (w, h) = (map.width(), map.height());
    let right = (1..h).filter(|i| *map.get(*i, w - 1)).count() as u32;
    let bottom = (1..w).filter(|j| *map.get(h - 1, *j)).count() as u32;
    right.min(bottom) * 16 + right.max(bottom)
}

/// Pick the mask for a grid with the data placed.
///
/// Every candidate is scored with the format information written.
pub fn choose(map: &MatrixMap<bool>, level: EcLevel) -> u8 {
    let version = map.version();
    let mut best: Option<(u8, u32)> = None;
    for mask in 0..num_masks(version) {
        let mut candidate = map.clone();
        apply(&mut candidate, mask);
        format::write(&mut candidate, level, mask);
        let better = match version {
            Version::Qr(_) => {
                let score = penalty(&candidate);
                tracing::trace!(mask, score, "mask penalty");
                best.map_or(true, |(_, s)| score < s).then_some(score)
            }
            Version::Micro(_) => {
                let score = micro_score(&candidate);
                tracing::trace!(mask, score, "mask score");
                best.map_or(true, |(_, s)| score > s).then_some(score)
            }
            Version::Rmqr(_) => best.is_none().then_some(0),
        };
        if let Some(score) = better {
            best = Some((mask, score));
        }
    }
    best.map_or(0, |(mask, _)| mask)
}

#[test]
fn test_mask_is_involution() {
    for version in [Version::Qr(3), Version::Micro(4), Version::Rmqr(crate::symbol_size::RmqrSize::R9x59)] {
        let template = MatrixMap::<bool>::new(version);
        for mask in 0..num_masks(version) {
            let mut map = template.clone();
            apply(&mut map, mask);
            assert_ne!(map, template);
            apply(&mut map, mask);
            assert_eq!(map, template);
        }
    }
}

#[test]
fn test_mask_only_data_modules() {
    let template = MatrixMap::<bool>::new(Version::Qr(2));
    let mut map = template.clone();
    apply(&mut map, 0);
    for i in 0..25 {
        for j in 0..25 {
            if map.is_reserved(i, j) {
                assert_eq!(map.get(i, j), template.get(i, j));
            } else {
                assert_eq!(*map.get(i, j), (i + j) % 2 == 0);
            }
        }
    }
}

#[test]
fn test_micro_patterns() {
    let mut map = MatrixMap::<bool>::new(Version::Micro(2));
    apply(&mut map, 2);
    // pattern 6: ((i * j) % 2 + (i * j) % 3) % 2 == 0
    assert_eq!(*map.get(9, 9), is_masked(6, 9, 9));
    assert_eq!(*map.get(11, 10), is_masked(6, 11, 10));
    let mut unchanged = map.clone();
    apply(&mut unchanged, 4);
    assert_eq!(unchanged, map);
}

#[test]
fn test_line_penalty() {
    let line = |s: &str| s.chars().map(|c| c == '#').collect::<alloc::vec::Vec<_>>();
    // one run of 7 light modules and one of 5 dark modules
    assert_eq!(line_penalty(line(".......#####.#").into_iter()), 5 + 3);
    // finder like pattern at the start, light border outside
    assert_eq!(line_penalty(line("#.###.#.#.#.#").into_iter()), 40);
    assert_eq!(line_penalty(line("#.#.#.#.#.#").into_iter()), 0);
}

#[test]
fn test_balance_penalty() {
    // the template of version 1 is mostly light
    let map = MatrixMap::<bool>::new(Version::Qr(1));
    let dark = (0..21)
        .flat_map(|i| (0..21).map(move |j| (i, j)))
        .filter(|(i, j)| *map.get(*i, *j))
        .count();
    assert!(dark * 100 / 441 < 40);
    let mut all_dark = map.clone();
    for i in 0..21 {
        for j in 0..21 {
            all_dark.set(i, j, true);
        }
    }
    // 100% dark: k = ceil(50 / 5) - 1 = 9, one run of 21 per line, 400 blocks
    assert_eq!(penalty(&all_dark), 42 * (3 + 16) + 400 * 3 + 90);
}

#[test]
fn test_balance_steps() {
    assert_eq!(balance_penalty(500, 1000), 0);
    assert_eq!(balance_penalty(550, 1000), 0);
    assert_eq!(balance_penalty(551, 1000), 10);
    assert_eq!(balance_penalty(449, 1000), 10);
    assert_eq!(balance_penalty(600, 1000), 10);
    assert_eq!(balance_penalty(601, 1000), 20);
    assert_eq!(balance_penalty(0, 1000), 90);
    assert_eq!(balance_penalty(441, 441), 90);
}

#[test]
fn test_micro_score() {
    let mut map = MatrixMap::<bool>::new(Version::Micro(1));
    assert_eq!(micro_score(&map), 0);
    for k in 1..11 {
        map.set(k, 10, true);
    }
    map.set(10, 3, true);
    map.set(10, 4, true);
    // right edge 10 dark (including the corner), bottom edge 3
    assert_eq!(micro_score(&map), 3 * 16 + 10);
}
