//! Function patterns and reserved areas of the symbol templates.
use super::{Bit, MatrixMap};
use crate::symbol_size::{RmqrSize, Version};

#[cfg(test)]
use pretty_assertions::assert_eq;

pub(super) fn draw<B: Bit>(map: &mut MatrixMap<B>) {
    match map.version() {
        Version::Qr(v) => draw_qr(map, v),
        Version::Micro(_) => draw_micro(map),
        Version::Rmqr(size) => draw_rmqr(map, size),
    }
}

/// 7x7 finder pattern with its light separator, clipped at the border.
fn finder<B: Bit>(map: &mut MatrixMap<B>, ci: isize, cj: isize) {
    for di in -4..=4isize {
        for dj in -4..=4isize {
            let d = di.abs().max(dj.abs());
            map.put_clipped(ci + di, cj + dj, d != 2 && d != 4);
        }
    }
}

/// 5x5 alignment pattern, also the rMQR sub-finder.
fn alignment<B: Bit>(map: &mut MatrixMap<B>, ci: usize, cj: usize) {
    for i in ci - 2..=ci + 2 {
        for j in cj - 2..=cj + 2 {
            let d = i.abs_diff(ci).max(j.abs_diff(cj));
            map.put(i, j, d != 1);
        }
    }
}

fn reserve<B: Bit>(map: &mut MatrixMap<B>, i: usize, j: usize) {
    if !map.is_reserved(i, j) {
        map.put(i, j, false);
    }
}

fn draw_qr<B: Bit>(map: &mut MatrixMap<B>, v: u8) {
    let n = map.width();
    for k in 0..n {
        map.put(6, k, k % 2 == 0);
        map.put(k, 6, k % 2 == 0);
    }
    let far = n as isize - 4;
    finder(map, 3, 3);
    finder(map, 3, far);
    finder(map, far, 3);

    let positions = map.version().alignment_positions();
    let last = positions.len().saturating_sub(1);
    for (a, &row) in positions.iter().enumerate() {
        for (b, &col) in positions.iter().enumerate() {
            if (a, b) == (0, 0) || (a, b) == (0, last) || (a, b) == (last, 0) {
                continue;
            }
            alignment(map, row, col);
        }
    }

    for k in 0..9 {
        reserve(map, 8, k);
        reserve(map, k, 8);
    }
    for k in 0..8 {
        map.put(8, n - 1 - k, false);
        map.put(n - 1 - k, 8, false);
    }
    // dark module
    map.put(n - 8, 8, true);

    if v >= 7 {
        for i in 0..6 {
            for j in 0..3 {
                map.put(i, n - 11 + j, false);
                map.put(n - 11 + j, i, false);
            }
        }
    }
}

fn draw_micro<B: Bit>(map: &mut MatrixMap<B>) {
    let n = map.width();
    for k in 0..n {
        map.put(0, k, k % 2 == 0);
        map.put(k, 0, k % 2 == 0);
    }
    finder(map, 3, 3);
    for k in 1..=8 {
        map.put(8, k, false);
        map.put(k, 8, false);
    }
}

fn draw_rmqr<B: Bit>(map: &mut MatrixMap<B>, size: RmqrSize) {
    let (h, w) = (map.height(), map.width());
    for j in 0..w {
        map.put(0, j, j % 2 == 0);
        map.put(h - 1, j, j % 2 == 0);
    }
    for i in 0..h {
        map.put(i, 0, i % 2 == 0);
        map.put(i, w - 1, i % 2 == 0);
    }
    for &c in size.alignment_columns() {
        for i in 0..h {
            map.put(i, c, i % 2 == 0);
        }
        for ci in [1, h - 2] {
            for i in ci - 1..=ci + 1 {
                for j in c - 1..=c + 1 {
                    map.put(i, j, (i, j) != (ci, c));
                }
            }
        }
    }
    finder(map, 3, 3);
    alignment(map, h - 3, w - 3);

    // corner finder patterns
    map.put(0, w - 1, true);
    map.put(0, w - 2, true);
    map.put(1, w - 1, true);
    map.put(1, w - 2, false);
    for j in 0..3 {
        map.put(h - 1, j, true);
    }
    if h >= 11 {
        map.put(h - 2, 0, true);
        map.put(h - 2, 1, false);
    }

    for (i, j) in super::format::rmqr_positions(h, w).into_iter().flatten() {
        map.put(i, j, false);
    }
}

#[test]
fn test_qr_v1_template() {
    let map = MatrixMap::<bool>::new(Version::Qr(1));
    let row = |i: usize| -> alloc::vec::Vec<bool> { (0..21).map(|j| *map.get(i, j)).collect() };
    let dark = |s: &str| -> alloc::vec::Vec<bool> { s.chars().map(|c| c == '#').collect() };
    assert_eq!(row(0), dark("#######.......#######"));
    assert_eq!(row(6), dark("#######.#.#.#.#######"));
    assert_eq!(row(7), dark("....................."));
    assert!(*map.get(13, 8));
    let reserved = (0..21)
        .flat_map(|i| (0..21).map(move |j| (i, j)))
        .filter(|(i, j)| map.is_reserved(*i, *j))
        .count();
    assert_eq!(reserved, 21 * 21 - 208);
}

#[test]
fn test_qr_alignment() {
    let map = MatrixMap::<bool>::new(Version::Qr(7));
    // center, light ring, dark ring
    assert!(*map.get(22, 22));
    assert!(!*map.get(21, 22));
    assert!(*map.get(20, 22));
    // on the timing patterns
    assert!(map.is_reserved(6, 22) && map.is_reserved(22, 6));
    assert!(*map.get(4, 22) && !*map.get(6, 21));
    assert!(!map.is_reserved(38, 28));
    // version information
    assert!(map.is_reserved(0, 34) && map.is_reserved(5, 36) && map.is_reserved(34, 5));
}

#[test]
fn test_micro_template() {
    let map = MatrixMap::<bool>::new(Version::Micro(3));
    let row0: alloc::vec::Vec<bool> = (0..15).map(|j| *map.get(0, j)).collect();
    let expected: alloc::vec::Vec<bool> = "#######.#.#.#.#".chars().map(|c| c == '#').collect();
    assert_eq!(row0, expected);
    assert!(map.is_reserved(8, 8) && map.is_reserved(1, 8) && map.is_reserved(8, 1));
    assert!(!map.is_reserved(9, 9) && !map.is_reserved(1, 9));
}

#[test]
fn test_rmqr_template() {
    let map = MatrixMap::<bool>::new(Version::Rmqr(RmqrSize::R11x27));
    let (h, w) = (11, 27);
    // sub-finder center and light ring
    assert!(*map.get(h - 3, w - 3));
    assert!(!*map.get(h - 4, w - 3));
    assert!(*map.get(h - 5, w - 5));
    // corner patterns
    assert!(*map.get(0, w - 2) && !*map.get(1, w - 2));
    assert!(*map.get(h - 2, 0) && !*map.get(h - 2, 1));
    // finder separator on row 7
    assert!(!*map.get(7, 3) && map.is_reserved(7, 3));
    assert!(!map.is_reserved(8, 3));

    let map = MatrixMap::<bool>::new(Version::Rmqr(RmqrSize::R7x43));
    // alignment column 21 with patterns at the top and bottom
    assert!(*map.get(0, 20) && *map.get(1, 20) && !*map.get(1, 21) && *map.get(5, 22));
    assert!(map.is_reserved(3, 21) && !*map.get(3, 21) && *map.get(4, 21));
}
