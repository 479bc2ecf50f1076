//! Per-tile metrics over raw 2bpp data (16 bytes per 8x8 tile).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Decode one 2bpp tile into 64 pixel indices 0..3. Each row is two
/// bytes: the low bitplane then the high bitplane, MSB leftmost.
pub fn decode_2bpp(tile: &[u8]) -> [u8; 64] {
    let mut pixels = [0u8; 64];
    for y in 0..8 {
        let lo = tile.get(y * 2).copied().unwrap_or(0);
        let hi = tile.get(y * 2 + 1).copied().unwrap_or(0);
        for x in 0..8 {
            let bit = 7 - x;
            pixels[y * 8 + x] = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
        }
    }
    pixels
}

pub fn is_empty(tile: &[u8]) -> bool {
    tile.iter().all(|b| *b == 0)
}

/// Shannon entropy over the four pixel indices; 0.0 for a flat tile,
/// 2.0 for a uniform spread.
pub fn shannon_entropy(pixels: &[u8; 64]) -> f64 {
    let mut counts = [0usize; 4];
    for p in pixels {
        counts[(*p & 3) as usize] += 1;
    }
    let mut entropy = 0.0;
    for count in counts {
        if count == 0 {
            continue;
        }
        let p = count as f64 / 64.0;
        entropy -= p * p.log2();
    }
    entropy
}

/// The most common pixel index and the fraction of the tile it covers.
pub fn dominant_color(pixels: &[u8; 64]) -> (u8, f64) {
    let mut counts = [0usize; 4];
    for p in pixels {
        counts[(*p & 3) as usize] += 1;
    }
    let (idx, count) = counts
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| **c)
        .unwrap();
    (idx as u8, *count as f64 / 64.0)
}

/// Bytewise agreement ratio between two tiles.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let matching = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matching as f64 / 16.0
}

/// Content hash for duplicate grouping.
pub fn tile_hash(tile: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tile.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_both_planes() {
        // Row 0: lo = 0b1100_0000, hi = 0b1010_0000
        // Pixels: (hi<<1|lo) = 3, 1, 2, 0, ...
        let mut tile = [0u8; 16];
        tile[0] = 0b1100_0000;
        tile[1] = 0b1010_0000;
        let pixels = decode_2bpp(&tile);
        assert_eq!(&pixels[..4], &[3, 1, 2, 0]);
    }

    #[test]
    fn flat_tile_has_zero_entropy() {
        let pixels = [2u8; 64];
        assert_eq!(shannon_entropy(&pixels), 0.0);
        let (idx, coverage) = dominant_color(&pixels);
        assert_eq!(idx, 2);
        assert_eq!(coverage, 1.0);
    }

    #[test]
    fn even_spread_has_max_entropy() {
        let mut pixels = [0u8; 64];
        for (i, p) in pixels.iter_mut().enumerate() {
            *p = (i % 4) as u8;
        }
        assert!((shannon_entropy(&pixels) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_counts_matching_bytes() {
        let a = [0u8; 16];
        let mut b = [0u8; 16];
        b[0] = 1;
        b[1] = 1;
        assert!((similarity(&a, &b) - 14.0 / 16.0).abs() < 1e-9);
    }
}
