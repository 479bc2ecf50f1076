//! Analyzer report types.

use std::ops::Add;
use std::path::PathBuf;

use serde::Serialize;

/// Bytes (and tiles) reclaimable by acting on a suggestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ByteSavings {
    pub bytes: u32,
    pub tiles: u32,
}

impl ByteSavings {
    pub fn new(bytes: u32, tiles: u32) -> Self {
        Self { bytes, tiles }
    }

    /// Human form: "512 bytes (32 tiles)" below 1 KB, "2 KB (128 tiles)"
    /// from 1 KB up.
    pub fn formatted(&self) -> String {
        if self.bytes >= 1024 {
            format!("{} KB ({} tiles)", self.bytes / 1024, self.tiles)
        } else {
            format!("{} bytes ({} tiles)", self.bytes, self.tiles)
        }
    }
}

impl Add for ByteSavings {
    type Output = ByteSavings;

    fn add(self, rhs: ByteSavings) -> ByteSavings {
        ByteSavings {
            bytes: self.bytes + rhs.bytes,
            tiles: self.tiles + rhs.tiles,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=100 => Grade::Excellent,
            75..=89 => Grade::Good,
            60..=74 => Grade::Fair,
            40..=59 => Grade::Poor,
            _ => Grade::Critical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SuggestionKind {
    ShareTilesAcrossAssets,
    DeduplicateTiles,
    RemoveEmptyTiles,
    ConsolidateLowEntropy,
    OptimizePalette,
    MergeSimilarTiles,
    EnableRle,
}

#[derive(Clone, Debug, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub severity: Severity,
    /// Owning asset; cross-asset suggestions leave this empty.
    pub asset: Option<String>,
    pub message: String,
    pub savings: Option<ByteSavings>,
}

/// Tiles with identical content inside one asset.
#[derive(Clone, Debug, Serialize)]
pub struct DuplicateGroup {
    /// Indices of every tile sharing the content, first occurrence first.
    pub tiles: Vec<usize>,
    /// Total occurrences, the first included.
    pub count: usize,
    pub savings: ByteSavings,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimilarPair {
    pub a: usize,
    pub b: usize,
    /// Bytewise agreement ratio, below 1.0 by construction.
    pub similarity: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnalyzedAsset {
    pub name: String,
    pub location: Option<PathBuf>,
    pub tile_count: usize,
    pub empty_tiles: Vec<usize>,
    pub low_entropy_tiles: Vec<usize>,
    pub nearly_solid_tiles: Vec<usize>,
    pub duplicates: Vec<DuplicateGroup>,
    pub similar_pairs: Vec<SimilarPair>,
    /// Game-Boy shade indices in use (0 lightest, 3 darkest).
    pub shades_used: Vec<u8>,
    pub unused_palette_slots: u8,
    pub score: u8,
    pub grade: Grade,
    /// Within-asset deduplication savings.
    pub savings: ByteSavings,
}

/// Identical tile content shared by two or more assets.
#[derive(Clone, Debug, Serialize)]
pub struct CrossDuplicate {
    pub assets: Vec<String>,
    /// Occurrences across all listed assets.
    pub count: usize,
    pub savings: ByteSavings,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AssetSummary {
    pub total_assets: usize,
    pub total_tiles: usize,
    pub total_savings: ByteSavings,
    pub average_score: u8,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AssetReport {
    pub assets: Vec<AnalyzedAsset>,
    pub cross_duplicates: Vec<CrossDuplicate>,
    /// Ordered most severe first; stable within a severity.
    pub suggestions: Vec<Suggestion>,
    pub summary: AssetSummary,
}
