//! Asset analyzer.
//!
//! Pure analysis over 2bpp tile data (and optionally decoded images from
//! disk): duplicate grouping, emptiness, entropy, palette usage, and
//! cross-asset sharing opportunities, folded into a scored, actionable
//! report.

pub mod image;
pub mod report;
pub mod tile;

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::model::GameModel;

pub use image::{load_png, DecodedImage, ImageError};
pub use report::{
    AnalyzedAsset, AssetReport, AssetSummary, ByteSavings, CrossDuplicate, DuplicateGroup,
    Grade, Severity, SimilarPair, Suggestion, SuggestionKind,
};

pub const TILE_BYTES: usize = 16;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    /// Tiles below this Shannon entropy count as low-entropy (0.0 flat
    /// through 2.0 uniform).
    pub low_entropy_threshold: f64,
    /// Minimum bytewise agreement for a similarity pair.
    pub similarity_threshold: f64,
    /// Report at most this many similar pairs per asset.
    pub max_similar_pairs: usize,
    /// Similarity pairing is O(n^2); skip it for assets above this size.
    pub max_tiles_for_similarity: usize,
    /// Dominant-color coverage at which a tile counts as nearly solid.
    pub nearly_solid_coverage: f64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            low_entropy_threshold: 0.5,
            similarity_threshold: 0.8,
            max_similar_pairs: 10,
            max_tiles_for_similarity: 256,
            nearly_solid_coverage: 0.9,
        }
    }
}

/// One asset to analyze: converted 2bpp tile bytes plus where they came
/// from.
#[derive(Clone, Debug)]
pub struct AssetInput {
    pub name: String,
    pub tiles: Vec<u8>,
    pub location: Option<PathBuf>,
}

/// Analyze the game model's baked tile assets with default options.
pub fn analyze(game: &GameModel) -> AssetReport {
    analyze_with(game, &AnalyzerOptions::default())
}

pub fn analyze_with(game: &GameModel, opts: &AnalyzerOptions) -> AssetReport {
    let inputs: Vec<AssetInput> = game
        .tile_assets
        .values()
        .map(|a| AssetInput {
            name: a.name.clone(),
            tiles: a.data.clone(),
            location: None,
        })
        .collect();
    analyze_assets(&inputs, opts)
}

/// Analyze the model's assets plus every decodable PNG in `dir`. Images
/// that fail to decode or have unusable dimensions are skipped with a
/// warning.
pub fn analyze_dir(game: &GameModel, dir: &Path) -> Result<AssetReport, BuildError> {
    let mut inputs: Vec<AssetInput> = game
        .tile_assets
        .values()
        .map(|a| AssetInput {
            name: a.name.clone(),
            tiles: a.data.clone(),
            location: None,
        })
        .collect();
    let entries = std::fs::read_dir(dir).map_err(|source| BuildError::AssetDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    paths.sort();
    for path in paths {
        match image::load_png(&path) {
            Ok(decoded) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "asset".to_string());
                inputs.push(AssetInput {
                    name,
                    tiles: decoded.to_2bpp(),
                    location: Some(path),
                });
            }
            Err(err) => {
                log::warn!("skipping asset {}: {err}", path.display());
            }
        }
    }
    Ok(analyze_assets(&inputs, &AnalyzerOptions::default()))
}

pub fn analyze_assets(inputs: &[AssetInput], opts: &AnalyzerOptions) -> AssetReport {
    let mut assets = Vec::with_capacity(inputs.len());
    // hash -> (assets containing it, total occurrences)
    let mut cross: IndexMap<u64, (Vec<String>, usize)> = IndexMap::new();

    for input in inputs {
        let analyzed = analyze_one(input, opts);
        for chunk in input.tiles.chunks(TILE_BYTES) {
            let hash = tile::tile_hash(chunk);
            let entry = cross.entry(hash).or_default();
            if !entry.0.contains(&input.name) {
                entry.0.push(input.name.clone());
            }
            entry.1 += 1;
        }
        assets.push(analyzed);
    }

    let cross_duplicates: Vec<CrossDuplicate> = cross
        .into_iter()
        .filter(|(_, (names, _))| names.len() >= 2)
        .map(|(_, (names, count))| CrossDuplicate {
            assets: names,
            count,
            savings: ByteSavings::new((count as u32 - 1) * TILE_BYTES as u32, count as u32 - 1),
        })
        .collect();

    let suggestions = build_suggestions(&assets, &cross_duplicates, inputs);

    let total_tiles: usize = assets.iter().map(|a| a.tile_count).sum();
    let total_savings = assets
        .iter()
        .map(|a| a.savings)
        .fold(ByteSavings::default(), |acc, s| acc + s);
    let average_score = if assets.is_empty() {
        100
    } else {
        (assets.iter().map(|a| a.score as u32).sum::<u32>() as f64 / assets.len() as f64).round()
            as u8
    };
    let summary = AssetSummary {
        total_assets: assets.len(),
        total_tiles,
        total_savings,
        average_score,
    };

    AssetReport {
        assets,
        cross_duplicates,
        suggestions,
        summary,
    }
}

fn analyze_one(input: &AssetInput, opts: &AnalyzerOptions) -> AnalyzedAsset {
    let tiles: Vec<&[u8]> = input.tiles.chunks(TILE_BYTES).collect();
    let count = tiles.len();

    let mut empty_tiles = Vec::new();
    let mut low_entropy_tiles = Vec::new();
    let mut nearly_solid_tiles = Vec::new();
    let mut shades = [false; 4];
    for (i, t) in tiles.iter().enumerate() {
        if tile::is_empty(t) {
            empty_tiles.push(i);
        }
        let pixels = tile::decode_2bpp(t);
        if tile::shannon_entropy(&pixels) < opts.low_entropy_threshold {
            low_entropy_tiles.push(i);
        }
        let (_, coverage) = tile::dominant_color(&pixels);
        if coverage >= opts.nearly_solid_coverage {
            nearly_solid_tiles.push(i);
        }
        for p in pixels {
            shades[(p & 3) as usize] = true;
        }
    }

    // Duplicate groups by content hash, verified by content to be safe
    // against collisions.
    let mut groups: IndexMap<u64, Vec<usize>> = IndexMap::new();
    for (i, t) in tiles.iter().enumerate() {
        groups.entry(tile::tile_hash(t)).or_default().push(i);
    }
    let mut duplicates = Vec::new();
    let mut savings = ByteSavings::default();
    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        let first = tiles[members[0]];
        if !members.iter().all(|m| tiles[*m] == first) {
            continue;
        }
        let redundant = (members.len() - 1) as u32;
        let group_savings = ByteSavings::new(redundant * TILE_BYTES as u32, redundant);
        savings = savings + group_savings;
        duplicates.push(DuplicateGroup {
            tiles: members.clone(),
            count: members.len(),
            savings: group_savings,
        });
    }

    let mut similar_pairs = Vec::new();
    if count <= opts.max_tiles_for_similarity {
        for a in 0..count {
            for b in (a + 1)..count {
                let ratio = tile::similarity(tiles[a], tiles[b]);
                if ratio >= opts.similarity_threshold && ratio < 1.0 {
                    similar_pairs.push(SimilarPair {
                        a,
                        b,
                        similarity: ratio,
                    });
                }
            }
        }
        similar_pairs
            .sort_by(|x, y| y.similarity.partial_cmp(&x.similarity).unwrap());
        similar_pairs.truncate(opts.max_similar_pairs);
    }

    let shades_used: Vec<u8> = (0..4u8).filter(|s| shades[*s as usize]).collect();
    let unused_palette_slots = if count == 0 {
        0
    } else {
        4 - shades_used.len() as u8
    };

    let score = if count == 0 {
        100
    } else {
        let redundant: usize = duplicates.iter().map(|d| d.count - 1).sum();
        let dup_ratio = redundant as f64 / count as f64;
        let empty_ratio = empty_tiles.len() as f64 / count as f64;
        let low_entropy_ratio = low_entropy_tiles.len() as f64 / count as f64;
        let raw = 100.0
            - (dup_ratio * 30.0).round()
            - (empty_ratio * 20.0).round()
            - (low_entropy_ratio * 10.0).round()
            - 5.0 * unused_palette_slots as f64;
        raw.clamp(0.0, 100.0) as u8
    };

    AnalyzedAsset {
        name: input.name.clone(),
        location: input.location.clone(),
        tile_count: count,
        empty_tiles,
        low_entropy_tiles,
        nearly_solid_tiles,
        duplicates,
        similar_pairs,
        shades_used,
        unused_palette_slots,
        score,
        grade: Grade::from_score(score),
        savings,
    }
}

/// Longest run of identical consecutive tiles.
fn longest_tile_run(tiles: &[u8]) -> usize {
    let chunks: Vec<&[u8]> = tiles.chunks(TILE_BYTES).collect();
    let mut best = 0;
    let mut run = 0;
    for i in 0..chunks.len() {
        if i > 0 && chunks[i] == chunks[i - 1] {
            run += 1;
        } else {
            run = 1;
        }
        best = best.max(run);
    }
    best
}

fn build_suggestions(
    assets: &[AnalyzedAsset],
    cross: &[CrossDuplicate],
    inputs: &[AssetInput],
) -> Vec<Suggestion> {
    let mut out = Vec::new();
    for dup in cross {
        out.push(Suggestion {
            kind: SuggestionKind::ShareTilesAcrossAssets,
            severity: Severity::Warning,
            asset: None,
            message: format!(
                "identical tile appears in {}; share it through a common tileset",
                dup.assets.join(", ")
            ),
            savings: Some(dup.savings),
        });
    }
    for asset in assets {
        if !asset.duplicates.is_empty() {
            out.push(Suggestion {
                kind: SuggestionKind::DeduplicateTiles,
                severity: Severity::Warning,
                asset: Some(asset.name.clone()),
                message: format!(
                    "{} duplicate group(s) waste {}",
                    asset.duplicates.len(),
                    asset.savings.formatted()
                ),
                savings: Some(asset.savings),
            });
        }
        if !asset.empty_tiles.is_empty() {
            let n = asset.empty_tiles.len() as u32;
            let savings = ByteSavings::new(n * TILE_BYTES as u32, n);
            out.push(Suggestion {
                kind: SuggestionKind::RemoveEmptyTiles,
                severity: Severity::Warning,
                asset: Some(asset.name.clone()),
                message: format!("{n} empty tile(s) can be removed"),
                savings: Some(savings),
            });
        }
        if !asset.low_entropy_tiles.is_empty() {
            out.push(Suggestion {
                kind: SuggestionKind::ConsolidateLowEntropy,
                severity: Severity::Info,
                asset: Some(asset.name.clone()),
                message: format!(
                    "{} low-entropy tile(s) could consolidate into fills",
                    asset.low_entropy_tiles.len()
                ),
                savings: None,
            });
        }
        if asset.unused_palette_slots > 0 {
            out.push(Suggestion {
                kind: SuggestionKind::OptimizePalette,
                severity: Severity::Info,
                asset: Some(asset.name.clone()),
                message: format!(
                    "{} of 4 palette entries unused",
                    asset.unused_palette_slots
                ),
                savings: None,
            });
        }
        if !asset.similar_pairs.is_empty() {
            out.push(Suggestion {
                kind: SuggestionKind::MergeSimilarTiles,
                severity: Severity::Info,
                asset: Some(asset.name.clone()),
                message: format!(
                    "{} near-identical tile pair(s) are merge candidates",
                    asset.similar_pairs.len()
                ),
                savings: None,
            });
        }
    }
    for input in inputs {
        let run = longest_tile_run(&input.tiles);
        if run >= 3 {
            let savings = ByteSavings::new((run as u32 - 1) * TILE_BYTES as u32, run as u32 - 1);
            out.push(Suggestion {
                kind: SuggestionKind::EnableRle,
                severity: Severity::Info,
                asset: Some(input.name.clone()),
                message: format!("a run of {run} identical tiles compresses well with RLE"),
                savings: Some(savings),
            });
        }
    }
    // Stable: generation order is preserved within a severity.
    out.sort_by_key(|s| Reverse(s.severity));
    out
}
