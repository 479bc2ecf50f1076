use gbforge_core::analyzer::{
    analyze_assets, AnalyzerOptions, AssetInput, ByteSavings, Grade, Severity, SuggestionKind,
};

/// Four distinct tiles, each using all four shades with maximal spread.
fn unique_busy_tiles() -> Vec<u8> {
    let row_a = [0x55u8, 0x33]; // pixels 0,1,2,3 repeated
    let row_b = [0x33u8, 0x55]; // pixels 0,2,1,3 repeated
    let mut data = Vec::new();
    // tile 0: all rows A; tile 1: all rows B; tiles 2/3: interleaved.
    for tile in 0..4 {
        for row in 0..8 {
            let pick_a = match tile {
                0 => true,
                1 => false,
                2 => row % 2 == 0,
                _ => row % 2 == 1,
            };
            let bytes = if pick_a { row_a } else { row_b };
            data.extend_from_slice(&bytes);
        }
    }
    data
}

fn input(name: &str, tiles: Vec<u8>) -> AssetInput {
    AssetInput {
        name: name.to_string(),
        tiles,
        location: None,
    }
}

fn analyze_one(tiles: Vec<u8>) -> gbforge_core::analyzer::AssetReport {
    analyze_assets(&[input("sprite", tiles)], &AnalyzerOptions::default())
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn test_unique_full_palette_asset_scores_100() {
    let report = analyze_one(unique_busy_tiles());
    let asset = &report.assets[0];
    assert!(asset.duplicates.is_empty());
    assert!(asset.empty_tiles.is_empty());
    assert!(asset.low_entropy_tiles.is_empty());
    assert_eq!(asset.unused_palette_slots, 0);
    assert_eq!(asset.score, 100);
    assert_eq!(asset.grade, Grade::Excellent);
}

#[test]
fn test_zero_tile_asset_scores_100() {
    let report = analyze_one(Vec::new());
    let asset = &report.assets[0];
    assert_eq!(asset.tile_count, 0);
    assert_eq!(asset.score, 100);
    assert_eq!(asset.grade, Grade::Excellent);
}

#[test]
fn test_nine_of_ten_duplicates() {
    // Nine copies of one busy tile plus one distinct tile.
    let unique = unique_busy_tiles();
    let mut tiles = Vec::new();
    for _ in 0..9 {
        tiles.extend_from_slice(&unique[0..16]);
    }
    tiles.extend_from_slice(&unique[16..32]);
    let report = analyze_one(tiles);
    let asset = &report.assets[0];
    assert_eq!(asset.duplicates.len(), 1);
    assert_eq!(asset.duplicates[0].count, 9);
    assert_eq!(asset.savings, ByteSavings::new(128, 8));
}

#[test]
fn test_empty_tiles_are_detected() {
    let mut tiles = unique_busy_tiles();
    tiles.extend_from_slice(&[0u8; 32]);
    let report = analyze_one(tiles);
    let asset = &report.assets[0];
    // The two zero tiles are empty, low-entropy, and mutual duplicates.
    assert_eq!(asset.empty_tiles, vec![4, 5]);
    assert!(asset.low_entropy_tiles.contains(&4));
    assert!(asset.score < 100);
}

// =============================================================================
// Savings arithmetic and formatting
// =============================================================================

#[test]
fn test_byte_savings_addition() {
    let sum = ByteSavings::new(100, 5) + ByteSavings::new(200, 10);
    assert_eq!(sum, ByteSavings::new(300, 15));
}

#[test]
fn test_byte_savings_formatting() {
    assert_eq!(
        ByteSavings::new(2048, 128).formatted(),
        "2 KB (128 tiles)"
    );
    assert_eq!(ByteSavings::new(512, 32).formatted(), "512 bytes (32 tiles)");
}

// =============================================================================
// Suggestions
// =============================================================================

#[test]
fn test_rle_suggested_for_long_runs() {
    let unique = unique_busy_tiles();
    let mut tiles = Vec::new();
    for _ in 0..4 {
        tiles.extend_from_slice(&unique[0..16]);
    }
    let report = analyze_one(tiles);
    assert!(report
        .suggestions
        .iter()
        .any(|s| s.kind == SuggestionKind::EnableRle));
}

#[test]
fn test_suggestions_ordered_by_severity() {
    let unique = unique_busy_tiles();
    let mut tiles = unique.clone();
    tiles.extend_from_slice(&unique[0..16]); // duplicate -> warning
    tiles.extend_from_slice(&[0u8; 16]); // empty + low entropy -> warning + info
    let report = analyze_one(tiles);
    let severities: Vec<Severity> = report.suggestions.iter().map(|s| s.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
    assert!(severities.contains(&Severity::Warning));
    assert!(severities.contains(&Severity::Info));
}

#[test]
fn test_cross_asset_duplicates_detected() {
    let unique = unique_busy_tiles();
    let a = input("hero", unique[0..32].to_vec());
    let b = input("coin", unique[16..48].to_vec());
    let report = analyze_assets(&[a, b], &AnalyzerOptions::default());
    assert_eq!(report.cross_duplicates.len(), 1);
    let shared = &report.cross_duplicates[0];
    assert_eq!(shared.assets, vec!["hero".to_string(), "coin".to_string()]);
    assert_eq!(shared.count, 2);
    assert!(report
        .suggestions
        .iter()
        .any(|s| s.kind == SuggestionKind::ShareTilesAcrossAssets));
}

#[test]
fn test_similarity_pairs_exclude_identical() {
    let unique = unique_busy_tiles();
    // A tile and a 1-byte variant: 15/16 bytes agree.
    let mut tiles = unique[0..16].to_vec();
    let mut variant = unique[0..16].to_vec();
    variant[0] ^= 0xFF;
    tiles.extend_from_slice(&variant);
    let report = analyze_one(tiles);
    let asset = &report.assets[0];
    assert_eq!(asset.similar_pairs.len(), 1);
    let pair = &asset.similar_pairs[0];
    assert!(pair.similarity >= 0.8 && pair.similarity < 1.0);
}

#[test]
fn test_summary_totals() {
    let unique = unique_busy_tiles();
    let report = analyze_assets(
        &[
            input("hero", unique.clone()),
            input("coin", unique[0..16].to_vec()),
        ],
        &AnalyzerOptions::default(),
    );
    assert_eq!(report.summary.total_assets, 2);
    assert_eq!(report.summary.total_tiles, 5);
    assert_eq!(report.summary.average_score, 100);
}
