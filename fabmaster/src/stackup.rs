//! Layer assignment
//!
//! Maps free-text source layer names onto board layers. Copper is ordered by
//! declared sort key with the outermost layers pinned to F.Cu and B.Cu;
//! everything else is classified by name, with leftovers spilling into the
//! generic user layers.

use tracing::debug;

use crate::board::layer::{MAX_INNER_LAYERS, USER_LAYER_COUNT};
use crate::board::BoardLayer;
use crate::database::{Database, FabLayer};
use crate::diagnostics::Diagnostics;

/// Layers every import carries, overriding any same-named source layer.
pub const EXTRA_LAYERS: [(&str, BoardLayer); 4] = [
    ("ASSEMBLY_TOP", BoardLayer::FFab),
    ("ASSEMBLY_BOTTOM", BoardLayer::BFab),
    ("PLACE_BOUND_TOP", BoardLayer::FCrtYd),
    ("PLACE_BOUND_BOTTOM", BoardLayer::BCrtYd),
];

fn is_extra_layer(name: &str) -> bool {
    EXTRA_LAYERS.iter().any(|(extra, _)| *extra == name)
}

/// Board layer for a non-conductive source layer, or `None` when it should
/// go to the next free user layer.
pub fn classify_technical(name: &str) -> Option<BoardLayer> {
    let back = name.contains('B');
    let side = |front: BoardLayer, rear: BoardLayer| Some(if back { rear } else { front });

    if name.contains("SILK") && !name.contains("AUTOSILK") {
        side(BoardLayer::FSilkS, BoardLayer::BSilkS)
    } else if name.contains("PAST") {
        side(BoardLayer::FPaste, BoardLayer::BPaste)
    } else if name.contains("MASK") || name.contains("MSK") {
        side(BoardLayer::FMask, BoardLayer::BMask)
    } else if name.contains("NCLEGEND") {
        Some(BoardLayer::DwgsUser)
    } else {
        None
    }
}

/// Assign a board layer to every source layer. Runs once, after all
/// sections have been read.
pub fn assign_layers(db: &mut Database, diags: &mut Diagnostics) {
    let copper: Vec<String> = db.conductive_layers().iter().map(|l| l.name.clone()).collect();
    let last = copper.len().saturating_sub(1);

    for (i, name) in copper.iter().enumerate() {
        let Some(layer) = db.layers.get_mut(name) else {
            continue;
        };
        layer.disabled = false;
        layer.target = if i == 0 {
            Some(BoardLayer::FCu)
        } else if i == last {
            Some(BoardLayer::BCu)
        } else if i <= MAX_INNER_LAYERS as usize {
            Some(BoardLayer::Inner(i as u8))
        } else {
            diags.warn(
                format!("too many copper layers, disabling layer {}", name),
                None,
            );
            layer.disabled = true;
            None
        };
    }

    let mut next_user = 1u8;
    for layer in db.layers.values_mut() {
        if layer.conductive || is_extra_layer(&layer.name) {
            continue;
        }
        layer.target = classify_technical(&layer.name);
        if layer.target.is_some() {
            continue;
        }
        if next_user <= USER_LAYER_COUNT {
            layer.target = Some(BoardLayer::User(next_user));
            next_user += 1;
        } else {
            diags.warn(
                format!("no user layer left for {}, disabling it", layer.name),
                None,
            );
            layer.disabled = true;
        }
    }

    for (name, target) in EXTRA_LAYERS {
        let next = db.layers.len() as i64;
        let layer = db
            .layers
            .entry(name.to_string())
            .or_insert_with(|| FabLayer::new(name, next, false));
        layer.conductive = false;
        layer.disabled = false;
        layer.target = Some(target);
    }

    debug!(
        "assigned {} layers ({} copper)",
        db.layers.len(),
        copper.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with(copper: &[(&str, i64)], other: &[&str]) -> Database {
        let mut db = Database::new();
        for (name, key) in copper {
            db.layers.insert(name.to_string(), FabLayer::new(name, *key, true));
        }
        for name in other {
            db.ensure_layer(name, false);
        }
        db
    }

    #[test]
    fn test_copper_front_back_and_inner_order() {
        let mut db = db_with(&[("BOTTOM", 8), ("TOP", 2), ("GND", 4), ("VCC", 6)], &[]);
        let mut diags = Diagnostics::new();
        assign_layers(&mut db, &mut diags);

        assert_eq!(db.board_layer("TOP"), Some(BoardLayer::FCu));
        assert_eq!(db.board_layer("GND"), Some(BoardLayer::Inner(1)));
        assert_eq!(db.board_layer("VCC"), Some(BoardLayer::Inner(2)));
        assert_eq!(db.board_layer("BOTTOM"), Some(BoardLayer::BCu));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_copper_ids_distinct_and_monotonic() {
        let copper: Vec<(String, i64)> = (0..8).map(|i| (format!("L{}", i), i * 3)).collect();
        let refs: Vec<(&str, i64)> = copper.iter().map(|(n, k)| (n.as_str(), *k)).collect();
        let mut db = db_with(&refs, &[]);
        let mut diags = Diagnostics::new();
        assign_layers(&mut db, &mut diags);

        let ids: Vec<u32> = db
            .conductive_layers()
            .iter()
            .filter_map(|l| l.target)
            .map(|t| t.id())
            .collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], BoardLayer::FCu.id());
        assert_eq!(ids[7], BoardLayer::BCu.id());
        let inner = &ids[1..7];
        assert!(inner.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_copper_layer_is_front() {
        let mut db = db_with(&[("TOP", 1)], &[]);
        assign_layers(&mut db, &mut Diagnostics::new());
        assert_eq!(db.board_layer("TOP"), Some(BoardLayer::FCu));
    }

    #[test]
    fn test_technical_classification() {
        assert_eq!(classify_technical("SILKSCREEN_TOP"), Some(BoardLayer::FSilkS));
        assert_eq!(classify_technical("SILKSCREEN_BOTTOM"), Some(BoardLayer::BSilkS));
        assert_eq!(classify_technical("AUTOSILK_TOP"), None);
        assert_eq!(classify_technical("SOLDERMASK_TOP"), Some(BoardLayer::FMask));
        assert_eq!(classify_technical("SMSK_BOTTOM"), Some(BoardLayer::BMask));
        assert_eq!(classify_technical("PASTEMASK_TOP"), Some(BoardLayer::FPaste));
        assert_eq!(classify_technical("PASTEMASK_BOTTOM"), Some(BoardLayer::BPaste));
        assert_eq!(classify_technical("NCLEGEND-1-2"), Some(BoardLayer::DwgsUser));
        assert_eq!(classify_technical("DIMENSION"), None);
    }

    #[test]
    fn test_user_layers_overflow_disables() {
        let names: Vec<String> = (0..11).map(|i| format!("NOTES{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut db = db_with(&[("TOP", 0)], &refs);
        let mut diags = Diagnostics::new();
        assign_layers(&mut db, &mut diags);

        let disabled = db.layers.values().filter(|l| l.disabled).count();
        assert_eq!(disabled, 2);
        assert_eq!(diags.len(), 2);
        let users: Vec<_> = db
            .layers
            .values()
            .filter_map(|l| match l.target {
                Some(BoardLayer::User(n)) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(users.len(), 9);
    }

    #[test]
    fn test_extra_layers_injected_and_override() {
        let mut db = db_with(&[("TOP", 0), ("BOTTOM", 1)], &["ASSEMBLY_TOP"]);
        if let Some(layer) = db.layers.get_mut("ASSEMBLY_TOP") {
            layer.disabled = true;
        }
        assign_layers(&mut db, &mut Diagnostics::new());

        assert_eq!(db.board_layer("ASSEMBLY_TOP"), Some(BoardLayer::FFab));
        assert_eq!(db.board_layer("ASSEMBLY_BOTTOM"), Some(BoardLayer::BFab));
        assert_eq!(db.board_layer("PLACE_BOUND_TOP"), Some(BoardLayer::FCrtYd));
        assert_eq!(db.board_layer("PLACE_BOUND_BOTTOM"), Some(BoardLayer::BCrtYd));
    }

    #[test]
    fn test_no_copper_is_tolerated() {
        let mut db = db_with(&[], &["SILKSCREEN_TOP"]);
        let mut diags = Diagnostics::new();
        assign_layers(&mut db, &mut diags);
        assert!(db.conductive_layers().is_empty());
        assert_eq!(db.board_layer("SILKSCREEN_TOP"), Some(BoardLayer::FSilkS));
    }
}
