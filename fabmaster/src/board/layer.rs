//! Board layer identifiers
//!
//! Ordinals follow the KiCad 9 layer numbering: copper layers take even ids
//! (F.Cu = 0, B.Cu = 2, In<n>.Cu = 2n + 2) and technical/user layers take odd
//! ids. Layers serialize as their canonical name ("F.Cu", "In1.Cu", "User.3").

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Highest inner copper index.
pub const MAX_INNER_LAYERS: u8 = 30;
/// Number of generic user layers.
pub const USER_LAYER_COUNT: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardLayer {
    FCu,
    BCu,
    /// Inner copper layer, 1-based.
    Inner(u8),
    FMask,
    BMask,
    FSilkS,
    BSilkS,
    FAdhes,
    BAdhes,
    FPaste,
    BPaste,
    DwgsUser,
    CmtsUser,
    Eco1User,
    Eco2User,
    EdgeCuts,
    Margin,
    BCrtYd,
    FCrtYd,
    BFab,
    FFab,
    /// Generic user layer, 1-based.
    User(u8),
}

pub type LayerSet = BTreeSet<BoardLayer>;

impl BoardLayer {
    /// Technical layers enabled on every imported board.
    pub const TECHNICAL: [BoardLayer; 12] = [
        BoardLayer::FMask,
        BoardLayer::BMask,
        BoardLayer::FSilkS,
        BoardLayer::BSilkS,
        BoardLayer::FAdhes,
        BoardLayer::BAdhes,
        BoardLayer::FPaste,
        BoardLayer::BPaste,
        BoardLayer::BCrtYd,
        BoardLayer::FCrtYd,
        BoardLayer::BFab,
        BoardLayer::FFab,
    ];

    /// Drawing and user layers enabled on every imported board.
    pub fn user_layers() -> impl Iterator<Item = BoardLayer> {
        [
            BoardLayer::DwgsUser,
            BoardLayer::CmtsUser,
            BoardLayer::Eco1User,
            BoardLayer::Eco2User,
            BoardLayer::EdgeCuts,
            BoardLayer::Margin,
        ]
        .into_iter()
        .chain((1..=USER_LAYER_COUNT).map(BoardLayer::User))
    }

    /// Copper layers of a stackup with `count` copper layers, front first.
    pub fn copper_stack(count: usize) -> Vec<BoardLayer> {
        match count {
            0 => Vec::new(),
            1 => vec![BoardLayer::FCu],
            n => {
                let inner = (n - 2).min(MAX_INNER_LAYERS as usize) as u8;
                std::iter::once(BoardLayer::FCu)
                    .chain((1..=inner).map(BoardLayer::Inner))
                    .chain(std::iter::once(BoardLayer::BCu))
                    .collect()
            }
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            BoardLayer::FCu => 0,
            BoardLayer::BCu => 2,
            BoardLayer::Inner(n) => 2 * *n as u32 + 2,
            BoardLayer::FMask => 1,
            BoardLayer::BMask => 3,
            BoardLayer::FSilkS => 5,
            BoardLayer::BSilkS => 7,
            BoardLayer::FAdhes => 9,
            BoardLayer::BAdhes => 11,
            BoardLayer::FPaste => 13,
            BoardLayer::BPaste => 15,
            BoardLayer::DwgsUser => 17,
            BoardLayer::CmtsUser => 19,
            BoardLayer::Eco1User => 21,
            BoardLayer::Eco2User => 23,
            BoardLayer::EdgeCuts => 25,
            BoardLayer::Margin => 27,
            BoardLayer::BCrtYd => 29,
            BoardLayer::FCrtYd => 31,
            BoardLayer::BFab => 33,
            BoardLayer::FFab => 35,
            BoardLayer::User(n) => 39 + 2 * (*n as u32 - 1),
        }
    }

    pub fn name(&self) -> String {
        match self {
            BoardLayer::FCu => "F.Cu".into(),
            BoardLayer::BCu => "B.Cu".into(),
            BoardLayer::Inner(n) => format!("In{}.Cu", n),
            BoardLayer::FMask => "F.Mask".into(),
            BoardLayer::BMask => "B.Mask".into(),
            BoardLayer::FSilkS => "F.SilkS".into(),
            BoardLayer::BSilkS => "B.SilkS".into(),
            BoardLayer::FAdhes => "F.Adhes".into(),
            BoardLayer::BAdhes => "B.Adhes".into(),
            BoardLayer::FPaste => "F.Paste".into(),
            BoardLayer::BPaste => "B.Paste".into(),
            BoardLayer::DwgsUser => "Dwgs.User".into(),
            BoardLayer::CmtsUser => "Cmts.User".into(),
            BoardLayer::Eco1User => "Eco1.User".into(),
            BoardLayer::Eco2User => "Eco2.User".into(),
            BoardLayer::EdgeCuts => "Edge.Cuts".into(),
            BoardLayer::Margin => "Margin".into(),
            BoardLayer::BCrtYd => "B.CrtYd".into(),
            BoardLayer::FCrtYd => "F.CrtYd".into(),
            BoardLayer::BFab => "B.Fab".into(),
            BoardLayer::FFab => "F.Fab".into(),
            BoardLayer::User(n) => format!("User.{}", n),
        }
    }

    pub fn is_copper(&self) -> bool {
        matches!(self, BoardLayer::FCu | BoardLayer::BCu | BoardLayer::Inner(_))
    }

    pub fn is_silk(&self) -> bool {
        matches!(self, BoardLayer::FSilkS | BoardLayer::BSilkS)
    }

    pub fn is_back(&self) -> bool {
        matches!(
            self,
            BoardLayer::BCu
                | BoardLayer::BMask
                | BoardLayer::BSilkS
                | BoardLayer::BAdhes
                | BoardLayer::BPaste
                | BoardLayer::BCrtYd
                | BoardLayer::BFab
        )
    }

    /// Counterpart on the opposite board side; side-less layers map to
    /// themselves.
    pub fn flip(&self) -> BoardLayer {
        match self {
            BoardLayer::FCu => BoardLayer::BCu,
            BoardLayer::BCu => BoardLayer::FCu,
            BoardLayer::FMask => BoardLayer::BMask,
            BoardLayer::BMask => BoardLayer::FMask,
            BoardLayer::FSilkS => BoardLayer::BSilkS,
            BoardLayer::BSilkS => BoardLayer::FSilkS,
            BoardLayer::FAdhes => BoardLayer::BAdhes,
            BoardLayer::BAdhes => BoardLayer::FAdhes,
            BoardLayer::FPaste => BoardLayer::BPaste,
            BoardLayer::BPaste => BoardLayer::FPaste,
            BoardLayer::FCrtYd => BoardLayer::BCrtYd,
            BoardLayer::BCrtYd => BoardLayer::FCrtYd,
            BoardLayer::FFab => BoardLayer::BFab,
            BoardLayer::BFab => BoardLayer::FFab,
            other => *other,
        }
    }
}

impl Ord for BoardLayer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl PartialOrd for BoardLayer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BoardLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for BoardLayer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// Flip every layer in a set to the opposite side.
pub fn flip_set(layers: &LayerSet) -> LayerSet {
    layers.iter().map(BoardLayer::flip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copper_ids_are_even() {
        for layer in BoardLayer::copper_stack(6) {
            assert_eq!(layer.id() % 2, 0, "{layer}");
        }
        assert_eq!(BoardLayer::Inner(1).id(), 4);
        assert_eq!(BoardLayer::User(9).id(), 55);
    }

    #[test]
    fn test_copper_stack_shape() {
        assert!(BoardLayer::copper_stack(0).is_empty());
        assert_eq!(BoardLayer::copper_stack(1), vec![BoardLayer::FCu]);
        assert_eq!(
            BoardLayer::copper_stack(4),
            vec![
                BoardLayer::FCu,
                BoardLayer::Inner(1),
                BoardLayer::Inner(2),
                BoardLayer::BCu
            ]
        );
    }

    #[test]
    fn test_flip_is_involution() {
        let all: Vec<BoardLayer> = BoardLayer::TECHNICAL
            .into_iter()
            .chain(BoardLayer::user_layers())
            .chain(BoardLayer::copper_stack(4))
            .collect();
        for layer in all {
            assert_eq!(layer.flip().flip(), layer);
        }
        assert_eq!(BoardLayer::FSilkS.flip(), BoardLayer::BSilkS);
        assert_eq!(BoardLayer::Inner(2).flip(), BoardLayer::Inner(2));
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&BoardLayer::Inner(3)).unwrap();
        assert_eq!(json, "\"In3.Cu\"");
        assert_eq!(BoardLayer::User(2).to_string(), "User.2");
    }

    #[test]
    fn test_set_orders_by_id() {
        let set: LayerSet = [BoardLayer::BCu, BoardLayer::FMask, BoardLayer::FCu]
            .into_iter()
            .collect();
        let ids: Vec<u32> = set.iter().map(BoardLayer::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
