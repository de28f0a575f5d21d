//! Zone synthesis, net reassignment and fill ordering.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::shapes::{ContourBuilder, SubContour};
use super::BoardLoader;
use crate::board::{BoardLayer, LayerSet, Zone, ZoneKeepout, NO_NET};
use crate::database::TraceRecord;
use crate::geometry::point_on_edge;
use crate::core::ImportError;
use crate::progress::Checkpoint;

/// Pseudo layer name for zones on every copper layer.
const ALL_LAYERS: &str = "ALL";

/// Edge distance, in nm, within which an outline point counts as shared.
const EDGE_TOLERANCE: i64 = 1;

/// Rule-area restrictions implied by a keepout class, or `None` for
/// ordinary zones.
pub(crate) fn keepout_for_class(class: &str) -> Option<ZoneKeepout> {
    if !class.contains("KEEPOUT") {
        return None;
    }
    let mut keepout = ZoneKeepout::default();
    if class.contains("ROUTE") {
        keepout.tracks = true;
        keepout.copperpour = true;
    } else if class.contains("VIA") {
        keepout.vias = true;
    } else if class.contains("PACKAGE") {
        keepout.footprints = true;
    } else {
        keepout.tracks = true;
        keepout.vias = true;
        keepout.copperpour = true;
    }
    Some(keepout)
}

impl BoardLoader<'_> {
    pub(super) fn load_zones(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        for record in db.zones.values() {
            progress.tick()?;
            let on_copper = db
                .board_layer(&record.layer)
                .is_some_and(|l| l.is_copper());

            if on_copper || record.layer == ALL_LAYERS {
                self.load_zone(record);
            } else if matches!(record.layer.as_str(), "OUTLINE" | "DESIGN_OUTLINE" | "DIMENSION") {
                self.load_outline(record);
            } else {
                self.load_polygon(record);
            }
        }

        if self.options.assign_zone_nets {
            let matched = assign_zone_nets(&mut self.board.zones);
            debug!("assigned nets to {} zone outlines", matched);
        }
        Ok(())
    }

    fn load_zone(&mut self, record: &TraceRecord) {
        let context = format!("zone {} on layer {}", record.id, record.layer);
        if record.segments.len() < 3 {
            self.diags.warn(
                format!("{} has {} segments, skipped", context, record.segments.len()),
                None,
            );
            return;
        }

        let layers: LayerSet = if record.layer == ALL_LAYERS {
            self.board
                .copper_layers()
                .into_iter()
                .filter(|l| self.board.enabled_layers.contains(l))
                .collect()
        } else {
            let layer = self.db.board_layer(&record.layer).unwrap_or(BoardLayer::CmtsUser);
            LayerSet::from([layer])
        };

        let mode = if record.class == "BOUNDARY" {
            SubContour::Stop
        } else {
            SubContour::Hole
        };
        let outline = ContourBuilder::new(mode, self.options.arc_max_error, &context)
            .build(record.segments.values(), self.diags);
        if outline.is_degenerate() {
            self.diags.warn(
                format!("{} has an outline with {} points, skipped", context, outline.outline.len()),
                None,
            );
            return;
        }

        let mut zone = Zone::new(layers, outline);
        zone.keepout = keepout_for_class(&record.class);
        if zone.keepout.is_none() {
            zone.net = self.board.find_net(&record.net).unwrap_or(NO_NET);
        }
        self.board.add_zone(zone);
    }
}

/// Give each unnetted zone outline the net of the netted fills whose
/// outlines share the most edge points with it, then drop the fills that
/// matched.
///
/// Ties go to the lowest net code. Only fills of the winning net that
/// overlapped the outline are removed. Returns the number of outlines that
/// received a net.
pub fn assign_zone_nets(zones: &mut Vec<Zone>) -> usize {
    let mut assignments = Vec::new();
    let mut consumed = BTreeSet::new();

    for (i, outline_zone) in zones.iter().enumerate() {
        if outline_zone.net != NO_NET || outline_zone.is_rule_area() {
            continue;
        }
        let Some(bbox1) = outline_zone.bbox() else {
            continue;
        };
        let outline1 = &outline_zone.outline.outline;
        let layer = outline_zone.primary_layer();

        // net code -> (shared point count, fills that contributed)
        let mut overlaps: BTreeMap<usize, (usize, Vec<usize>)> = BTreeMap::new();
        for (j, fill) in zones.iter().enumerate() {
            if fill.net == NO_NET || fill.is_rule_area() || fill.primary_layer() != layer {
                continue;
            }
            let Some(bbox2) = fill.bbox() else {
                continue;
            };
            if !bbox1.intersects(&bbox2) {
                continue;
            }
            let outline2 = &fill.outline.outline;
            let shared = outline1
                .iter()
                .filter(|p| point_on_edge(outline2, **p, EDGE_TOLERANCE))
                .count()
                + outline2
                    .iter()
                    .filter(|p| point_on_edge(outline1, **p, EDGE_TOLERANCE))
                    .count();
            if shared > 0 {
                let entry = overlaps.entry(fill.net).or_default();
                entry.0 += shared;
                entry.1.push(j);
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (net, (count, _)) in &overlaps {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((*net, *count));
            }
        }
        if let Some((net, _)) = best {
            assignments.push((i, net));
            if let Some((_, fills)) = overlaps.remove(&net) {
                consumed.extend(fills);
            }
        }
    }

    for (i, net) in &assignments {
        zones[*i].net = *net;
    }
    let mut index = 0;
    zones.retain(|_| {
        let keep = !consumed.contains(&index);
        index += 1;
        keep
    });

    assignments.len()
}

/// Sort zones by layer then descending bounding-box area and hand out fill
/// priorities in steps of 10 per layer, so nested smaller zones win.
/// Rule areas keep priority 0.
pub fn order_zones(zones: &mut [Zone]) {
    let area = |z: &Zone| z.bbox().map_or(0.0, |b| b.area());
    zones.sort_by(|a, b| {
        a.primary_layer()
            .cmp(&b.primary_layer())
            .then_with(|| area(b).total_cmp(&area(a)))
    });

    let mut layer = None;
    let mut priority = 0;
    for zone in zones.iter_mut() {
        if zone.is_rule_area() {
            continue;
        }
        if zone.primary_layer() != layer {
            layer = zone.primary_layer();
            priority = 0;
        }
        zone.priority = priority;
        priority += 10;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn zone(poly: Polygon, net: usize) -> Zone {
        let mut z = Zone::new(LayerSet::from([BoardLayer::FCu]), poly);
        z.net = net;
        z
    }

    #[test]
    fn test_outline_takes_net_with_most_shared_points() {
        // Every vertex of the NET1 fill lies on the outline; the NET2 fill
        // only touches it along x = 10.
        let outline = zone(rect(0, 0, 10, 10), NO_NET);
        let net1_fill = zone(
            Polygon::new(vec![
                Point::new(0, 0),
                Point::new(5, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(5, 10),
                Point::new(0, 10),
            ]),
            1,
        );
        let net2_fill = zone(rect(10, 0, 20, 10), 2);
        let mut zones = vec![outline, net1_fill, net2_fill];

        let matched = assign_zone_nets(&mut zones);

        assert_eq!(matched, 1);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].net, 1);
        assert_eq!(zones[1].net, 2);
    }

    #[test]
    fn test_tie_breaks_to_lowest_net() {
        let outline = zone(rect(0, 0, 10, 10), NO_NET);
        let a = zone(rect(0, 0, 10, 10), 5);
        let b = zone(rect(0, 0, 10, 10), 3);
        let mut zones = vec![outline, a, b];
        assign_zone_nets(&mut zones);
        assert_eq!(zones[0].net, 3);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].net, 5);
    }

    #[test]
    fn test_other_layer_and_rule_areas_ignored() {
        let outline = zone(rect(0, 0, 10, 10), NO_NET);
        let mut other_layer = zone(rect(0, 0, 10, 10), 1);
        other_layer.layers = LayerSet::from([BoardLayer::BCu]);
        let mut keepout = zone(rect(0, 0, 10, 10), NO_NET);
        keepout.keepout = Some(ZoneKeepout::default());
        let mut zones = vec![outline, other_layer, keepout];
        assert_eq!(assign_zone_nets(&mut zones), 0);
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[0].net, NO_NET);
    }

    #[test]
    fn test_disjoint_boxes_do_not_match() {
        let mut zones = vec![zone(rect(0, 0, 10, 10), NO_NET), zone(rect(50, 50, 60, 60), 1)];
        assert_eq!(assign_zone_nets(&mut zones), 0);
    }

    #[test]
    fn test_order_zones_smaller_gets_higher_priority() {
        let big = zone(rect(0, 0, 100, 100), 1);
        let small = zone(rect(10, 10, 20, 20), 1);
        let mut back = zone(rect(0, 0, 50, 50), 1);
        back.layers = LayerSet::from([BoardLayer::BCu]);
        let mut rule = zone(rect(0, 0, 500, 500), NO_NET);
        rule.keepout = Some(ZoneKeepout::default());
        let mut zones = vec![small, back, rule, big];

        order_zones(&mut zones);

        let front: Vec<_> = zones
            .iter()
            .filter(|z| z.primary_layer() == Some(BoardLayer::FCu) && !z.is_rule_area())
            .map(|z| (z.bbox().map(|b| b.width()), z.priority))
            .collect();
        assert_eq!(front, vec![(Some(100), 0), (Some(10), 10)]);
        let back = zones
            .iter()
            .find(|z| z.primary_layer() == Some(BoardLayer::BCu))
            .map(|z| z.priority);
        assert_eq!(back, Some(0));
        assert!(zones.iter().filter(|z| z.is_rule_area()).all(|z| z.priority == 0));
    }

    #[test]
    fn test_keepout_classes() {
        assert!(keepout_for_class("ETCH").is_none());
        let route = keepout_for_class("ROUTE KEEPOUT").unwrap();
        assert!(route.tracks && route.copperpour && !route.vias);
        let via = keepout_for_class("VIA KEEPOUT").unwrap();
        assert!(via.vias && !via.tracks);
        let package = keepout_for_class("PACKAGE KEEPOUT").unwrap();
        assert!(package.footprints);
    }
}
