//! Board synthesis
//!
//! [`BoardLoader`] walks a parsed [`Database`] and writes board objects in a
//! fixed order: nets, layers, vias, footprints, zones, graphics, traces and
//! finally zone fill ordering. Every phase ticks the progress checkpoint once
//! per database entry, so a cancellation request stops the load between
//! entries.

mod footprints;
mod shapes;
mod zones;

pub use zones::{assign_zone_nets, order_zones};

use tracing::{debug, info};

use crate::board::{ArcTrack, Board, BoardLayer, Shape, ShapeKind, Track, Via, NO_NET};
use crate::core::{ImportError, ImportOptions};
use crate::database::{Database, TraceRecord};
use crate::diagnostics::Diagnostics;
use crate::geometry::Point;
use crate::parser::graphics::GraphicShape;
use crate::progress::Checkpoint;
use shapes::{create_board_items, BoardItem, ContourBuilder, SubContour};
use uuid::Uuid;

/// Subclass of pin number annotations, which are not imported.
const PIN_NUMBER_SUBCLASS: &str = "PIN_NUMBER";

/// Class of routed copper.
const ETCH_CLASS: &str = "ETCH";

/// Writes the contents of one [`Database`] into a [`Board`].
pub struct BoardLoader<'a> {
    db: &'a Database,
    board: &'a mut Board,
    diags: &'a mut Diagnostics,
    options: &'a ImportOptions,
    nickname: &'a str,
}

impl<'a> BoardLoader<'a> {
    /// `nickname` is the library part of generated footprint ids.
    pub fn new(
        db: &'a Database,
        board: &'a mut Board,
        diags: &'a mut Diagnostics,
        options: &'a ImportOptions,
        nickname: &'a str,
    ) -> Self {
        Self {
            db,
            board,
            diags,
            options,
            nickname,
        }
    }

    /// Run every synthesis phase. Only cancellation fails the load.
    pub(crate) fn run(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        progress.report("Loading nets");
        self.load_nets(progress)?;
        info!("{} nets", self.board.net_count() - 1);

        progress.report("Loading layers");
        self.load_layers(progress)?;
        info!(
            "{} copper layers, {} enabled layers",
            self.board.copper_layer_count,
            self.board.enabled_layers.len()
        );

        progress.report("Loading vias");
        self.load_vias(progress)?;
        info!("{} vias", self.board.vias.len());

        progress.report("Loading footprints");
        self.load_footprints(progress)?;
        info!("{} footprints", self.board.footprints.len());

        progress.report("Loading zones");
        self.load_zones(progress)?;
        info!("{} zones", self.board.zones.len());

        progress.report("Loading graphics");
        self.load_graphics(progress)?;

        progress.report("Loading tracks");
        self.load_traces(progress)?;
        info!(
            "{} tracks, {} arcs, {} drawings",
            self.board.tracks.len(),
            self.board.arcs.len(),
            self.board.shapes.len()
        );

        if self.options.order_zones {
            order_zones(&mut self.board.zones);
        }
        progress.check()
    }

    // ========================================================================
    // Nets, layers, vias
    // ========================================================================

    fn load_nets(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        for name in &self.db.net_names {
            progress.tick()?;
            self.board.add_net(name);
        }
        Ok(())
    }

    fn load_layers(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        self.board.enable_layers(BoardLayer::TECHNICAL);
        self.board.enable_layers(BoardLayer::user_layers());

        let mut copper = 0;
        for layer in db.layers.values() {
            progress.tick()?;
            let Some(target) = layer.target.filter(|_| !layer.disabled) else {
                continue;
            };
            self.board.enable_layers([target]);
            if target.is_copper() {
                copper += 1;
            }
        }
        self.board.copper_layer_count = copper;

        for layer in db.conductive_layers() {
            if let Some(target) = db.board_layer(&layer.name) {
                self.board.set_layer_name(target, &layer.name);
            }
        }
        Ok(())
    }

    fn load_vias(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        for record in &db.vias {
            progress.tick()?;
            let (width, drill) = match db.padstacks.get(&record.padstack) {
                Some(stack) => (stack.width, stack.drill_size_x),
                None => {
                    self.diags.info(
                        format!(
                            "via padstack {} not found, using default via size",
                            record.padstack
                        ),
                        None,
                    );
                    (self.board.settings.via_diameter, self.board.settings.via_drill)
                }
            };
            let via = Via {
                uuid: Uuid::new_v4(),
                position: Point::new(record.x, record.y),
                width,
                drill,
                net: self.board.find_net(&record.net).unwrap_or(NO_NET),
                test_point: record.test_point,
            };
            self.board.add_via(via);
        }
        Ok(())
    }

    // ========================================================================
    // Board graphics
    // ========================================================================

    fn load_graphics(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        for group in &db.board_graphics {
            progress.tick()?;
            if group.subclass == PIN_NUMBER_SUBCLASS {
                continue;
            }
            let layer = db.board_layer(&group.subclass).unwrap_or(BoardLayer::CmtsUser);

            let first_is_fill = group.elements.values().next().is_some_and(|item| item.width == 0);
            if first_is_fill {
                let context = format!("graphic {} on layer {}", group.id, group.subclass);
                let poly = ContourBuilder::new(SubContour::Merge, self.options.arc_max_error, &context)
                    .build(group.elements.values(), self.diags);
                if !poly.is_degenerate() {
                    self.board.add_shape(Shape {
                        kind: ShapeKind::Polygon(poly),
                        layer,
                        width: 0,
                        filled: layer.is_silk(),
                    });
                }
            }

            for item in group.elements.values() {
                let items = create_board_items(item, layer, &self.board.settings);
                self.add_board_items(items);
            }
        }
        Ok(())
    }

    fn add_board_items(&mut self, items: Vec<BoardItem>) {
        for item in items {
            match item {
                BoardItem::Shape(shape) => self.board.add_shape(shape),
                BoardItem::Text(text) => self.board.add_text(text),
            }
        }
    }

    // ========================================================================
    // Traces and outlines
    // ========================================================================

    fn load_traces(&mut self, progress: &mut Checkpoint<'_>) -> Result<(), ImportError> {
        let db = self.db;
        for record in db.traces.values() {
            progress.tick()?;
            if record.class == ETCH_CLASS {
                self.load_etch(record);
            } else if matches!(record.layer.as_str(), "OUTLINE" | "DESIGN_OUTLINE" | "DIMENSION") {
                self.load_outline(record);
            } else {
                self.load_polygon(record);
            }
        }
        Ok(())
    }

    fn load_etch(&mut self, record: &TraceRecord) {
        let layer = match self.db.board_layer(&record.layer) {
            Some(layer) if layer.is_copper() => layer,
            _ => {
                self.diags.error(
                    format!(
                        "expecting etch data on a copper layer, found {} for trace {}",
                        record.layer, record.id
                    ),
                    None,
                );
                return;
            }
        };
        let net = self.board.find_net(&record.net).unwrap_or(NO_NET);

        for item in record.segments.values() {
            let width = if item.width > 0 {
                item.width
            } else {
                self.board.settings.line_thickness(layer)
            };
            match &item.shape {
                GraphicShape::Line { start, end } => self.board.add_track(Track {
                    uuid: Uuid::new_v4(),
                    start: *start,
                    end: *end,
                    width,
                    layer,
                    net,
                }),
                GraphicShape::Arc(arc) => self.board.add_arc(ArcTrack {
                    uuid: Uuid::new_v4(),
                    arc: *arc,
                    width,
                    layer,
                    net,
                }),
                _ => {
                    debug!("non-track {} in etch record {}", item.shape.name(), record.id);
                    let items = create_board_items(item, layer, &self.board.settings);
                    self.add_board_items(items);
                }
            }
        }
    }

    /// Board outline, dimension and drawing-format records. Only board
    /// geometry outlines land on the edge layer.
    fn load_outline(&mut self, record: &TraceRecord) {
        let layer = if record.class == "BOARD GEOMETRY" && record.layer != "DIMENSION" {
            BoardLayer::EdgeCuts
        } else if record.class == "DRAWING FORMAT" {
            BoardLayer::DwgsUser
        } else {
            BoardLayer::CmtsUser
        };

        for item in record.segments.values() {
            let items = create_board_items(item, layer, &self.board.settings);
            self.add_board_items(items);
        }
    }

    /// Closed non-copper record drawn as a polygon; records that do not
    /// close into a polygon are drawn item by item.
    fn load_polygon(&mut self, record: &TraceRecord) {
        let layer = self.db.board_layer(&record.layer).unwrap_or(BoardLayer::CmtsUser);
        let context = format!("record {} on layer {}", record.id, record.layer);
        let poly = ContourBuilder::new(SubContour::Merge, self.options.arc_max_error, &context)
            .build(record.segments.values(), self.diags);

        if poly.is_degenerate() {
            for item in record.segments.values() {
                let items = create_board_items(item, layer, &self.board.settings);
                self.add_board_items(items);
            }
            return;
        }
        self.board.add_shape(Shape {
            kind: ShapeKind::Polygon(poly),
            layer,
            width: 0,
            filled: layer.is_silk(),
        });
    }
}
