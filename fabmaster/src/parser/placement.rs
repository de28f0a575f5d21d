//! Component, pin, net and via sections.

use super::columns::{cell, opt_cell, read_double, resolve_column, scaled, scaled_y, ColumnNotFound};
use super::section::SectionKind;
use super::tokenizer::Row;
use super::{walk_section, ImportContext};
use crate::database::{Component, ComponentClass, NetBinding, Pin, SymbolType, ViaRecord};

struct ComponentColumns {
    refdes: usize,
    class: usize,
    sym_name: usize,
    mirror: usize,
    rotation: usize,
    x: usize,
    y: usize,
    part_number: Option<usize>,
    height: Option<usize>,
    device_label: Option<usize>,
    insertion_code: Option<usize>,
    sym_type: Option<usize>,
    value: Option<usize>,
    tolerance: Option<usize>,
    voltage: Option<usize>,
}

impl ComponentColumns {
    fn resolve(header: &Row) -> Result<Self, ColumnNotFound> {
        Ok(Self {
            refdes: resolve_column(header, "REFDES")?,
            class: resolve_column(header, "COMPCLASS")?,
            sym_name: resolve_column(header, "SYMNAME")?,
            mirror: resolve_column(header, "SYMMIRROR")?,
            rotation: resolve_column(header, "SYMROTATE")?,
            x: resolve_column(header, "SYMX")?,
            y: resolve_column(header, "SYMY")?,
            part_number: resolve_column(header, "COMPPARTNUMBER").ok(),
            height: resolve_column(header, "COMPHEIGHT").ok(),
            device_label: resolve_column(header, "COMPDEVICELABEL").ok(),
            insertion_code: resolve_column(header, "COMPINSERTIONCODE").ok(),
            sym_type: resolve_column(header, "SYMTYPE").ok(),
            value: resolve_column(header, "COMPVALUE").ok(),
            tolerance: resolve_column(header, "COMPTOL").ok(),
            voltage: resolve_column(header, "COMPVOLTAGE").ok(),
        })
    }
}

pub(super) fn process_components(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Footprints,
        ComponentColumns::resolve,
        |c, row, rownum, scale, ctx| {
            let refdes = cell(row, c.refdes);
            let (x, y, rotation) = (cell(row, c.x), cell(row, c.y), cell(row, c.rotation));
            if refdes.is_empty() {
                return;
            }
            if x.is_empty() || y.is_empty() || rotation.is_empty() {
                ctx.diagnostics.warn(
                    format!("skipping unplaced component {}", refdes),
                    Some(rownum + 1),
                );
                return;
            }

            let component = Component {
                refdes: refdes.to_string(),
                class: ComponentClass::parse(cell(row, c.class)),
                part_number: opt_cell(row, c.part_number).to_string(),
                height: opt_cell(row, c.height).to_string(),
                device_label: opt_cell(row, c.device_label).to_string(),
                insertion_code: opt_cell(row, c.insertion_code).to_string(),
                symbol_type: SymbolType::parse(opt_cell(row, c.sym_type)),
                name: cell(row, c.sym_name).to_string(),
                mirror: cell(row, c.mirror) == "YES",
                rotation: read_double(rotation),
                x: scaled(x, scale),
                y: scaled_y(y, scale),
                value: opt_cell(row, c.value).to_string(),
                tolerance: opt_cell(row, c.tolerance).to_string(),
                voltage: opt_cell(row, c.voltage).to_string(),
            };
            ctx.db
                .components
                .entry(component.refdes.clone())
                .or_default()
                .push(component);
        },
    )
}

struct PinColumns {
    sym_name: usize,
    mirror: Option<usize>,
    pin_name: usize,
    pin_number: usize,
    x: usize,
    y: usize,
    padstack: usize,
    refdes: usize,
    rotation: Option<usize>,
    test_point: Option<usize>,
}

impl PinColumns {
    fn resolve(header: &Row) -> Result<Self, ColumnNotFound> {
        Ok(Self {
            sym_name: resolve_column(header, "SYMNAME")?,
            mirror: resolve_column(header, "SYMMIRROR").ok(),
            pin_name: resolve_column(header, "PINNAME")?,
            pin_number: resolve_column(header, "PINNUMBER")?,
            x: resolve_column(header, "PINX")?,
            y: resolve_column(header, "PINY")?,
            padstack: resolve_column(header, "PADSTACKNAME")?,
            refdes: resolve_column(header, "REFDES")?,
            rotation: resolve_column(header, "PINROTATION").ok(),
            test_point: resolve_column(header, "TESTPOINT").ok(),
        })
    }
}

pub(super) fn process_pins(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Pins,
        PinColumns::resolve,
        |c, row, rownum, scale, ctx| {
            let refdes = cell(row, c.refdes);
            if refdes.is_empty() {
                return;
            }
            let (x, y) = (cell(row, c.x), cell(row, c.y));
            if x.is_empty() || y.is_empty() {
                ctx.diagnostics.warn(
                    format!("skipping unplaced pin {}.{}", refdes, cell(row, c.pin_number)),
                    Some(rownum + 1),
                );
                return;
            }
            let pin = Pin {
                symbol: cell(row, c.sym_name).to_string(),
                name: cell(row, c.pin_name).to_string(),
                number: cell(row, c.pin_number).to_string(),
                x: scaled(x, scale),
                y: scaled_y(y, scale),
                rotation: read_double(opt_cell(row, c.rotation)),
                padstack: cell(row, c.padstack).to_string(),
                refdes: refdes.to_string(),
                mirror: opt_cell(row, c.mirror) == "YES",
                test_point: !opt_cell(row, c.test_point).is_empty(),
            };

            let pins = ctx.db.pins.entry(refdes.to_string()).or_default();
            if pins.contains_key(&pin.number) {
                ctx.diagnostics.warn(
                    format!("duplicate pin {} on {}", pin.number, refdes),
                    Some(rownum + 1),
                );
                return;
            }
            pins.insert(pin.number.clone(), pin);
        },
    )
}

struct NetColumns {
    name: usize,
    refdes: usize,
    pin_number: usize,
    pin_name: Option<usize>,
    ground: Option<usize>,
    power: Option<usize>,
}

pub(super) fn process_nets(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Nets,
        |header| {
            Ok::<_, ColumnNotFound>(NetColumns {
                name: resolve_column(header, "NETNAME")?,
                refdes: resolve_column(header, "REFDES")?,
                pin_number: resolve_column(header, "PINNUMBER")?,
                pin_name: resolve_column(header, "PINNAME").ok(),
                ground: resolve_column(header, "PINGROUND").ok(),
                power: resolve_column(header, "PINPOWER").ok(),
            })
        },
        |c, row, _, _, ctx| {
            let binding = NetBinding {
                name: cell(row, c.name).to_string(),
                refdes: cell(row, c.refdes).to_string(),
                pin_number: cell(row, c.pin_number).to_string(),
                pin_name: opt_cell(row, c.pin_name).to_string(),
                ground: opt_cell(row, c.ground) == "YES",
                power: opt_cell(row, c.power) == "YES",
            };
            if !binding.name.is_empty() {
                ctx.db.net_names.insert(binding.name.clone());
            }
            ctx.db
                .pin_nets
                .insert((binding.refdes.clone(), binding.pin_number.clone()), binding);
        },
    )
}

struct ViaColumns {
    x: usize,
    y: usize,
    padstack: usize,
    net: usize,
    test_point: Option<usize>,
}

pub(super) fn process_vias(rows: &[Row], offset: usize, ctx: &mut ImportContext) -> usize {
    walk_section(
        rows,
        offset,
        ctx,
        SectionKind::Vias,
        |header| {
            Ok::<_, ColumnNotFound>(ViaColumns {
                x: resolve_column(header, "VIAX")?,
                y: resolve_column(header, "VIAY")?,
                padstack: resolve_column(header, "PADSTACKNAME")?,
                net: resolve_column(header, "NETNAME")?,
                test_point: resolve_column(header, "TESTPOINT").ok(),
            })
        },
        |c, row, rownum, scale, ctx| {
            let (x, y) = (cell(row, c.x), cell(row, c.y));
            if x.is_empty() || y.is_empty() {
                ctx.diagnostics.warn(
                    format!("skipping via {} without a position", cell(row, c.padstack)),
                    Some(rownum + 1),
                );
                return;
            }
            ctx.db.vias.push(ViaRecord {
                x: scaled(x, scale),
                y: scaled_y(y, scale),
                padstack: cell(row, c.padstack).to_string(),
                net: cell(row, c.net).to_string(),
                test_point: !opt_cell(row, c.test_point).is_empty(),
            });
        },
    )
}
