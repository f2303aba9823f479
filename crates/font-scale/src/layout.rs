//! OpenType layout coordinate scaling.
//!
//! Positioning values and anchors in `GPOS`, baseline coordinates in `BASE`
//! and ligature caret positions in `GDEF`. Device tables hold per-ppem pixel
//! adjustments and are left alone.

use anyhow::Result;
use read_fonts::{FontRef, TableProvider, types::Tag};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        base::{Base, BaseCoord, MinMax},
        gdef::{CaretValue, Gdef},
        gpos::{
            AnchorTable, CursivePosFormat1, ExtensionSubtable, Gpos, MarkArray,
            MarkBasePosFormat1, MarkLigPosFormat1, MarkMarkPosFormat1, PairPos, PositionLookup,
            SinglePos, ValueRecord,
        },
        layout::Lookup,
    },
};

use crate::Scale;

pub(crate) fn scale_gpos(font: &FontRef, scale: Scale) -> Result<Option<Gpos>> {
    if font.table_data(Tag::new(b"GPOS")).is_none() {
        return Ok(None);
    }
    let mut gpos: Gpos = font.gpos()?.to_owned_table();
    for lookup in gpos.lookup_list.lookups.iter_mut() {
        scale_lookup(lookup, scale);
    }
    Ok(Some(gpos))
}

pub(crate) fn scale_base(font: &FontRef, scale: Scale) -> Result<Option<Base>> {
    if font.table_data(Tag::new(b"BASE")).is_none() {
        return Ok(None);
    }
    let mut base: Base = font.base()?.to_owned_table();
    for axis in [base.horiz_axis.as_mut(), base.vert_axis.as_mut()].into_iter().flatten() {
        for record in axis.base_script_list.base_script_records.iter_mut() {
            let script = &mut record.base_script;
            if let Some(values) = script.base_values.as_mut() {
                for coord in values.base_coords.iter_mut() {
                    scale_base_coord(coord, scale);
                }
            }
            if let Some(min_max) = script.default_min_max.as_mut() {
                scale_min_max(min_max, scale);
            }
            for lang_sys in script.base_lang_sys_records.iter_mut() {
                scale_min_max(&mut lang_sys.min_max, scale);
            }
        }
    }
    Ok(Some(base))
}

pub(crate) fn scale_gdef(font: &FontRef, scale: Scale) -> Result<Option<Gdef>> {
    if font.table_data(Tag::new(b"GDEF")).is_none() {
        return Ok(None);
    }
    let mut gdef: Gdef = font.gdef()?.to_owned_table();
    if let Some(carets) = gdef.lig_caret_list.as_mut() {
        for lig_glyph in carets.lig_glyphs.iter_mut() {
            for caret in lig_glyph.caret_values.iter_mut() {
                match &mut **caret {
                    CaretValue::Format1(c) => c.coordinate = scale.apply(c.coordinate),
                    // contour point index
                    CaretValue::Format2(_) => {}
                    CaretValue::Format3(c) => c.coordinate = scale.apply(c.coordinate),
                }
            }
        }
    }
    Ok(Some(gdef))
}

fn subtables<T>(lookup: &mut Lookup<T>) -> impl Iterator<Item = &mut T> + '_ {
    lookup.subtables.iter_mut().map(|s| &mut **s)
}

fn scale_lookup(lookup: &mut PositionLookup, scale: Scale) {
    match lookup {
        PositionLookup::Single(l) => subtables(l).for_each(|s| scale_single(s, scale)),
        PositionLookup::Pair(l) => subtables(l).for_each(|s| scale_pair(s, scale)),
        PositionLookup::Cursive(l) => subtables(l).for_each(|s| scale_cursive(s, scale)),
        PositionLookup::MarkToBase(l) => subtables(l).for_each(|s| scale_mark_base(s, scale)),
        PositionLookup::MarkToLig(l) => subtables(l).for_each(|s| scale_mark_lig(s, scale)),
        PositionLookup::MarkToMark(l) => subtables(l).for_each(|s| scale_mark_mark(s, scale)),
        PositionLookup::Extension(l) => subtables(l).for_each(|s| scale_extension(s, scale)),
        // only reference other lookups
        PositionLookup::Contextual(_) | PositionLookup::ChainContextual(_) => {}
    }
}

fn scale_extension(extension: &mut ExtensionSubtable, scale: Scale) {
    match extension {
        ExtensionSubtable::Single(e) => scale_single(&mut e.extension, scale),
        ExtensionSubtable::Pair(e) => scale_pair(&mut e.extension, scale),
        ExtensionSubtable::Cursive(e) => scale_cursive(&mut e.extension, scale),
        ExtensionSubtable::MarkToBase(e) => scale_mark_base(&mut e.extension, scale),
        ExtensionSubtable::MarkToLig(e) => scale_mark_lig(&mut e.extension, scale),
        ExtensionSubtable::MarkToMark(e) => scale_mark_mark(&mut e.extension, scale),
        ExtensionSubtable::Contextual(_) | ExtensionSubtable::ChainContextual(_) => {}
    }
}

fn scale_value_record(record: &mut ValueRecord, scale: Scale) {
    for value in [
        &mut record.x_placement,
        &mut record.y_placement,
        &mut record.x_advance,
        &mut record.y_advance,
    ] {
        if let Some(v) = value {
            *v = scale.apply(*v);
        }
    }
}

fn scale_single(single: &mut SinglePos, scale: Scale) {
    match single {
        SinglePos::Format1(t) => scale_value_record(&mut t.value_record, scale),
        SinglePos::Format2(t) => {
            t.value_records.iter_mut().for_each(|r| scale_value_record(r, scale));
        }
    }
}

fn scale_pair(pair: &mut PairPos, scale: Scale) {
    match pair {
        PairPos::Format1(t) => {
            for set in t.pair_sets.iter_mut() {
                for record in set.pair_value_records.iter_mut() {
                    scale_value_record(&mut record.value_record1, scale);
                    scale_value_record(&mut record.value_record2, scale);
                }
            }
        }
        PairPos::Format2(t) => {
            for class1 in t.class1_records.iter_mut() {
                for class2 in class1.class2_records.iter_mut() {
                    scale_value_record(&mut class2.value_record1, scale);
                    scale_value_record(&mut class2.value_record2, scale);
                }
            }
        }
    }
}

fn scale_anchor(anchor: &mut AnchorTable, scale: Scale) {
    let (x, y) = match anchor {
        AnchorTable::Format1(a) => (&mut a.x_coordinate, &mut a.y_coordinate),
        AnchorTable::Format2(a) => (&mut a.x_coordinate, &mut a.y_coordinate),
        AnchorTable::Format3(a) => (&mut a.x_coordinate, &mut a.y_coordinate),
    };
    *x = scale.apply(*x);
    *y = scale.apply(*y);
}

fn scale_optional_anchor(anchor: Option<&mut AnchorTable>, scale: Scale) {
    if let Some(anchor) = anchor {
        scale_anchor(anchor, scale);
    }
}

fn scale_mark_array(marks: &mut MarkArray, scale: Scale) {
    for record in marks.mark_records.iter_mut() {
        scale_anchor(&mut record.mark_anchor, scale);
    }
}

fn scale_cursive(cursive: &mut CursivePosFormat1, scale: Scale) {
    for record in cursive.entry_exit_record.iter_mut() {
        scale_optional_anchor(record.entry_anchor.as_mut(), scale);
        scale_optional_anchor(record.exit_anchor.as_mut(), scale);
    }
}

fn scale_mark_base(pos: &mut MarkBasePosFormat1, scale: Scale) {
    scale_mark_array(&mut pos.mark_array, scale);
    for record in pos.base_array.base_records.iter_mut() {
        for anchor in record.base_anchors.iter_mut() {
            scale_optional_anchor(anchor.as_mut(), scale);
        }
    }
}

fn scale_mark_lig(pos: &mut MarkLigPosFormat1, scale: Scale) {
    scale_mark_array(&mut pos.mark_array, scale);
    for attach in pos.ligature_array.ligature_attaches.iter_mut() {
        for component in attach.component_records.iter_mut() {
            for anchor in component.ligature_anchors.iter_mut() {
                scale_optional_anchor(anchor.as_mut(), scale);
            }
        }
    }
}

fn scale_mark_mark(pos: &mut MarkMarkPosFormat1, scale: Scale) {
    scale_mark_array(&mut pos.mark1_array, scale);
    for record in pos.mark2_array.mark2_records.iter_mut() {
        for anchor in record.mark2_anchors.iter_mut() {
            scale_optional_anchor(anchor.as_mut(), scale);
        }
    }
}

fn scale_min_max(min_max: &mut MinMax, scale: Scale) {
    if let Some(coord) = min_max.min_coord.as_mut() {
        scale_base_coord(coord, scale);
    }
    if let Some(coord) = min_max.max_coord.as_mut() {
        scale_base_coord(coord, scale);
    }
    for record in min_max.feat_min_max_records.iter_mut() {
        if let Some(coord) = record.min_coord.as_mut() {
            scale_base_coord(coord, scale);
        }
        if let Some(coord) = record.max_coord.as_mut() {
            scale_base_coord(coord, scale);
        }
    }
}

fn scale_base_coord(coord: &mut BaseCoord, scale: Scale) {
    let value = match coord {
        BaseCoord::Format1(c) => &mut c.coordinate,
        BaseCoord::Format2(c) => &mut c.coordinate,
        BaseCoord::Format3(c) => &mut c.coordinate,
    };
    *value = scale.apply(*value);
}

#[cfg(test)]
mod tests {
    use write_fonts::tables::gpos::AnchorFormat2;

    use super::*;

    #[test]
    fn test_scale_value_record_keeps_absent_fields() {
        let scale = Scale::new(1000, 2048).unwrap();
        let mut record = ValueRecord::new().with_x_advance(-50);
        scale_value_record(&mut record, scale);
        assert_eq!(record.x_advance, Some(-102));
        assert_eq!(record.x_placement, None);
        assert_eq!(record.y_advance, None);
    }

    #[test]
    fn test_scale_anchor_keeps_point_index() {
        let scale = Scale::new(1000, 500).unwrap();
        let mut anchor = AnchorTable::Format2(AnchorFormat2::new(300, -120, 7));
        scale_anchor(&mut anchor, scale);
        let AnchorTable::Format2(a) = anchor else { unreachable!() };
        assert_eq!((a.x_coordinate, a.y_coordinate, a.anchor_point), (150, -60, 7));
    }
}
