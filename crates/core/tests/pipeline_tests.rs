//! Batch runs over directories of real TrueType fonts

use std::{
    fs::{create_dir_all, read, write},
    path::Path,
};

use fontfill_core::{
    BatchReport, FailFast, FontLoader, FontResource, LeaveUnresolved, MergeConfig, OpenError,
    PairError, PairOutcome, Pipeline, Reconciliation, SfntFont, SfntLoader, UnifyUnitsMode,
    reconcile::Side,
};
use fontfill_font_metadata::{NameEntry, name_entries, set_name_entries};
use read_fonts::{FontRef, TableProvider, tables::glyf::CurvePoint, types::GlyphId};
use tempfile::TempDir;
use write_fonts::{
    FontBuilder,
    tables::{
        cmap::Cmap,
        glyf::{Bbox, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        maxp::Maxp,
        os2::Os2,
        post::Post,
    },
};

struct TestFont {
    /// (name, codepoint, square size)
    glyphs: Vec<(&'static str, Option<u32>, i16)>,
    units_per_em: u16,
    family: &'static str,
    fs_type: u16,
}

impl TestFont {
    fn new(family: &'static str, glyphs: &[(&'static str, Option<u32>, i16)]) -> Self {
        Self { glyphs: glyphs.to_vec(), units_per_em: 1000, family, fs_type: 0 }
    }

    fn units_per_em(mut self, upem: u16) -> Self {
        self.units_per_em = upem;
        self
    }

    fn fs_type(mut self, fs_type: u16) -> Self {
        self.fs_type = fs_type;
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut glyf_builder = GlyfLocaBuilder::new();
        for &(_, _, s) in &self.glyphs {
            let glyph = if s == 0 {
                Glyph::Empty
            } else {
                Glyph::Simple(SimpleGlyph {
                    bbox: Bbox { x_min: 0, y_min: 0, x_max: s, y_max: s },
                    contours: vec![Contour::from(vec![
                        CurvePoint::new(0, 0, true),
                        CurvePoint::new(0, s, true),
                        CurvePoint::new(s, s, true),
                        CurvePoint::new(s, 0, true),
                    ])],
                    instructions: vec![],
                })
            };
            glyf_builder.add_glyph(&glyph).unwrap();
        }
        let (glyf, loca, loca_format) = glyf_builder.build();
        let max = self.glyphs.iter().map(|g| g.2).max().unwrap_or(0);

        let cmap = Cmap::from_mappings(self.glyphs.iter().enumerate().filter_map(|(gid, g)| {
            Some((char::from_u32(g.1?)?, GlyphId::new(gid as u32)))
        }))
        .unwrap();

        let head = Head {
            font_revision: font_types::Fixed::from_f64(1.0),
            checksum_adjustment: 0,
            magic_number: 0x5F0F3CF5,
            flags: write_fonts::tables::head::Flags::empty(),
            units_per_em: self.units_per_em,
            created: font_types::LongDateTime::new(0),
            modified: font_types::LongDateTime::new(0),
            x_min: 0,
            y_min: 0,
            x_max: max,
            y_max: max,
            mac_style: write_fonts::tables::head::MacStyle::empty(),
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: match loca_format {
                write_fonts::tables::loca::LocaFormat::Short => 0,
                write_fonts::tables::loca::LocaFormat::Long => 1,
            },
        };

        let hhea = Hhea {
            ascender: font_types::FWord::new(800),
            descender: font_types::FWord::new(-200),
            line_gap: font_types::FWord::new(0),
            advance_width_max: font_types::UfWord::new(max as u16),
            min_left_side_bearing: font_types::FWord::new(0),
            min_right_side_bearing: font_types::FWord::new(0),
            x_max_extent: font_types::FWord::new(max),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: self.glyphs.len() as u16,
        };

        let hmtx = Hmtx {
            h_metrics: self
                .glyphs
                .iter()
                .map(|g| LongMetric { advance: g.2 as u16, side_bearing: 0 })
                .collect(),
            left_side_bearings: vec![],
        };

        let maxp = Maxp {
            num_glyphs: self.glyphs.len() as u16,
            max_points: Some(4),
            max_contours: Some(1),
            max_composite_points: Some(0),
            max_composite_contours: Some(0),
            max_zones: Some(1),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(0),
            max_component_depth: Some(0),
        };

        let mut builder = FontBuilder::new();
        builder.add_table(&head).unwrap();
        builder.add_table(&hhea).unwrap();
        builder.add_table(&maxp).unwrap();
        builder.add_table(&os2(self.fs_type)).unwrap();
        builder.add_table(&hmtx).unwrap();
        builder.add_table(&cmap).unwrap();
        builder.add_table(&glyf).unwrap();
        builder.add_table(&loca).unwrap();
        builder.add_table(&Post::new_v2(self.glyphs.iter().map(|g| g.0))).unwrap();
        let bare = builder.build();

        set_name_entries(
            &bare,
            &[
                NameEntry::windows(NameEntry::FAMILY, self.family),
                NameEntry::windows(NameEntry::SUBFAMILY, "Regular"),
                NameEntry::windows(NameEntry::FULL_NAME, format!("{} Regular", self.family)),
            ],
        )
        .unwrap()
    }
}

fn os2(fs_type: u16) -> Os2 {
    Os2 {
        x_avg_char_width: 500,
        us_weight_class: 400,
        us_width_class: 5,
        fs_type,
        y_subscript_x_size: 650,
        y_subscript_y_size: 600,
        y_subscript_x_offset: 0,
        y_subscript_y_offset: 75,
        y_superscript_x_size: 650,
        y_superscript_y_size: 600,
        y_superscript_x_offset: 0,
        y_superscript_y_offset: 350,
        y_strikeout_size: 50,
        y_strikeout_position: 300,
        s_family_class: 0,
        panose_10: [0; 10],
        ul_unicode_range_1: 0,
        ul_unicode_range_2: 0,
        ul_unicode_range_3: 0,
        ul_unicode_range_4: 0,
        ach_vend_id: font_types::Tag::new(b"NONE"),
        fs_selection: write_fonts::tables::os2::SelectionFlags::REGULAR,
        us_first_char_index: 0x20,
        us_last_char_index: 0x7E,
        s_typo_ascender: 700,
        s_typo_descender: -200,
        s_typo_line_gap: 0,
        us_win_ascent: 900,
        us_win_descent: 200,
        ul_code_page_range_1: Some(0),
        ul_code_page_range_2: Some(0),
        sx_height: Some(500),
        s_cap_height: Some(700),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        us_lower_optical_point_size: None,
        us_upper_optical_point_size: None,
    }
}

fn latin_source() -> TestFont {
    TestFont::new(
        "Donor Sans",
        &[
            (".notdef", None, 0),
            ("A", Some(0x41), 500),
            ("B", Some(0x42), 500),
            ("C", Some(0x43), 500),
        ],
    )
}

fn partial_target() -> TestFont {
    TestFont::new("Base Serif", &[(".notdef", None, 0), ("A", Some(0x41), 600)])
}

struct Dirs {
    _root: TempDir,
    config: MergeConfig,
}

impl Dirs {
    fn new() -> Self {
        Self::named("src_fonts", "tgt_fonts", "out_fonts")
    }

    fn named(source: &str, target: &str, output: &str) -> Self {
        let root = TempDir::new().unwrap();
        let config = MergeConfig::new().with_dirs(
            root.path().join(source),
            root.path().join(target),
            root.path().join(output),
        );
        Self { _root: root, config }
    }

    fn put(dir: &Path, name: &str, font: &TestFont) {
        let path = dir.join(name);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(path, font.build()).unwrap();
    }

    fn source(&self, name: &str, font: &TestFont) {
        Self::put(&self.config.source_dir, name, font);
    }

    fn target(&self, name: &str, font: &TestFont) {
        Self::put(&self.config.target_dir, name, font);
    }

    fn output_path(&self, name: &str) -> std::path::PathBuf {
        self.config.output_dir.join(name)
    }

    fn run(&self) -> BatchReport {
        Pipeline::new(&self.config, SfntLoader, FailFast).run(|_| {}).unwrap()
    }
}

fn open(path: &Path) -> SfntFont {
    SfntLoader.open(path, true).unwrap()
}

#[test]
fn test_output_is_superset_of_target() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());
    let original = open(&dirs.config.target_dir.join("Face.ttf"));

    let report = dirs.run();

    assert_eq!(report.merged(), 1);
    let merged = open(&dirs.output_path("Face.ttf"));
    let glyphs = merged.glyph_set().unwrap();
    assert!(glyphs.is_superset_of(&original.glyph_set().unwrap()));
    assert_eq!(glyphs.len(), 4);
    assert!(glyphs.get("C").is_some());

    // the target's own "A" is kept
    let font = FontRef::new(merged.data()).unwrap();
    assert_eq!(font.hmtx().unwrap().advance(GlyphId::new(1)), Some(600));
}

#[test]
fn test_metadata_copied_from_source() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());

    dirs.run();

    let source = read(dirs.config.source_dir.join("Face.ttf")).unwrap();
    let output = read(dirs.output_path("Face.ttf")).unwrap();
    assert_eq!(name_entries(&output).unwrap(), name_entries(&source).unwrap());
}

#[test]
fn test_metadata_kept_when_disabled() {
    let mut dirs = Dirs::new();
    dirs.config = dirs.config.clone().copy_metadata(false);
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());

    dirs.run();

    let target = read(dirs.config.target_dir.join("Face.ttf")).unwrap();
    let output = read(dirs.output_path("Face.ttf")).unwrap();
    assert_eq!(name_entries(&output).unwrap(), name_entries(&target).unwrap());
}

#[test]
fn test_merge_disabled_keeps_glyph_set() {
    let mut dirs = Dirs::new();
    dirs.config = dirs.config.clone().merge_glyphs(false);
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());
    let original = open(&dirs.config.target_dir.join("Face.ttf"));

    dirs.run();

    let merged = open(&dirs.output_path("Face.ttf"));
    assert_eq!(merged.glyph_set().unwrap(), original.glyph_set().unwrap());
}

#[test]
fn test_rerun_is_idempotent() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());
    dirs.run();
    let first = open(&dirs.output_path("Face.ttf"));

    // Feed the output back in as the target.
    let second_dirs = Dirs::new();
    second_dirs.source("Face.ttf", &latin_source());
    create_dir_all(&second_dirs.config.target_dir).unwrap();
    write(second_dirs.config.target_dir.join("Face.ttf"), first.data()).unwrap();
    second_dirs.run();

    let second = open(&second_dirs.output_path("Face.ttf"));
    assert_eq!(second.glyph_set().unwrap(), first.glyph_set().unwrap());
}

#[test]
fn test_source_rescaled_to_target_units() {
    let mut dirs = Dirs::new();
    dirs.config = dirs.config.clone().unify_units(UnifyUnitsMode::SourceToTarget);
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target().units_per_em(2048));

    let report = dirs.run();

    match &report.pairs[0].outcome {
        PairOutcome::Merged { reconciliation, .. } => assert_eq!(
            *reconciliation,
            Some(Reconciliation::Rescaled { side: Side::Source, from: 1000, to: 2048 })
        ),
        other => panic!("unexpected outcome {other:?}"),
    }

    let merged = open(&dirs.output_path("Face.ttf"));
    assert_eq!(merged.em(), 2048);
    let font = FontRef::new(merged.data()).unwrap();
    let glyphs = merged.glyph_set().unwrap();
    let b = glyphs.entries().iter().position(|g| g.name == "B").unwrap();
    assert_eq!(font.hmtx().unwrap().advance(GlyphId::new(b as u32)), Some(1024));
}

#[test]
fn test_unresolved_units_still_merge() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target().units_per_em(2048));

    let report = Pipeline::new(&dirs.config, SfntLoader, LeaveUnresolved).run(|_| {}).unwrap();

    assert_eq!(report.merged(), 1);
    assert_eq!(open(&dirs.output_path("Face.ttf")).em(), 2048);
}

#[test]
fn test_unmatched_target_skipped() {
    let dirs = Dirs::new();
    dirs.source("Other.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());

    let mut lines = Vec::new();
    let report = Pipeline::new(&dirs.config, SfntLoader, FailFast)
        .run(|e| lines.push(e.to_string()))
        .unwrap();

    assert_eq!(report.skipped(), 1);
    assert!(!report.has_failures());
    assert!(!dirs.output_path("Face.ttf").exists());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("has no corresponding source .ttf file, skipping."));
}

#[test]
fn test_dirs_with_glob_metacharacters() {
    let dirs = Dirs::named("src [v2]", "tgt *?", "out [v2]");
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());

    let report = dirs.run();

    assert_eq!(report.merged(), 1);
    assert!(dirs.output_path("Face.ttf").exists());
}

#[test]
fn test_target_cmap_layout_is_kept() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source());
    dirs.target("Face.ttf", &partial_target());

    dirs.run();

    let encodings = |data: &[u8]| -> Vec<(u16, u16, u16)> {
        let font = FontRef::new(data).unwrap();
        let cmap = font.cmap().unwrap();
        cmap.encoding_records()
            .iter()
            .map(|r| {
                let format = r.subtable(cmap.offset_data()).unwrap().format();
                (r.platform_id() as u16, r.encoding_id(), format)
            })
            .collect()
    };
    let target = read(dirs.config.target_dir.join("Face.ttf")).unwrap();
    let output = read(dirs.output_path("Face.ttf")).unwrap();
    assert_eq!(encodings(&output), encodings(&target));
    assert_eq!(encodings(&output), vec![(0, 3, 4), (3, 1, 4)]);
}

#[test]
fn test_broken_pair_does_not_stop_batch() {
    let dirs = Dirs::new();
    dirs.source("Broken.ttf", &latin_source());
    create_dir_all(&dirs.config.target_dir).unwrap();
    write(dirs.config.target_dir.join("Broken.ttf"), b"definitely not a font").unwrap();
    dirs.source("Good.ttf", &latin_source());
    dirs.target("Good.ttf", &partial_target());

    let report = dirs.run();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.merged(), 1);
    assert!(dirs.output_path("Good.ttf").exists());
    assert!(!dirs.output_path("Broken.ttf").exists());
    let (target, err) = report.failures().next().unwrap();
    assert!(target.ends_with("Broken.ttf"));
    assert!(matches!(err, PairError::Open { source: OpenError::Read(_), .. }));
}

#[test]
fn test_restricted_font_needs_permission() {
    let dirs = Dirs::new();
    dirs.source("Face.ttf", &latin_source().fs_type(0x0002));
    dirs.target("Face.ttf", &partial_target());

    let report = dirs.run();
    let (_, err) = report.failures().next().unwrap();
    assert!(matches!(
        err,
        PairError::Open { source: OpenError::EmbeddingRestricted { fs_type: 0x0002 }, .. }
    ));

    let mut permitted = Dirs::new();
    permitted.config = permitted.config.clone().fstype_permitted(true);
    permitted.source("Face.ttf", &latin_source().fs_type(0x0002));
    permitted.target("Face.ttf", &partial_target());
    assert_eq!(permitted.run().merged(), 1);
}

#[test]
fn test_missing_directories_are_empty() {
    let dirs = Dirs::new();
    let report = dirs.run();
    assert_eq!(report.total(), 0);
    assert!(dirs.config.output_dir.is_dir());
}
