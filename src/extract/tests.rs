use super::assemble::{PagePairing, assemble};
use super::fields::{LayoutProfile, find_flag, find_value};
use super::layout::parse_bbox_pages;
use crate::model::{PageFragments, PositionedFragment};

fn frag(text: &str, x: i32, y: i32) -> PositionedFragment {
    PositionedFragment {
        text: text.to_string(),
        x,
        y,
    }
}

#[test]
fn parse_bbox_pages_rounds_coordinates_and_drops_whitespace_runs() {
    let body = r#"<?xml version="1.0"?>
<html><body><doc>
<page width="595.000000" height="842.000000">
  <word xMin="40.20" yMin="100.49" xMax="70.00" yMax="110.00">車名</word>
  <word xMin="120.80" yMin="99.80" xMax="180.00" yMax="110.00">カワサキ</word>
  <word xMin="200.00" yMin="99.80" xMax="210.00" yMax="110.00">   </word>
</page>
<page width="595.000000" height="842.000000">
  <word xMin="40.00" yMin="60.00" xMax="70.00" yMax="70.00">発行日</word>
</page>
</doc></body></html>"#;

    let pages = parse_bbox_pages(body).expect("bbox parse");

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].len(), 2);
    assert_eq!(pages[0][0], frag("車名", 40, 100));
    assert_eq!(pages[0][1], frag("カワサキ", 121, 100));
    assert_eq!(pages[1][0].text, "発行日");
}

#[test]
fn parse_bbox_pages_unescapes_entities_and_rejects_pageless_output() {
    let body = r#"<page width="595" height="842">
  <word xMin="10.0" yMin="10.0" xMax="20.0" yMax="20.0">A&amp;B&lt;C&gt;</word>
</page>"#;
    let pages = parse_bbox_pages(body).expect("bbox parse");
    assert_eq!(pages[0][0].text, "A&B<C>");

    assert!(parse_bbox_pages("<html><body></body></html>").is_err());
}

#[test]
fn find_value_joins_same_row_fragments_left_to_right() {
    let fragments = vec![
        frag("登録番号", 40, 120),
        frag("あ", 200, 120),
        frag("品川", 140, 121),
        frag("12-34", 240, 119),
        // Next column, outside the window.
        frag("車台番号", 400, 120),
        // Different row.
        frag("他の値", 150, 160),
    ];

    let value = find_value(&fragments, "登録番号", 2, 360);
    assert_eq!(value, "品川 あ 12-34");
}

#[test]
fn find_value_is_empty_for_absent_labels_and_out_of_window_values() {
    let fragments = vec![frag("登録番号", 40, 120), frag("値", 380, 120)];

    assert_eq!(find_value(&fragments, "存在しないラベル", 2, 360), "");
    assert_eq!(find_value(&fragments, "登録番号", 2, 360), "");
}

#[test]
fn find_value_matches_labels_embedded_in_longer_fragments() {
    let fragments = vec![frag("【登録番号】", 40, 120), frag("品川12-34", 140, 120)];

    assert_eq!(find_value(&fragments, "登録番号", 2, 360), "品川12-34");
}

#[test]
fn find_flag_reads_only_the_nearest_band_token() {
    let fragments = vec![
        frag("電気自動車", 40, 200),
        frag("有", 80, 200),
        frag("無", 300, 200),
    ];
    assert!(find_flag(&fragments, "電気自動車", 2, 60, "有"));

    let fragments = vec![frag("電気自動車", 40, 200), frag("無", 80, 200)];
    assert!(!find_flag(&fragments, "電気自動車", 2, 60, "有"));

    // No token in the band at all.
    let fragments = vec![frag("電気自動車", 40, 200), frag("有", 200, 200)];
    assert!(!find_flag(&fragments, "電気自動車", 2, 60, "有"));

    let fragments = vec![frag("有", 80, 200)];
    assert!(!find_flag(&fragments, "電気自動車", 2, 60, "有"));
}

fn detail_page(detail: &str, registration: &str) -> PageFragments {
    vec![
        frag("明細番号", 40, 80),
        frag(detail, 120, 80),
        frag("車名", 40, 100),
        frag("カワサキ", 120, 100),
        frag("登録番号", 40, 120),
        frag(registration, 140, 120),
        frag("車台番号", 40, 140),
        frag("ZX10R-012345", 140, 140),
        frag("電気自動車", 40, 200),
        frag("無", 80, 200),
        frag("ハイブリッド車", 40, 220),
        frag("有", 100, 220),
    ]
}

fn date_page(date: &str) -> PageFragments {
    vec![frag("発行日", 40, 60), frag(date, 140, 60)]
}

#[test]
fn assemble_pairs_pages_and_reads_the_date_from_the_companion() {
    let pages = vec![
        detail_page("0001", "品川 300 あ 12-34"),
        date_page("2026年3月1日"),
        detail_page("0002", "練馬 400 い 56-78"),
        date_page("2026年3月1日"),
    ];

    let records = assemble(
        &pages,
        &LayoutProfile::insurer_default(),
        PagePairing::default(),
    );

    assert_eq!(records.len(), 2);

    assert_eq!(records[0].detail_number, "0001");
    assert_eq!(records[0].registration_number, "品川 300 あ 12-34");
    assert_eq!(records[0].frame_number, "ZX10R-012345");
    assert_eq!(records[0].document_date, "2026年3月1日");
    assert!(!records[0].is_electric_vehicle);
    assert!(records[0].is_hybrid);
    assert!(!records[0].is_aeb);
    assert_eq!(records[0].page_start, 1);
    assert_eq!(records[0].page_end, 2);

    assert_eq!(records[1].detail_number, "0002");
    assert_eq!(records[1].page_start, 3);
    assert_eq!(records[1].page_end, 4);
}

#[test]
fn assemble_honours_the_pairing_invariant() {
    let pages = vec![
        detail_page("0001", "品川 300 あ 12-34"),
        date_page("2026年3月1日"),
        detail_page("0002", "練馬 400 い 56-78"),
        date_page("2026年3月1日"),
        detail_page("0003", "足立 500 う 90-12"),
        date_page("2026年3月1日"),
    ];

    let records = assemble(
        &pages,
        &LayoutProfile::insurer_default(),
        PagePairing::default(),
    );

    let mut starts = Vec::new();
    for record in &records {
        assert_eq!(record.page_end, record.page_start + 1);
        assert!(!starts.contains(&record.page_start));
        starts.push(record.page_start);
    }
}

#[test]
fn assemble_tolerates_an_odd_trailing_page() {
    let pages = vec![
        detail_page("0001", "品川 300 あ 12-34"),
        date_page("2026年3月1日"),
        detail_page("0002", "練馬 400 い 56-78"),
    ];

    let records = assemble(
        &pages,
        &LayoutProfile::insurer_default(),
        PagePairing::default(),
    );

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].detail_number, "0002");
    assert_eq!(records[1].document_date, "");
    assert_eq!(records[1].page_start, 3);
    assert_eq!(records[1].page_end, 4);
}

#[test]
fn assemble_accepts_an_alternate_page_role_mapping() {
    // Hypothetical layout revision: date page first, detail page second.
    let pages = vec![
        date_page("2026年3月1日"),
        detail_page("0001", "品川 300 あ 12-34"),
    ];
    let pairing = PagePairing {
        pages_per_record: 2,
        detail_page: 1,
        date_page: 0,
    };

    let records = assemble(&pages, &LayoutProfile::insurer_default(), pairing);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].detail_number, "0001");
    assert_eq!(records[0].document_date, "2026年3月1日");
}
