//! Archive export scenarios.

use std::io::{Cursor, Read};

use image::RgbImage;
use zip::ZipArchive;

use super::*;
use crate::config::UserPreferences;
use crate::error::AnnotatorError;
use crate::export::ExportArchive;
use crate::model::BoundingBox;
use crate::session::{Control, ControlOutcome};

fn read_entries(archive: &ExportArchive) -> Vec<(String, RgbImage)> {
    let mut zip = ZipArchive::new(Cursor::new(archive.bytes.as_slice())).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            let decoded = image::load_from_memory(&data).unwrap().to_rgb8();
            (name, decoded)
        })
        .collect()
}

fn is_mostly_red(img: &RgbImage) -> bool {
    let p = img.get_pixel(img.width() / 2, img.height() / 2);
    p[0] > 200 && p[1] < 60 && p[2] < 60
}

fn is_mostly_blue(img: &RgbImage) -> bool {
    let p = img.get_pixel(img.width() / 2, img.height() / 2);
    p[2] > 200 && p[0] < 60 && p[1] < 60
}

fn split_session() -> AnnotatorSession {
    // 800x600 fits a 400x300 canvas exactly, at half resolution.
    let mut session = AnnotatorSession::default();
    session
        .load_pixels(split_image(800, 600), Size::new(400.0, 300.0))
        .unwrap();
    session
}

#[test]
fn test_export_crops_native_pixels_in_order() {
    let mut session = split_session();
    drag(&mut session, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
    drag(&mut session, Point::new(350.0, 250.0), Point::new(250.0, 150.0));

    let archive = session.export().unwrap();
    assert_eq!(archive.name, "Cropped_Images.zip");
    assert_eq!(
        archive.entries,
        vec!["cropped_image_1.jpg", "cropped_image_2.jpg"]
    );
    assert!(archive.warnings.is_empty());

    let entries = read_entries(&archive);
    assert_eq!(entries.len(), 2);

    let (name, first) = &entries[0];
    assert_eq!(name, "cropped_image_1.jpg");
    assert_eq!(first.dimensions(), (200, 100));
    assert!(is_mostly_red(first));

    // Drawn up-and-left; still exported with positive size.
    let (name, second) = &entries[1];
    assert_eq!(name, "cropped_image_2.jpg");
    assert_eq!(second.dimensions(), (200, 200));
    assert!(is_mostly_blue(second));
}

#[test]
fn test_export_ignores_current_view() {
    let mut session = split_session();
    drag(&mut session, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
    let before = session.export().unwrap();

    session.zoom_in();
    session.zoom_in();
    session.toggle_pan_mode();
    drag(&mut session, Point::new(0.0, 0.0), Point::new(-40.0, 25.0));
    let after = session.export().unwrap();

    let before = read_entries(&before);
    let after = read_entries(&after);
    assert_eq!(before[0].1.dimensions(), (200, 100));
    assert_eq!(before, after);
}

#[test]
fn test_box_drawn_while_zoomed_matches_what_was_boxed() {
    let mut session = split_session();
    for _ in 0..3 {
        session.zoom_in();
    }
    let t = session.transform();
    // Box the display-space region (250, 20)-(350, 120), in the blue half.
    drag(
        &mut session,
        t.image_to_screen(Point::new(250.0, 20.0)),
        t.image_to_screen(Point::new(350.0, 120.0)),
    );

    let archive = session.export().unwrap();
    let entries = read_entries(&archive);
    assert_eq!(entries[0].1.dimensions(), (200, 200));
    assert!(is_mostly_blue(&entries[0].1));
}

#[test]
fn test_box_outside_image_is_skipped_and_numbering_kept() {
    let mut session = AnnotatorSession::default();
    // 200x100 in 400x300 leaves 50px bands above and below the image.
    session
        .load_pixels(split_image(200, 100), Size::new(400.0, 300.0))
        .unwrap();
    drag(&mut session, Point::new(10.0, 0.0), Point::new(60.0, 40.0));
    drag(&mut session, Point::new(20.0, 60.0), Point::new(80.0, 120.0));

    let archive = session.export().unwrap();
    assert_eq!(archive.entries, vec!["cropped_image_2.jpg"]);
    assert_eq!(archive.warnings.len(), 1);
    assert!(archive.warnings[0].contains("#1"));

    let entries = read_entries(&archive);
    assert_eq!(entries.len(), 1);
    // Display-to-native ratio is 0.5.
    assert_eq!(entries[0].1.dimensions(), (30, 30));
}

#[test]
fn test_only_boxes_in_letterbox_band_is_nothing_to_export() {
    let mut session = AnnotatorSession::default();
    session
        .load_pixels(split_image(200, 100), Size::new(400.0, 300.0))
        .unwrap();
    drag(&mut session, Point::new(10.0, 0.0), Point::new(60.0, 40.0));
    assert_eq!(session.box_store().len(), 1);

    let err = session.export().unwrap_err();
    assert!(matches!(err, AnnotatorError::NothingToExport));
    assert!(session.last_error().is_some());
    // The box is kept; only the export failed.
    assert_eq!(session.box_store().len(), 1);
}

#[test]
fn test_export_control_returns_archive() {
    let mut session = split_session();
    drag(&mut session, Point::new(10.0, 10.0), Point::new(110.0, 60.0));

    match session.apply(Control::Export).unwrap() {
        ControlOutcome::Exported(archive) => assert_eq!(archive.entries.len(), 1),
        other => panic!("expected an archive, got {:?}", other),
    }
}

#[test]
fn test_archive_goes_stale_after_new_upload() {
    let mut session = split_session();
    drag(&mut session, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
    let archive = session.export().unwrap();
    assert!(session.is_current(&archive));

    session
        .load_pixels(split_image(64, 64), Size::new(400.0, 300.0))
        .unwrap();
    assert!(!session.is_current(&archive));
}

#[test]
fn test_archive_name_and_quality_from_preferences() {
    let preferences = UserPreferences {
        archive_name: "crops.zip".to_string(),
        jpeg_quality: 40,
        ..UserPreferences::default()
    };
    let mut session = AnnotatorSession::new(preferences);
    session
        .load_pixels(split_image(800, 600), Size::new(400.0, 300.0))
        .unwrap();
    drag(&mut session, Point::new(10.0, 10.0), Point::new(110.0, 60.0));

    let archive = session.export().unwrap();
    assert_eq!(archive.name, "crops.zip");
    assert_eq!(read_entries(&archive)[0].1.dimensions(), (200, 100));
}

#[test]
fn test_many_boxes_export_in_insertion_order() {
    let mut session = split_session();
    for i in 0..8u8 {
        let offset = f32::from(i) * 30.0;
        drag(
            &mut session,
            Point::new(offset, 10.0),
            Point::new(offset + 20.0, 10.0 + 5.0 * f32::from(i + 1)),
        );
    }

    let archive = session.export().unwrap();
    let entries = read_entries(&archive);
    assert_eq!(entries.len(), 8);
    for (i, (name, img)) in entries.iter().enumerate() {
        assert_eq!(name, &format!("cropped_image_{}.jpg", i + 1));
        // Heights grow with the index, so order is observable in the pixels.
        assert_eq!(img.height(), 10 * (i as u32 + 1));
    }
    assert_eq!(session.box_store().boxes()[0], BoundingBox::new(0.0, 10.0, 20.0, 5.0));
}
