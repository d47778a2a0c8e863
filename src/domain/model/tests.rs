// Unit tests for domain models

use super::*;

#[test]
fn test_time_spec_from_components() {
    let time = TimeSpec::from_components(1, 2, 3, 500);
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("123.456").unwrap();
    assert_eq!(time.seconds, 123.456);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("00:60").is_err());
    assert!(TimeSpec::parse("01:75:00").is_err());
    assert!(TimeSpec::parse("-10").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn test_time_spec_display() {
    let time = TimeSpec::from_components(1, 2, 3, 456);
    assert_eq!(format!("{}", time), "01:02:03.456");

    let time_no_hours = TimeSpec::from_components(0, 2, 3, 456);
    assert_eq!(format!("{}", time_no_hours), "02:03.456");
}

#[test]
fn test_time_spec_clock() {
    assert_eq!(TimeSpec::from_seconds(3725.9).format_clock(), "01:02:05");
    assert_eq!(TimeSpec::from_seconds(0.0).format_clock(), "00:00:00");
}

#[test]
fn test_pending_item() {
    assert!(AudioDescriptionItem::pending(1.0, "A door opens").is_pending());
    assert!(!AudioDescriptionItem::pending(1.0, "   ").is_pending());
    assert!(!AudioDescriptionItem::new(1.0, "a.wav", "text").is_pending());
}

#[test]
fn test_add_item_keeps_time_order() {
    let mut project = ProjectState::default();
    project.add_item(AudioDescriptionItem::pending(30.0, "third"));
    project.add_item(AudioDescriptionItem::pending(10.0, "first"));
    let index = project.add_item(AudioDescriptionItem::pending(20.0, "second"));

    assert_eq!(index, 1);
    let times: Vec<f64> = project.items().iter().map(|item| item.time_seconds).collect();
    assert_eq!(times, vec![10.0, 20.0, 30.0]);
}

#[test]
fn test_update_item_resorts() {
    let mut project = ProjectState::default();
    project.replace_items(vec![
        AudioDescriptionItem::pending(5.0, "a"),
        AudioDescriptionItem::pending(10.0, "b"),
    ]);

    project.update_item(0, |item| item.time_seconds = 15.0).unwrap();

    assert_eq!(project.items()[0].text, "b");
    assert_eq!(project.items()[1].text, "a");
    assert!(project.update_item(7, |_| {}).is_err());
}

#[test]
fn test_replace_items_sorts() {
    let mut project = ProjectState::default();
    project.replace_items(vec![
        AudioDescriptionItem::pending(9.0, "late"),
        AudioDescriptionItem::pending(1.0, "early"),
    ]);
    assert_eq!(project.items()[0].text, "early");
    assert_eq!(project.pending_indices(), vec![0, 1]);
}

#[test]
fn test_remove_item_out_of_range() {
    let mut project = ProjectState::default();
    assert!(project.remove_item(0).is_err());
}

#[test]
fn test_gains_validation() {
    assert!(Gains::new(0.0, 1.0).is_ok());
    assert!(Gains::new(-0.1, 1.0).is_err());
    assert!(Gains::new(1.0, f64::NAN).is_err());
}

#[test]
fn test_tts_settings_rate_range() {
    assert!(TtsSettings::new(0, 10).is_ok());
    assert!(TtsSettings::new(0, -10).is_ok());
    assert!(TtsSettings::new(0, 11).is_err());
}

#[test]
fn test_render_window_validation() {
    assert!(RenderWindow::new(10.0, 5.0).is_err());
    assert!(RenderWindow::new(-1.0, 5.0).is_err());
    let window = RenderWindow::new(20.0, 40.0).unwrap();
    assert_eq!(window.duration(), 20.0);
    assert!(window.contains(20.0));
    assert!(!window.contains(40.0));
}

#[test]
fn test_project_json_keys() {
    let mut project = ProjectState::default();
    project.video_path = "movie.mp4".to_string();
    project.add_item(AudioDescriptionItem::new(2.5, "clip.wav", "Niño corre"));

    let json = serde_json::to_value(&project).unwrap();
    assert_eq!(json["video_file"], "movie.mp4");
    assert_eq!(json["audiodescriptions"][0]["tiempo"], 2.5);
    assert_eq!(json["audiodescriptions"][0]["archivo_audio"], "clip.wav");
    assert_eq!(json["audiodescriptions"][0]["descripcion"], "Niño corre");
    assert_eq!(json["tts_settings"]["voice_index"], 0);
    assert_eq!(json["tts_settings"]["rate"], 0);
}

#[test]
fn test_project_missing_fields_default() {
    let project: ProjectState = serde_json::from_str(r#"{"video_file": "a.mp4", "extra": 1}"#).unwrap();
    assert_eq!(project.video_path, "a.mp4");
    assert_eq!(project.output_path, DEFAULT_OUTPUT_FILE);
    assert_eq!(project.volume_original, DEFAULT_VOLUME_ORIGINAL);
    assert_eq!(project.volume_description, DEFAULT_VOLUME_DESCRIPTION);
    assert_eq!(project.tts_settings, TtsSettings::default());
    assert!(project.is_empty());
}
