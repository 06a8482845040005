//! Tests for the chroma-config model across its public surface.

use chroma_config::{
    ColorSpace, Config, ConfigError, Display, Field, ItemKind, Look, Snapshot, View,
};

fn studio_config() -> Config {
    let mut config = Config::new();
    let mut lin = ColorSpace::new("scene_linear");
    lin.encoding = "scene-linear".to_string();
    lin.to_reference = "identity".to_string();
    config.add_color_space(lin).unwrap();

    let mut log = ColorSpace::new("log_c");
    log.encoding = "log".to_string();
    log.to_reference = "logc_to_lin".to_string();
    config.add_color_space(log).unwrap();

    let mut look = Look::new("neutral_grade");
    look.process_space = "log_c".to_string();
    look.transform = "cdl_neutral".to_string();
    config.add_look(look).unwrap();

    let mut display = Display::new("sRGB");
    display.views.push(View {
        name: "Film".to_string(),
        color_space: "log_c".to_string(),
        look: "neutral_grade".to_string(),
    });
    config.add_display(display).unwrap();

    config.set_role("default", "scene_linear");
    config
}

#[test]
fn full_config_validates_and_fingerprints() {
    let config = studio_config();
    assert!(config.validate().is_ok());
    let fp1 = config.fingerprint().unwrap();
    let fp2 = config.fingerprint().unwrap();
    assert_eq!(fp1, fp2);
}

#[test]
fn snapshot_round_trip_is_lossless() {
    let config = studio_config();
    let blob = config.save().unwrap();
    let restored = Config::restore(&blob).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn removing_referenced_space_invalidates() {
    let mut config = studio_config();
    config.remove_item(ItemKind::ColorSpace, "log_c").unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidState { .. })
    ));
    assert!(config.fingerprint().is_err());
}

#[test]
fn rename_keeps_config_consistent() {
    let mut config = studio_config();
    config
        .rename_item(ItemKind::ColorSpace, "log_c", "log_c4")
        .unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.look("neutral_grade").unwrap().process_space, "log_c4");
    let display = config.display("sRGB").unwrap();
    assert_eq!(display.views[0].color_space, "log_c4");
}

#[test]
fn display_processor_includes_view_look() {
    let config = studio_config();
    let pair = config
        .resolve_processor(ItemKind::Display, "sRGB")
        .unwrap();
    let exprs: Vec<&str> = pair.forward.iter().map(|t| t.expr.as_str()).collect();
    assert_eq!(exprs, ["cdl_neutral", "logc_to_lin"]);
    assert!(pair.forward[1].inverted);
}

#[test]
fn field_round_trip_through_setter_path() {
    let mut config = studio_config();
    let old = config
        .field(ItemKind::Look, "neutral_grade", Field::ProcessSpace)
        .unwrap();
    assert_eq!(old, "log_c");
    config
        .set_field(ItemKind::Look, "neutral_grade", Field::ProcessSpace, "")
        .unwrap();
    assert_eq!(
        config
            .field(ItemKind::Look, "neutral_grade", Field::ProcessSpace)
            .unwrap(),
        ""
    );
}

#[test]
fn pretty_text_mentions_every_item() {
    let config = studio_config();
    let text = config.to_pretty_text().unwrap();
    for name in ["scene_linear", "log_c", "neutral_grade", "sRGB"] {
        assert!(text.contains(name), "missing {name} in config text");
    }
}
