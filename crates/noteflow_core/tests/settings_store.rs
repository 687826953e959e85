use noteflow_core::db::open_db;
use noteflow_core::{
    AppSettings, SettingsError, SettingsPatch, SettingsService, SettingsValidationError,
    SqliteSettingsRepository, Theme,
};

#[test]
fn fresh_store_returns_defaults() {
    let conn = noteflow_core::open_db_in_memory().unwrap();
    let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn).unwrap());

    assert_eq!(service.get().unwrap(), AppSettings::default());
}

#[test]
fn update_merges_and_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noteflow.db");

    {
        let conn = open_db(&path).unwrap();
        let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn).unwrap());
        let updated = service
            .update(&SettingsPatch {
                api_key: Some("  sk-test  ".to_string()),
                theme: Some(Theme::Dark),
                font_size: Some(18),
                ..SettingsPatch::default()
            })
            .unwrap();
        assert_eq!(updated.api_key, "sk-test");
        assert_eq!(updated.line_height, 1.6);
    }

    let conn = open_db(&path).unwrap();
    let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn).unwrap());
    let loaded = service.get().unwrap();
    assert_eq!(loaded.api_key, "sk-test");
    assert_eq!(loaded.theme, Theme::Dark);
    assert_eq!(loaded.font_size, 18);
    assert!(loaded.show_welcome);
}

#[test]
fn invalid_values_are_rejected_without_writing() {
    let conn = noteflow_core::open_db_in_memory().unwrap();
    let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn).unwrap());

    let result = service.update(&SettingsPatch {
        theme: Some(Theme::Light),
        font_size: Some(200),
        ..SettingsPatch::default()
    });
    assert!(matches!(
        result,
        Err(SettingsError::Validation(
            SettingsValidationError::FontSizeOutOfRange(200)
        ))
    ));

    let result = service.update(&SettingsPatch {
        line_height: Some(0.5),
        ..SettingsPatch::default()
    });
    assert!(matches!(
        result,
        Err(SettingsError::Validation(
            SettingsValidationError::LineHeightOutOfRange(_)
        ))
    ));

    assert_eq!(service.get().unwrap(), AppSettings::default());
}
