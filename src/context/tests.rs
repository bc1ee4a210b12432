use std::{cell::RefCell, rc::Rc};

use assert_call::{call, CallRecorder};
use chrono::{Days, NaiveDate};

use super::*;
use crate::weather_forecast::{WeatherForecast, WeatherForecastValidator, MSG_TEMPERATURE_MAX};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

fn record() -> WeatherForecast {
    WeatherForecast {
        id: Uuid::new_v4(),
        date: today(),
        temperature_c: 12,
        summary: "Mild".to_string(),
    }
}

fn record_calls(ctx: &RecordEditContext<WeatherForecast>) -> [Subscription; 3] {
    [
        ctx.on_field_changed(|name| call!("field {}", name.unwrap_or("*"))),
        ctx.on_edit_state_updated(|is_dirty| call!("dirty {is_dirty}")),
        ctx.on_validation_state_updated(|e| {
            let field = e.field.as_ref().map_or("*", |f| f.field_name.as_str());
            call!("valid {} {}", field, e.is_valid)
        }),
    ]
}

#[test]
fn load_then_save_is_clean() {
    let mut ctx = RecordEditContext::new();
    ctx.load(record());
    ctx.save().unwrap();
    assert!(ctx.is_loaded());
    assert!(!ctx.is_dirty());
}

#[test]
fn change_then_revert() {
    let r = record();
    let mut ctx = RecordEditContext::with_record(r.clone());

    assert!(ctx.set(WeatherForecast::TEMPERATURE_C, 30).unwrap());
    assert!(ctx.is_dirty());
    assert!(ctx.is_changed("TemperatureC"));
    assert!(!ctx.is_changed("Summary"));
    assert_eq!(ctx.changed_fields().collect::<Vec<_>>(), ["TemperatureC"]);

    assert!(ctx.set(WeatherForecast::TEMPERATURE_C, r.temperature_c).unwrap());
    assert!(!ctx.is_dirty());
    assert!(!ctx.is_changed("TemperatureC"));
    assert!(ctx.property_states().is_empty());
}

#[test]
fn set_fires_field_changed_then_edit_state() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_record(record());
    let _s = record_calls(&ctx);

    ctx.set(WeatherForecast::SUMMARY, "Hot".to_string()).unwrap();
    cr.verify(["field Summary", "dirty true"]);

    ctx.set(WeatherForecast::SUMMARY, "Mild".to_string()).unwrap();
    cr.verify(["field Summary", "dirty false"]);
}

#[test]
fn set_to_current_value_is_noop() {
    let mut cr = CallRecorder::new();
    let r = record();
    let mut ctx = RecordEditContext::with_record(r.clone());
    let _s = record_calls(&ctx);

    assert!(!ctx.set(WeatherForecast::SUMMARY, r.summary.clone()).unwrap());
    assert!(!ctx.set(WeatherForecast::DATE, r.date).unwrap());
    cr.verify(());
    assert!(!ctx.is_dirty());
}

#[test]
fn reset_discards_edits() {
    let r = record();
    let mut ctx = RecordEditContext::with_record(r.clone());
    ctx.set(WeatherForecast::SUMMARY, "Hot".to_string()).unwrap();
    ctx.set(WeatherForecast::TEMPERATURE_C, -5).unwrap();
    ctx.set(WeatherForecast::DATE, today() + Days::new(3)).unwrap();
    assert!(ctx.is_dirty());

    ctx.reset().unwrap();
    assert_eq!(ctx.as_record(), r);
    assert!(!ctx.is_dirty());
    assert_eq!(ctx.changed_fields().count(), 0);
}

#[test]
fn save_rebases_baseline() {
    let mut ctx = RecordEditContext::with_record(record());
    ctx.set(WeatherForecast::TEMPERATURE_C, 40).unwrap();
    ctx.save().unwrap();
    assert!(!ctx.is_dirty());
    assert!(!ctx.is_changed("TemperatureC"));
    assert_eq!(ctx.clean_record().temperature_c, 40);

    ctx.reset().unwrap();
    assert_eq!(*ctx.get(WeatherForecast::TEMPERATURE_C), 40);
}

#[test]
fn save_and_reset_notify_all_fields() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_record(record());
    let _s = record_calls(&ctx);
    ctx.set(WeatherForecast::TEMPERATURE_C, 40).unwrap();
    cr.verify(["field TemperatureC", "dirty true"]);

    ctx.save().unwrap();
    cr.verify(["field *", "dirty false"]);

    ctx.set(WeatherForecast::TEMPERATURE_C, 41).unwrap();
    ctx.reset().unwrap();
    cr.verify(["field TemperatureC", "dirty true", "field *", "dirty false"]);
}

#[test]
fn set_before_load_fails() {
    let mut ctx = RecordEditContext::<WeatherForecast>::new();
    assert!(!ctx.is_loaded());

    let e = ctx.set(WeatherForecast::SUMMARY, "Hot".to_string()).unwrap_err();
    assert_eq!(e.type_name(), std::any::type_name::<WeatherForecast>());
    assert!(ctx.set_id(Uuid::new_v4()).is_err());
    assert!(ctx.save().is_err());
    assert!(ctx.reset().is_err());

    ctx.load(record());
    assert!(ctx.set(WeatherForecast::SUMMARY, "Hot".to_string()).is_ok());
}

#[test]
fn load_notifies_unless_disabled() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::new();
    let _s = record_calls(&ctx);
    ctx.load(record());
    cr.verify(["field *", "dirty false"]);

    ctx.load_with(record(), false);
    cr.verify(());

    ctx.options_mut().notify_on_load = false;
    ctx.load(record());
    cr.verify(());
}

#[test]
fn load_clears_previous_edit_state() {
    let mut ctx = RecordEditContext::with_record(record());
    ctx.set(WeatherForecast::SUMMARY, "Hot".to_string()).unwrap();
    let other = record();
    ctx.load(other.clone());
    assert!(!ctx.is_dirty());
    assert!(!ctx.is_changed("Summary"));
    assert_eq!(ctx.clean_record(), &other);
}

#[test]
fn baseline_is_not_aliased_with_caller_record() {
    let mut r = record();
    let mut ctx = RecordEditContext::with_record(r.clone());
    r.summary.push_str(" and windy");
    assert!(!ctx.is_dirty());
    ctx.reset().unwrap();
    assert_eq!(ctx.get(WeatherForecast::SUMMARY), "Mild");
}

#[test]
fn as_new_record_generates_fresh_ids() {
    let r = record();
    let ctx = RecordEditContext::with_record(r.clone());
    let a = ctx.as_new_record();
    let b = ctx.as_new_record();
    assert_ne!(a.id, r.id);
    assert_ne!(b.id, r.id);
    assert_ne!(a.id, b.id);
    assert_eq!(a.summary, r.summary);
    assert_eq!(ctx.as_record().id, r.id);
    assert!(!ctx.is_dirty());
}

#[test]
fn is_new_follows_id() {
    let mut ctx = RecordEditContext::with_record(WeatherForecast::default());
    assert!(ctx.is_new());
    ctx.set_id(Uuid::new_v4()).unwrap();
    assert!(!ctx.is_new());
    assert!(ctx.is_changed("Uid"));
}

#[test]
fn validate_without_validator_is_valid() {
    let mut ctx = RecordEditContext::with_record(record());
    assert!(ctx.validate(None).is_valid);
    assert!(ctx.is_valid());
}

#[test]
fn validate_records_messages_and_notifies() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_record(record())
        .with_validator(WeatherForecastValidator::as_of(today()));
    let _s = record_calls(&ctx);

    ctx.set(WeatherForecast::TEMPERATURE_C, 70).unwrap();
    cr.verify(["field TemperatureC", "dirty true"]);

    let result = ctx.validate(None);
    cr.verify("valid * false");
    assert!(!result.is_valid);
    assert!(!ctx.is_valid());
    assert!(ctx.has_messages(Some("TemperatureC")));
    assert!(!ctx.has_messages(Some("Summary")));
    assert_eq!(
        ctx.messages(Some("TemperatureC")).collect::<Vec<_>>(),
        [MSG_TEMPERATURE_MAX]
    );

    ctx.set(WeatherForecast::TEMPERATURE_C, 20).unwrap();
    cr.verify(["field TemperatureC", "dirty true"]);
    assert!(ctx.validate(Some("TemperatureC")).is_valid);
    cr.verify("valid TemperatureC true");
    assert!(ctx.is_valid());
}

#[test]
fn validate_on_field_changed() {
    let mut cr = CallRecorder::new();
    let options = EditContextOptions {
        validate_on_field_changed: true,
        ..Default::default()
    };
    let mut ctx = RecordEditContext::with_options(options)
        .with_validator(WeatherForecastValidator::as_of(today()));
    ctx.load_with(record(), false);
    let _s = record_calls(&ctx);

    ctx.set(WeatherForecast::SUMMARY, "Hi".to_string()).unwrap();
    cr.verify(["field Summary", "dirty true", "valid Summary false"]);
    assert_eq!(ctx.messages(None).count(), 1);

    ctx.set(WeatherForecast::SUMMARY, "Hi".to_string()).unwrap();
    cr.verify(());

    ctx.set(WeatherForecast::SUMMARY, "Sunny".to_string()).unwrap();
    cr.verify(["field Summary", "dirty true", "valid Summary true"]);
    assert!(ctx.is_valid());
}

#[test]
fn reset_clears_validation_messages() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_record(record())
        .with_validator(WeatherForecastValidator::as_of(today()));
    ctx.set(WeatherForecast::TEMPERATURE_C, 99).unwrap();
    ctx.validate(None);
    assert!(!ctx.is_valid());

    let _s = record_calls(&ctx);
    ctx.reset().unwrap();
    cr.verify(["valid * true", "field *", "dirty false"]);
    assert!(ctx.is_valid());
}

#[test]
fn closure_validator() {
    let mut ctx = RecordEditContext::with_record(record()).with_validator(
        |r: &WeatherForecast, id: InstanceId, m: &mut ValidationMessages, field: Option<&str>| {
            let mut v = crate::Validation::new(id, m, field);
            v.record(r.summary != "Mild", "summary must not be mild");
            v.finish()
        },
    );
    assert!(!ctx.validate(None).is_valid);
    assert_eq!(ctx.messages(None).collect::<Vec<_>>(), ["summary must not be mild"]);
    assert!(!ctx.has_messages(Some("Summary")));
}

#[test]
fn dropped_subscription_stops_notifications() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_record(record());
    let s = ctx.on_edit_state_updated(|is_dirty| call!("dirty {is_dirty}"));
    ctx.set(WeatherForecast::TEMPERATURE_C, 1).unwrap();
    cr.verify("dirty true");

    drop(s);
    ctx.set(WeatherForecast::TEMPERATURE_C, 2).unwrap();
    cr.verify(());
}

#[test]
fn two_contexts_have_separate_field_references() {
    let a = RecordEditContext::with_record(record());
    let b = RecordEditContext::with_record(record());
    assert_ne!(a.instance_id(), b.instance_id());
    assert_ne!(a.field_reference("Date"), b.field_reference("Date"));
}

#[test]
fn edit_state_as_trait_object() {
    let ctx = Rc::new(RefCell::new(RecordEditContext::with_record(record())));
    ctx.borrow_mut()
        .set(WeatherForecast::SUMMARY, "Hot".to_string())
        .unwrap();
    let state: &RefCell<dyn EditState> = &*ctx;
    assert!(state.borrow().is_dirty());
    assert!(state.borrow().is_changed("Summary"));
    assert!(state.borrow_mut().validate(None).is_valid);
}

#[test]
fn options_deserialize_with_defaults() {
    let o: EditContextOptions =
        serde_json::from_str(r#"{ "validate_on_field_changed": true }"#).unwrap();
    assert!(o.validate_on_field_changed);
    assert!(o.notify_on_load);

    let o: EditContextOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(o, EditContextOptions::default());
}

#[test]
fn not_loaded_error_message() {
    let mut ctx = RecordEditContext::<WeatherForecast>::new();
    let e = ctx.save().unwrap_err();
    assert!(e.to_string().starts_with("cannot edit `"));
    assert!(e.to_string().ends_with("WeatherForecast` before a record has been loaded"));
}

#[test]
fn deferred_notifications_fire_after_borrow_is_released() {
    let mut cr = CallRecorder::new();
    let ctx = Rc::new(RefCell::new(
        RecordEditContext::new().with_validator(WeatherForecastValidator::as_of(today())),
    ));
    let handle = ctx.clone();
    let _s = ctx.borrow().on_field_changed(move |name| {
        let ctx = handle.borrow();
        call!("field {} dirty {}", name.unwrap_or("*"), ctx.is_dirty())
    });

    let pending = ctx.borrow_mut().load_deferred(record());
    cr.verify(());
    pending.notify();
    cr.verify("field * dirty false");

    let pending = ctx
        .borrow_mut()
        .set_deferred(WeatherForecast::TEMPERATURE_C, 99)
        .unwrap();
    pending.notify();
    cr.verify("field TemperatureC dirty true");

    ctx.borrow_mut().validate(None);
    let pending = ctx.borrow_mut().reset_deferred().unwrap();
    pending.notify();
    cr.verify("field * dirty false");
    assert!(ctx.borrow().is_valid());
}

#[test]
fn deferred_set_of_current_value_is_empty() {
    let r = record();
    let mut ctx = RecordEditContext::with_record(r.clone());
    assert!(ctx.set_deferred(WeatherForecast::SUMMARY, r.summary).unwrap().is_empty());
    assert!(ctx.save_deferred().is_ok());
    assert!(RecordEditContext::<WeatherForecast>::new()
        .save_deferred()
        .is_err());
}

#[test]
fn deferred_load_respects_notify_on_load() {
    let mut cr = CallRecorder::new();
    let mut ctx = RecordEditContext::with_options(EditContextOptions {
        notify_on_load: false,
        ..Default::default()
    });
    let _s = record_calls(&ctx);
    let pending = ctx.load_deferred(record());
    assert!(pending.is_empty());
    pending.notify();
    cr.verify(());
    assert!(ctx.is_loaded());
}
