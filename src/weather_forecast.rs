//! The weather forecast record used by the demo applications.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    record_field, EditRecord, Field, InstanceId, RecordValidator, Validation, ValidationMessages,
    ValidationResult,
};


#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub id: Uuid,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: String,
}

impl WeatherForecast {
    pub const ID: Field<WeatherForecast, Uuid> = record_field!(WeatherForecast, id: Uuid, "Uid");
    pub const DATE: Field<WeatherForecast, NaiveDate> =
        record_field!(WeatherForecast, date: NaiveDate, "Date");
    pub const TEMPERATURE_C: Field<WeatherForecast, i32> =
        record_field!(WeatherForecast, temperature_c: i32, "TemperatureC");
    pub const SUMMARY: Field<WeatherForecast, String> =
        record_field!(WeatherForecast, summary: String, "Summary");

    /// Derived value, not stored.
    pub fn temperature_f(&self) -> i32 {
        32 + (self.temperature_c as f64 / 0.5556) as i32
    }
}

impl EditRecord for WeatherForecast {
    const ID: Field<Self, Uuid> = WeatherForecast::ID;
    const FIELD_NAMES: &'static [&'static str] = &[
        WeatherForecast::ID.name(),
        WeatherForecast::DATE.name(),
        WeatherForecast::TEMPERATURE_C.name(),
        WeatherForecast::SUMMARY.name(),
    ];
}

pub const MSG_DATE_NOT_FUTURE: &str = "The weather forecast must be for a future date";
pub const MSG_TEMPERATURE_MIN: &str = "The minimum temperature is -60C";
pub const MSG_TEMPERATURE_MAX: &str = "The maximum temperature is 60C";
pub const MSG_SUMMARY_REQUIRED: &str = "You must select a weather summary";

/// Validation rules for [`WeatherForecast`].
///
/// The date rule compares against today's local date unless a fixed date is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeatherForecastValidator {
    today: Option<NaiveDate>,
}

impl WeatherForecastValidator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn as_of(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl RecordValidator<WeatherForecast> for WeatherForecastValidator {
    fn validate(
        &self,
        record: &WeatherForecast,
        instance_id: InstanceId,
        messages: &mut ValidationMessages,
        field: Option<&str>,
    ) -> ValidationResult {
        let mut v = Validation::new(instance_id, messages, field);
        v.field(WeatherForecast::DATE.name(), &record.date)
            .greater_than_or_equal_to(&self.today(), MSG_DATE_NOT_FUTURE);
        v.field(WeatherForecast::TEMPERATURE_C.name(), &record.temperature_c)
            .greater_than(&-61, MSG_TEMPERATURE_MIN)
            .less_than(&61, MSG_TEMPERATURE_MAX);
        v.field(WeatherForecast::SUMMARY.name(), &record.summary)
            .min_length(3, MSG_SUMMARY_REQUIRED);
        v.finish()
    }
}
