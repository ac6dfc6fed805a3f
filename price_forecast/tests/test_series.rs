use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use price_forecast::data::RawRecord;
use price_forecast::error::ForecastError;
use price_forecast::series::{Frequency, Period, TimeSeries, Window};
use rstest::rstest;

fn record(y: i32, m: u32, d: u32, price: f64) -> RawRecord {
    RawRecord::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), price)
}

fn month(y: i32, m: u32) -> Period {
    Period::month(y, m).unwrap()
}

fn daily_records() -> Vec<RawRecord> {
    vec![
        record(2020, 1, 2, 10.0),
        record(2020, 1, 31, 11.0),
        record(2020, 2, 3, 11.5),
        record(2020, 2, 28, 12.0),
        record(2020, 3, 31, 13.0),
        record(2020, 4, 30, 14.0),
        record(2020, 5, 29, 15.0),
    ]
}

#[test]
fn test_last_record_of_month_is_kept() {
    let series = TimeSeries::from_records(&daily_records(), Frequency::Monthly, Window::all()).unwrap();

    assert_eq!(series.values(), &[11.0, 12.0, 13.0, 14.0, 15.0]);
    assert_eq!(series.start(), month(2020, 1));
    assert_eq!(series.end(), Some(month(2020, 5)));
}

#[test]
fn test_descending_input_is_reversed() {
    let mut records = daily_records();
    records.reverse();
    let series = TimeSeries::from_records(&records, Frequency::Monthly, Window::all()).unwrap();

    assert_eq!(series.values(), &[11.0, 12.0, 13.0, 14.0, 15.0]);
}

#[test]
fn test_window_restricts_series() {
    let window = Window::between(month(2020, 2), month(2020, 4));
    let series = TimeSeries::from_records(&daily_records(), Frequency::Monthly, window).unwrap();

    assert_eq!(series.values(), &[12.0, 13.0, 14.0]);
    assert_eq!(series.start(), month(2020, 2));
}

#[test]
fn test_window_beyond_data_is_insufficient() {
    let window = Window::between(month(2019, 12), month(2020, 3));
    let result = TimeSeries::from_records(&daily_records(), Frequency::Monthly, window);

    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_missing_month_is_reported() {
    let records = vec![
        record(2020, 1, 31, 1.0),
        record(2020, 2, 28, 2.0),
        record(2020, 4, 30, 4.0),
    ];
    match TimeSeries::from_records(&records, Frequency::Monthly, Window::all()) {
        Err(ForecastError::InsufficientData(msg)) => assert!(msg.contains("2020-03")),
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_missing_months_at_window_end_are_reported() {
    let records = vec![
        record(2020, 1, 31, 1.0),
        record(2020, 2, 28, 2.0),
        record(2020, 4, 30, 4.0),
    ];
    let window = Window::between(month(2020, 1), month(2020, 3));

    match TimeSeries::from_records(&records, Frequency::Monthly, window) {
        Err(ForecastError::InsufficientData(msg)) => assert!(msg.contains("2020-03"), "{}", msg),
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_unordered_dates_are_a_format_error() {
    let records = vec![
        record(2020, 1, 31, 1.0),
        record(2020, 3, 31, 3.0),
        record(2020, 2, 28, 2.0),
        record(2020, 4, 30, 4.0),
    ];
    let result = TimeSeries::from_records(&records, Frequency::Monthly, Window::all());

    assert!(matches!(result, Err(ForecastError::DataFormat(_))));
}

#[test]
fn test_quarterly_series() {
    let series = TimeSeries::from_records(&daily_records(), Frequency::Quarterly, Window::all()).unwrap();

    assert_eq!(series.values(), &[13.0, 15.0]);
    assert_eq!(series.start().to_string(), "2020Q1");
}

#[test]
fn test_truncate_start_drops_earlier_observations() {
    let series = TimeSeries::from_records(&daily_records(), Frequency::Monthly, Window::all()).unwrap();
    let later = series.truncate_start(month(2020, 3)).unwrap();

    assert_eq!(later.values(), &[13.0, 14.0, 15.0]);
    assert_eq!(later.start(), month(2020, 3));
    assert!(series.truncate_start(month(2021, 1)).is_err());
}

#[rstest]
#[case("2020-03", Frequency::Monthly, 2020, 3)]
#[case("1999-12", Frequency::Monthly, 1999, 12)]
#[case("2021Q2", Frequency::Quarterly, 2021, 2)]
#[case("2018", Frequency::Annual, 2018, 1)]
fn test_period_parse(#[case] text: &str, #[case] freq: Frequency, #[case] year: i32, #[case] index: u32) {
    let period = Period::parse(text, freq).unwrap();

    assert_eq!(period.year(), year);
    assert_eq!(period.index(), index);
    assert_eq!(period.to_string(), text);
}

#[rstest]
#[case("2020-13", Frequency::Monthly)]
#[case("2020Q5", Frequency::Quarterly)]
#[case("March 2020", Frequency::Monthly)]
fn test_period_parse_rejects(#[case] text: &str, #[case] freq: Frequency) {
    assert!(matches!(Period::parse(text, freq), Err(ForecastError::InvalidSpec(_))));
}

#[test]
fn test_period_arithmetic_crosses_years() {
    let nov = month(2020, 11);

    assert_eq!(nov.offset(3), month(2021, 2));
    assert_eq!(nov.offset(-11), month(2019, 12));
    assert_eq!(nov.periods_until(&month(2022, 1)), 14);
}
