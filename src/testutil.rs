//! Shared fixtures for unit tests

use polars::prelude::*;

/// A small transaction table in the raw input layout. Rows are
/// month-ascending within each town, the way published transaction extracts
/// arrive.
pub(crate) fn sample_transactions() -> DataFrame {
    let months = [
        "2020-01", "2020-02", "2020-03", "2020-06", "2020-09", "2021-01", "2021-04", "2021-08",
        "2022-02", "2022-05", "2022-11", "2023-03", "2023-07", "2024-01", "2024-04", "2024-06",
    ];
    let towns = [
        "BEDOK", "CLEMENTI", "BEDOK", "CLEMENTI", "PUNGGOL", "BEDOK", "CLEMENTI", "PUNGGOL",
        "BEDOK", "CLEMENTI", "PUNGGOL", "BEDOK", "CLEMENTI", "BEDOK", "CLEMENTI", "PUNGGOL",
    ];
    let flat_types = [
        "4 ROOM", "3 ROOM", "5 ROOM", "4 ROOM", "4 ROOM", "4 ROOM", "3 ROOM", "5 ROOM",
        "5 ROOM", "4 ROOM", "4 ROOM", "4 ROOM", "3 ROOM", "4 ROOM", "4 ROOM", "5 ROOM",
    ];
    let blocks = [
        "101", "240", "119", "315", "268C", "105", "242", "271A", "120", "320", "270B", "102",
        "241", "108", "316", "272C",
    ];
    let streets = [
        "BEDOK NTH RD", "CLEMENTI AVE 2", "BEDOK NTH ST 1", "CLEMENTI AVE 4", "PUNGGOL FIELD",
        "BEDOK NTH RD", "CLEMENTI AVE 2", "PUNGGOL WALK", "BEDOK NTH ST 1", "CLEMENTI AVE 4",
        "PUNGGOL WALK", "BEDOK NTH RD", "CLEMENTI AVE 2", "BEDOK NTH RD", "CLEMENTI AVE 4",
        "PUNGGOL FIELD",
    ];
    let storey_ranges = [
        "04 TO 06", "07 TO 09", "10 TO 12", "01 TO 03", "13 TO 15", "04 TO 06", "07 TO 09",
        "10 TO 12", "07 TO 09", "04 TO 06", "16 TO 18", "10 TO 12", "01 TO 03", "07 TO 09",
        "10 TO 12", "13 TO 15",
    ];
    let areas = [
        93.0, 67.0, 121.0, 92.0, 95.0, 94.0, 68.0, 112.0, 122.0, 93.0, 96.0, 92.0, 67.0, 93.0,
        94.0, 113.0,
    ];
    let flat_models = [
        "Model A", "New Generation", "Improved", "Model A", "Premium Apartment", "Model A",
        "New Generation", "Improved", "Improved", "Model A", "Premium Apartment", "Model A",
        "New Generation", "Model A", "Model A", "Improved",
    ];
    let lease_starts = [
        2000i32, 1981, 1992, 1985, 2015, 2001, 1982, 2016, 1993, 1986, 2014, 2000, 1981, 2002,
        1985, 2015,
    ];
    let prices = [
        420_000.0, 310_000.0, 530_000.0, 415_000.0, 450_000.0, 445_000.0, 325_000.0, 560_000.0,
        558_000.0, 460_000.0, 498_000.0, 492_000.0, 356_000.0, 520_000.0, 505_000.0, 610_000.0,
    ];

    DataFrame::new(vec![
        Series::new("month".into(), months.as_slice()).into(),
        Series::new("town".into(), towns.as_slice()).into(),
        Series::new("flat_type".into(), flat_types.as_slice()).into(),
        Series::new("block".into(), blocks.as_slice()).into(),
        Series::new("street_name".into(), streets.as_slice()).into(),
        Series::new("storey_range".into(), storey_ranges.as_slice()).into(),
        Series::new("floor_area_sqm".into(), areas.as_slice()).into(),
        Series::new("flat_model".into(), flat_models.as_slice()).into(),
        Series::new("lease_commence_date".into(), lease_starts.as_slice()).into(),
        Series::new("resale_price".into(), prices.as_slice()).into(),
    ])
    .unwrap()
}
