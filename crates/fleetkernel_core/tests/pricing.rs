use chrono::{Days, NaiveDate};
use fleetkernel_core::model::vehicle_type::supported_vehicle_types;
use fleetkernel_core::{vehicle_type_for_code, Rental, ValidationError};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn total_matches_formula_for_every_variant_and_day_count() {
    let start = date(2024, 2, 20);
    let (base_rate, insurance_fee) = (47.5, 12.25);

    for code in supported_vehicle_types() {
        let vehicle_type = vehicle_type_for_code(code).unwrap();
        for days in 1..=45_u32 {
            let end = start.checked_add_days(Days::new(u64::from(days - 1))).unwrap();
            let rental = Rental::new(
                7,
                vehicle_type.clone(),
                base_rate,
                insurance_fee,
                start,
                end,
                "Downtown",
            );

            let expected = base_rate * f64::from(days)
                + vehicle_type.additional_fees(days)
                + insurance_fee;
            assert_eq!(rental.rental_days().unwrap(), days, "{code} {days}");
            assert_eq!(rental.calculate_total().unwrap(), expected, "{code} {days}");
        }
    }
}

#[test]
fn three_day_economy_booking_costs_160() {
    let economy = vehicle_type_for_code("economy").unwrap();
    let rental = Rental::new(
        1,
        economy,
        50.0,
        10.0,
        date(2024, 1, 1),
        date(2024, 1, 3),
        "Airport",
    );

    assert_eq!(rental.rental_days().unwrap(), 3);
    assert_eq!(rental.calculate_total().unwrap(), 160.0);
}

#[test]
fn same_day_rental_counts_one_day() {
    let suv = vehicle_type_for_code("suv").unwrap();
    let day = date(2024, 3, 10);
    let rental = Rental::new(2, suv, 80.0, 0.0, day, day, "Airport");

    assert_eq!(rental.rental_days().unwrap(), 1);
    assert_eq!(rental.calculate_total().unwrap(), 80.0 + 12.0);
}

#[test]
fn inverted_range_always_fails_validation() {
    for code in supported_vehicle_types() {
        let rental = Rental::new(
            3,
            vehicle_type_for_code(code).unwrap(),
            50.0,
            10.0,
            date(2024, 1, 3),
            date(2024, 1, 2),
            "Airport",
        );
        assert!(matches!(
            rental.calculate_total(),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }
}

#[test]
fn range_across_leap_day_counts_inclusive_days() {
    let luxury = vehicle_type_for_code("luxury").unwrap();
    let rental = Rental::new(
        4,
        luxury,
        100.0,
        25.0,
        date(2024, 2, 27),
        date(2024, 3, 1),
        "Harbor",
    );

    assert_eq!(rental.rental_days().unwrap(), 4);
    assert_eq!(rental.calculate_total().unwrap(), 400.0 + 160.0 + 25.0);
}
