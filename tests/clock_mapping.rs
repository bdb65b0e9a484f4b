use scriptorium::clock::{SlotTarget, TimeFormat, TimeSlot};

#[test]
fn twelve_hour_chapter_mapping() {
    for hour in 0..24u32 {
        for minute in 1..50u32 {
            let slot = TimeSlot::new(hour, minute, 100);
            let expected = match hour {
                0 => 12,
                h if h <= 12 => h,
                h => h - 12,
            };
            assert_eq!(
                slot.target(TimeFormat::TwelveHour),
                SlotTarget::Reference {
                    chapter: expected,
                    verse: minute
                },
                "hour {hour} minute {minute}"
            );
        }
    }
}

#[test]
fn twenty_four_hour_chapter_mapping() {
    for hour in 0..24u32 {
        for minute in 1..50u32 {
            let slot = TimeSlot::new(hour, minute, 100);
            let expected = if hour == 0 { 24 } else { hour };
            assert_eq!(
                slot.target(TimeFormat::TwentyFourHour),
                SlotTarget::Reference {
                    chapter: expected,
                    verse: minute
                },
                "hour {hour} minute {minute}"
            );
        }
    }
}

#[test]
fn minute_zero_signals_summary() {
    for hour in 0..24u32 {
        let slot = TimeSlot::new(hour, 0, 1);
        assert_eq!(slot.target(TimeFormat::TwelveHour), SlotTarget::Summary);
        assert_eq!(slot.target(TimeFormat::TwentyFourHour), SlotTarget::Summary);
    }
}

#[test]
fn high_minutes_signal_summary() {
    for hour in 0..24u32 {
        for minute in 50..60u32 {
            let slot = TimeSlot::new(hour, minute, 200);
            assert_eq!(slot.target(TimeFormat::TwelveHour), SlotTarget::Summary);
            assert_eq!(slot.target(TimeFormat::TwentyFourHour), SlotTarget::Summary);
        }
    }
}

#[test]
fn rotation_couples_minute_and_day() {
    let slot = TimeSlot::new(10, 17, 42);
    assert_eq!(slot.rotation(7), ((10 + 17 + 42) % 7) as usize);
    // the same minute on the next day favors the next entry
    let next_day = TimeSlot::new(10, 17, 43);
    assert_eq!(next_day.rotation(7), (slot.rotation(7) + 1) % 7);
}

#[test]
fn shuffle_is_deterministic_and_in_range() {
    let slot = TimeSlot::new(3, 55, 311);
    let first = slot.shuffle(66);
    assert_eq!(first, slot.shuffle(66));
    assert!(first < 66);
}

#[test]
fn clock_face_display() {
    assert_eq!(TimeSlot::new(0, 5, 1).display(TimeFormat::TwelveHour), "12:05 AM");
    assert_eq!(TimeSlot::new(14, 16, 1).display(TimeFormat::TwelveHour), "02:16 PM");
    assert_eq!(TimeSlot::new(12, 1, 1).display(TimeFormat::TwelveHour), "12:01 PM");
    assert_eq!(TimeSlot::new(14, 16, 1).display(TimeFormat::TwentyFourHour), "14:16");
    assert_eq!(TimeSlot::new(0, 5, 1).display(TimeFormat::TwentyFourHour), "00:05");
}

#[test]
fn format_parsing() {
    assert_eq!("12".parse::<TimeFormat>().unwrap(), TimeFormat::TwelveHour);
    assert_eq!("24".parse::<TimeFormat>().unwrap(), TimeFormat::TwentyFourHour);
    assert!("25".parse::<TimeFormat>().is_err());
}
