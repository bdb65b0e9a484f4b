use std::fmt;
use std::hash::Hasher;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use seahash::SeaHasher;

use crate::error::ScriptoriumError;

// ------------- TimeFormat -------------
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeFormat {
    TwelveHour,
    TwentyFourHour,
}
impl FromStr for TimeFormat {
    type Err = ScriptoriumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12" => Ok(TimeFormat::TwelveHour),
            "24" => Ok(TimeFormat::TwentyFourHour),
            other => Err(ScriptoriumError::Config(format!(
                "time format must be \"12\" or \"24\", got \"{}\"",
                other
            ))),
        }
    }
}
impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeFormat::TwelveHour => write!(f, "12"),
            TimeFormat::TwentyFourHour => write!(f, "24"),
        }
    }
}

// ------------- TimeSlot -------------
/// The wall-clock coordinates a resolution runs against: hour and minute of
/// day plus the day of the year. Never persisted; everything derived from it
/// is a pure function so a given instant always resolves the same way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimeSlot {
    hour: u32,
    minute: u32,
    day_of_year: u32,
}

impl TimeSlot {
    pub fn of(now: NaiveDateTime) -> Self {
        Self {
            hour: now.hour(),
            minute: now.minute(),
            day_of_year: now.ordinal(),
        }
    }
    pub fn new(hour: u32, minute: u32, day_of_year: u32) -> Self {
        Self {
            hour: hour % 24,
            minute: minute % 60,
            day_of_year,
        }
    }
    pub fn hour(&self) -> u32 {
        self.hour
    }
    pub fn minute(&self) -> u32 {
        self.minute
    }
    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }
    /// Key identifying the minute within the day, used to cache the book
    /// summary for the remainder of the current minute.
    pub fn minute_key(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Map the slot onto a chapter/verse candidate. Minute 00 and minutes 50
    /// and up signal a book summary instead: chapters rarely run to fifty
    /// verses, so validating them book by book would be wasted work.
    pub fn target(&self, format: TimeFormat) -> SlotTarget {
        if self.minute == 0 || self.minute >= 50 {
            return SlotTarget::Summary;
        }
        let chapter = match format {
            TimeFormat::TwelveHour => match self.hour {
                0 => 12,
                h if h <= 12 => h,
                h => h - 12,
            },
            TimeFormat::TwentyFourHour => match self.hour {
                0 => 24,
                h => h,
            },
        };
        SlotTarget::Reference {
            chapter,
            verse: self.minute,
        }
    }

    /// Deterministic rotation index: couples the pick to both the minute of
    /// day and the calendar day, so the same minute favors a different entry
    /// on different days while staying reproducible for a given instant.
    pub fn rotation(&self, count: usize) -> usize {
        ((self.hour + self.minute + self.day_of_year) as usize) % count
    }

    /// Hash-based shuffle over the same coordinates, for picks that should
    /// look random (book summaries) without involving a PRNG.
    pub fn shuffle(&self, count: usize) -> usize {
        let mut hasher = SeaHasher::new();
        hasher.write_u32(self.day_of_year);
        hasher.write_u32(self.hour);
        hasher.write_u32(self.minute);
        (hasher.finish() as usize) % count
    }

    pub fn display(&self, format: TimeFormat) -> String {
        match format {
            TimeFormat::TwelveHour => {
                let hour = match self.hour % 12 {
                    0 => 12,
                    h => h,
                };
                let meridiem = if self.hour < 12 { "AM" } else { "PM" };
                format!("{:02}:{:02} {}", hour, self.minute, meridiem)
            }
            TimeFormat::TwentyFourHour => format!("{:02}:{:02}", self.hour, self.minute),
        }
    }
}

/// What the Time Resolver asks for: an exact chapter/verse candidate, or a
/// book summary when the minute cannot correspond to a real verse.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotTarget {
    Reference { chapter: u32, verse: u32 },
    Summary,
}
