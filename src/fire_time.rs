use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone};

/// A daily wall-clock time, `H:MM` or `HH:MM`, 24-hour, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReminderTime {
    hour: u32,
    minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidReminderTime(pub String);

impl fmt::Display for InvalidReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reminder time {:?}, expected HH:MM", self.0)
    }
}

impl std::error::Error for InvalidReminderTime {}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    /// Accepts exactly `^([0-1]?[0-9]|2[0-3]):([0-5][0-9])$`.
    pub fn parse(value: &str) -> Result<Self, InvalidReminderTime> {
        let invalid = || InvalidReminderTime(value.to_string());
        let (hour, minute) = value.split_once(':').ok_or_else(invalid)?;
        if !(1..=2).contains(&hour.len()) || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if minute.len() != 2 || !minute.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    fn naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ReminderTime {
    type Err = InvalidReminderTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Next instant strictly after `now` showing `time` on the local wall clock:
/// today if still ahead, otherwise the same clock time one calendar day later.
pub fn next_fire_at<Tz: TimeZone>(time: ReminderTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let candidate = resolve_local(&tz, today, time.naive());
    if candidate <= *now {
        return resolve_local(&tz, next_day(today), time.naive());
    }
    candidate
}

/// Today's `time` moved to tomorrow, whether or not it already passed.
pub fn postpone_fire_at<Tz: TimeZone>(time: ReminderTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = resolve_local(&now.timezone(), now.date_naive(), time.naive());
    one_day_later(&today)
}

/// Same wall-clock time on the following calendar date. Across a DST change
/// this is 23 or 25 hours away, not 24.
pub fn one_day_later<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Tz> {
    let local = at.naive_local();
    resolve_local(&at.timezone(), next_day(local.date()), local.time())
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Skipped by a forward jump: read it with the offset in force before the gap.
            let before = naive - TimeDelta::days(1);
            let offset = tz
                .offset_from_local_datetime(&before)
                .earliest()
                .map(|offset| offset.fix().local_minus_utc())
                .unwrap_or(0);
            tz.from_utc_datetime(&(naive - TimeDelta::seconds(i64::from(offset))))
        }
    }
}
