//! Weekly time grid: the ordered teaching, recess and break slots of each day.
//!
//! The grid is reference data. It is loaded once per process (built-in default
//! or the `[time_grid]` section of the configuration file) and handed to the
//! allocator; nothing in it is persisted per cohort-year.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Highest valid day index (1 = Lundi ... 6 = Samedi).
pub const MAX_DAY_INDEX: u8 = 6;

const DEFAULT_DAY_NAMES: [&str; 6] = ["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi"];

/// Serde helpers for `HH:MM` wall-clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parse a strict `HH:MM` time. Slot keys compare whole times, so
    /// seconds are rejected rather than truncated.
    pub fn parse(value: &str) -> Result<NaiveTime, String> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|_| format!("Invalid time '{}', expected HH:MM", value))
    }

    /// Whether a time has no seconds or sub-second part.
    pub fn is_whole_minute(time: &NaiveTime) -> bool {
        use chrono::Timelike;
        time.second() == 0 && time.nanosecond() == 0
    }

    pub fn format(time: &NaiveTime) -> String {
        time.format("%H:%M").to_string()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.serialize_some(&super::format(t)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Category of a grid slot. Only `Teaching` slots are eligible for allocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotCategory {
    Teaching,
    Recess,
    Break,
}

/// One slot of a day's template, without the day attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTemplate {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub category: SlotCategory,
}

impl SlotTemplate {
    pub fn new(start: NaiveTime, end: NaiveTime, category: SlotCategory) -> Self {
        Self { start, end, category }
    }

    fn on_day(&self, day_index: u8) -> TimeSlot {
        TimeSlot {
            day_index,
            start: self.start,
            end: self.end,
            category: self.category,
        }
    }
}

/// A concrete slot of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day_index: u8,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub category: SlotCategory,
}

impl TimeSlot {
    pub fn is_teaching(&self) -> bool {
        self.category == SlotCategory::Teaching
    }
}

/// A day of the week and, optionally, its own slot list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDefinition {
    pub index: u8,
    pub name: String,
    /// Overrides the shared template for this day (e.g. a half day).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<SlotTemplate>>,
}

/// Grid validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeGridError {
    #[error("time grid has no days")]
    NoDays,
    #[error("day index {0} is outside 1..=6")]
    DayOutOfRange(u8),
    #[error("day index {0} is defined twice")]
    DuplicateDay(u8),
    #[error("slot {start}-{end} ends before it starts")]
    InvertedSlot { start: String, end: String },
    #[error("slot starting at {start} overlaps or precedes the previous slot")]
    UnorderedSlots { start: String },
}

#[derive(Deserialize)]
struct TimeGridSpec {
    days: Vec<DayDefinition>,
    slots: Vec<SlotTemplate>,
}

impl TryFrom<TimeGridSpec> for TimeGrid {
    type Error = TimeGridError;

    fn try_from(spec: TimeGridSpec) -> Result<Self, Self::Error> {
        TimeGrid::new(spec.days, spec.slots)
    }
}

/// Validated weekly grid. Days are kept sorted by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeGridSpec")]
pub struct TimeGrid {
    days: Vec<DayDefinition>,
    slots: Vec<SlotTemplate>,
}

impl TimeGrid {
    /// Build a grid, validating days and slot ordering.
    pub fn new(
        mut days: Vec<DayDefinition>,
        slots: Vec<SlotTemplate>,
    ) -> Result<Self, TimeGridError> {
        if days.is_empty() {
            return Err(TimeGridError::NoDays);
        }
        days.sort_by_key(|d| d.index);
        for pair in days.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(TimeGridError::DuplicateDay(pair[0].index));
            }
        }
        for day in &days {
            if day.index == 0 || day.index > MAX_DAY_INDEX {
                return Err(TimeGridError::DayOutOfRange(day.index));
            }
            if let Some(own) = &day.slots {
                validate_slots(own)?;
            }
        }
        validate_slots(&slots)?;

        Ok(Self { days, slots })
    }

    pub fn days(&self) -> &[DayDefinition] {
        &self.days
    }

    /// Shared slot template applied to days without their own list.
    pub fn template(&self) -> &[SlotTemplate] {
        &self.slots
    }

    pub fn day_name(&self, day_index: u8) -> Option<&str> {
        self.days
            .iter()
            .find(|d| d.index == day_index)
            .map(|d| d.name.as_str())
    }

    pub fn has_day(&self, day_index: u8) -> bool {
        self.days.iter().any(|d| d.index == day_index)
    }

    fn template_for<'a>(&'a self, day: &'a DayDefinition) -> &'a [SlotTemplate] {
        day.slots.as_deref().unwrap_or(&self.slots)
    }

    /// All slots of a day in grid order, whatever their category.
    pub fn slots_for_day(&self, day_index: u8) -> Vec<TimeSlot> {
        self.days
            .iter()
            .find(|d| d.index == day_index)
            .map(|d| {
                self.template_for(d)
                    .iter()
                    .map(|s| s.on_day(day_index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Teaching slots of the whole week: day ascending, then grid order.
    pub fn teaching_slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.days.iter().flat_map(move |day| {
            self.template_for(day)
                .iter()
                .filter(|s| s.category == SlotCategory::Teaching)
                .map(move |s| s.on_day(day.index))
        })
    }

    pub fn teaching_slot_count(&self) -> usize {
        self.teaching_slots().count()
    }

    /// Slot of the grid starting at `start` on `day_index`, if any.
    pub fn find_slot(&self, day_index: u8, start: NaiveTime) -> Option<TimeSlot> {
        self.slots_for_day(day_index)
            .into_iter()
            .find(|s| s.start == start)
    }
}

fn validate_slots(slots: &[SlotTemplate]) -> Result<(), TimeGridError> {
    let mut previous_end: Option<NaiveTime> = None;
    for slot in slots {
        if slot.end <= slot.start {
            return Err(TimeGridError::InvertedSlot {
                start: hhmm::format(&slot.start),
                end: hhmm::format(&slot.end),
            });
        }
        if let Some(prev) = previous_end {
            if slot.start < prev {
                return Err(TimeGridError::UnorderedSlots {
                    start: hhmm::format(&slot.start),
                });
            }
        }
        previous_end = Some(slot.end);
    }
    Ok(())
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for TimeGrid {
    /// Monday to Saturday, eight one-hour teaching slots a day around a
    /// morning recess, a lunch break and an afternoon recess.
    fn default() -> Self {
        use SlotCategory::*;
        let slots = vec![
            SlotTemplate::new(hm(7, 30), hm(8, 25), Teaching),
            SlotTemplate::new(hm(8, 25), hm(9, 20), Teaching),
            SlotTemplate::new(hm(9, 20), hm(10, 15), Teaching),
            SlotTemplate::new(hm(10, 15), hm(10, 30), Recess),
            SlotTemplate::new(hm(10, 30), hm(11, 25), Teaching),
            SlotTemplate::new(hm(11, 25), hm(12, 20), Teaching),
            SlotTemplate::new(hm(12, 20), hm(14, 0), Break),
            SlotTemplate::new(hm(14, 0), hm(14, 55), Teaching),
            SlotTemplate::new(hm(14, 55), hm(15, 50), Teaching),
            SlotTemplate::new(hm(15, 50), hm(16, 5), Recess),
            SlotTemplate::new(hm(16, 5), hm(17, 0), Teaching),
        ];
        let days = DEFAULT_DAY_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| DayDefinition {
                index: (i + 1) as u8,
                name: name.to_string(),
                slots: None,
            })
            .collect();

        Self { days, slots }
    }
}

#[cfg(test)]
#[path = "time_grid_tests.rs"]
mod time_grid_tests;
