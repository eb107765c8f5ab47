//! Read views over stored entries.

use serde::Serialize;

use super::error::{ServiceError, ServiceResult};
use super::schedule_service::ScheduleService;
use crate::models::{
    ClassId, CohortYearId, EducationLevel, EntryFilter, ScheduleEntry, ScheduleEntryId,
    SchoolClass, Teacher, TeacherId, TimeSlot,
};
use crate::scheduler::NameLookup;

/// An entry joined with its subject and teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScheduleItem {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTimetable {
    pub class: SchoolClass,
    pub cohort_year_id: CohortYearId,
    pub entries: Vec<ClassScheduleItem>,
}

/// An entry joined with its class and subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherScheduleItem {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherTimetable {
    pub teacher: Teacher,
    pub entries: Vec<TeacherScheduleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub day_index: u8,
    pub name: String,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGridView {
    pub days: Vec<DayView>,
    pub teaching_slots_per_week: usize,
}

fn by_day_then_start(entries: &mut [ScheduleEntry]) {
    entries.sort_by_key(|e| (e.day_index, e.start, e.class_id, e.id));
}

impl ScheduleService {
    /// List entries matching `filter`.
    ///
    /// The partition is `level` when given, else the level of the filtered
    /// cohort-year or class; with neither, every partition is listed in
    /// probe order.
    pub async fn list_entries(
        &self,
        level: Option<EducationLevel>,
        filter: EntryFilter,
    ) -> ServiceResult<Vec<ScheduleEntry>> {
        let level = match (level, filter.cohort_year_id, filter.class_id) {
            (Some(level), _, _) => Some(level),
            (None, Some(cohort), _) => Some(self.cohort_year(cohort).await?.level),
            (None, None, Some(class)) => Some(self.class(class).await?.level),
            (None, None, None) => None,
        };

        match level {
            Some(level) => Ok(self.repo.list_entries(level, &filter).await?),
            None => {
                let mut all = Vec::new();
                for level in EducationLevel::ALL {
                    all.extend(self.repo.list_entries(level, &filter).await?);
                }
                Ok(all)
            }
        }
    }

    /// Fetch one entry, probing every partition when `level` is `None`.
    pub async fn get_entry(
        &self,
        level: Option<EducationLevel>,
        id: ScheduleEntryId,
    ) -> ServiceResult<ScheduleEntry> {
        Ok(self.locate_entry(level, id).await?.1)
    }

    /// A class's week, ordered by day then start.
    ///
    /// Uses the level's current cohort-year unless one is given.
    pub async fn class_timetable(
        &self,
        class_id: ClassId,
        cohort_year_id: Option<CohortYearId>,
    ) -> ServiceResult<ClassTimetable> {
        let class = self.class(class_id).await?;
        let cohort_year_id = match cohort_year_id {
            Some(id) => id,
            None => {
                self.repo
                    .current_cohort_year(class.level)
                    .await
                    .map_err(|e| {
                        ServiceError::missing(
                            e,
                            format!("No current cohort year for level {}", class.level),
                        )
                    })?
                    .id
            }
        };

        let mut entries = self
            .repo
            .list_entries(
                class.level,
                &EntryFilter::for_cohort(cohort_year_id).with_class(class_id),
            )
            .await?;
        by_day_then_start(&mut entries);

        let refs = self.references_for(&entries).await?;
        let entries = entries
            .into_iter()
            .map(|entry| {
                let subject = refs.subject(entry.subject_id);
                ClassScheduleItem {
                    subject_name: subject.map(|s| s.name.clone()),
                    subject_code: subject.map(|s| s.code.clone()),
                    teacher_name: entry.teacher_id.and_then(|t| refs.teacher_name(t)),
                    entry,
                }
            })
            .collect();

        Ok(ClassTimetable {
            class,
            cohort_year_id,
            entries,
        })
    }

    /// Everything a teacher teaches, across partitions unless a cohort-year
    /// narrows it down.
    pub async fn teacher_timetable(
        &self,
        teacher_id: TeacherId,
        cohort_year_id: Option<CohortYearId>,
    ) -> ServiceResult<TeacherTimetable> {
        let teacher = self
            .repo
            .get_teacher(teacher_id)
            .await
            .map_err(|e| ServiceError::missing(e, format!("Teacher {} not found", teacher_id)))?;

        let mut filter = EntryFilter::default().with_teacher(teacher_id);
        filter.cohort_year_id = cohort_year_id;
        let mut entries = self.list_entries(None, filter).await?;
        by_day_then_start(&mut entries);

        let refs = self.references_for(&entries).await?;
        let entries = entries
            .into_iter()
            .map(|entry| TeacherScheduleItem {
                class_name: refs.class_name(entry.class_id),
                subject_name: refs.subject_name(entry.subject_id),
                entry,
            })
            .collect();

        Ok(TeacherTimetable { teacher, entries })
    }

    pub fn time_grid_view(&self) -> TimeGridView {
        TimeGridView {
            days: self
                .grid
                .days()
                .iter()
                .map(|d| DayView {
                    day_index: d.index,
                    name: d.name.clone(),
                    slots: self.grid.slots_for_day(d.index),
                })
                .collect(),
            teaching_slots_per_week: self.grid.teaching_slot_count(),
        }
    }

    async fn class(&self, id: ClassId) -> ServiceResult<SchoolClass> {
        self.repo
            .get_class(id)
            .await
            .map_err(|e| ServiceError::missing(e, format!("Class {} not found", id)))
    }
}
