//! Weekly schedule slots and reusable templates

use super::{require_id, require_text, RecordMeta};
use crate::time::normalize_time_of_day;
use crate::{FieldErrors, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One weekly recurring class session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub tenant_id: String,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Uuid,
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub room: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Schedule {
    /// Validate and normalise both times to `HH:MM:SS`
    pub fn validate(&mut self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "class_id", "Class ID", self.class_id);
        require_id(&mut errors, "subject_id", "Subject ID", self.subject_id);
        require_id(&mut errors, "teacher_id", "Teacher ID", self.teacher_id);
        check_day(&mut errors, self.day_of_week);
        check_times(&mut errors, &mut self.start_time, &mut self.end_time);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        self.room = self.room.trim().to_string();
        errors.into_result()
    }

    /// Half-open interval overlap on the same day
    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }

    /// Same class, same teacher, or same non-empty room
    pub fn shares_resource(&self, other: &Schedule) -> bool {
        self.class_id == other.class_id
            || self.teacher_id == other.teacher_id
            || (!self.room.is_empty() && self.room == other.room)
    }

    /// Whether two distinct slots of one tenant may not coexist
    pub fn conflicts_with(&self, other: &Schedule) -> bool {
        self.id != other.id
            && self.tenant_id == other.tenant_id
            && self.shares_resource(other)
            && self.overlaps(other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<ScheduleTemplateItem>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl ScheduleTemplate {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        require_text(&mut errors, "name", "Name", &self.name);
        errors.into_result()
    }
}

/// Template row; a missing subject marks a placeholder period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTemplateItem {
    pub id: Uuid,
    pub tenant_id: String,
    pub template_id: Uuid,
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl ScheduleTemplateItem {
    pub fn validate(&mut self) -> Result<()> {
        let mut errors = FieldErrors::default();
        check_day(&mut errors, self.day_of_week);
        check_times(&mut errors, &mut self.start_time, &mut self.end_time);
        errors.into_result()
    }
}

fn check_day(errors: &mut FieldErrors, day: i64) {
    if !(1..=7).contains(&day) {
        errors.add("day_of_week", "Day of week must be between 1 and 7");
    }
}

fn check_times(errors: &mut FieldErrors, start: &mut String, end: &mut String) {
    let parsed_start = check_time(errors, "start_time", "Start time", start);
    let parsed_end = check_time(errors, "end_time", "End time", end);
    if let (Some(s), Some(e)) = (parsed_start, parsed_end) {
        if s >= e {
            errors.add("time_range", "Start time must be before end time");
        }
        *start = s;
        *end = e;
    }
}

fn check_time(errors: &mut FieldErrors, field: &str, label: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
        return None;
    }
    let normalized = normalize_time_of_day(value);
    if normalized.is_none() {
        errors.add(field, format!("{} must be HH:MM or HH:MM:SS", label));
    }
    normalized
}
