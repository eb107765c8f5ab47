//! Identifier newtypes.
//!
//! All keys are `i64` database-style identifiers. Keeping them as distinct
//! types prevents passing a teacher id where a class id is expected.

use crate::define_id_type;

define_id_type!(i64, ScheduleEntryId);
define_id_type!(i64, ClassId);
define_id_type!(i64, SubjectId);
define_id_type!(i64, TeacherId);
define_id_type!(i64, CohortYearId);
