//! Cached reads and invalidating writes per entity.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey};
use crate::error::ClientResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Departments,
    Classes,
    Teachers,
    Subjects,
    Rooms,
    TimeSlots,
    TeacherSubjects,
    TeacherPerClass,
    TimetableEntries,
    Students,
    Hods,
    Coordinators,
    Users,
    Roles,
    UserRoles,
    Dashboard,
}

impl Entity {
    pub const ALL: &'static [Entity] = &[
        Entity::Departments,
        Entity::Classes,
        Entity::Teachers,
        Entity::Subjects,
        Entity::Rooms,
        Entity::TimeSlots,
        Entity::TeacherSubjects,
        Entity::TeacherPerClass,
        Entity::TimetableEntries,
        Entity::Students,
        Entity::Hods,
        Entity::Coordinators,
        Entity::Users,
        Entity::Roles,
        Entity::UserRoles,
        Entity::Dashboard,
    ];

    /// Cache name, also accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Departments => "departments",
            Entity::Classes => "classes",
            Entity::Teachers => "teachers",
            Entity::Subjects => "subjects",
            Entity::Rooms => "rooms",
            Entity::TimeSlots => "time_slots",
            Entity::TeacherSubjects => "teacher_subjects",
            Entity::TeacherPerClass => "teacher_per_class",
            Entity::TimetableEntries => "timetable_entries",
            Entity::Students => "students",
            Entity::Hods => "hods",
            Entity::Coordinators => "coordinators",
            Entity::Users => "users",
            Entity::Roles => "roles",
            Entity::UserRoles => "user_roles",
            Entity::Dashboard => "dashboard",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Entity::TimeSlots => "time-slots",
            Entity::TeacherSubjects => "teacher-subjects",
            Entity::TeacherPerClass => "teacher-per-class",
            Entity::TimetableEntries => "timetable-entries",
            Entity::UserRoles => "user-roles",
            Entity::Dashboard => "dashboard/stats",
            other => other.name(),
        }
    }

    /// Entities whose cached views embed or count rows of this one.
    pub fn dependents(&self) -> &'static [Entity] {
        use Entity::*;
        match self {
            Departments => &[Classes, Teachers, Subjects, Students, Hods, Coordinators, Dashboard],
            Classes => &[TeacherPerClass, TimetableEntries, Students, Dashboard],
            Teachers => &[TeacherSubjects, TeacherPerClass, TimetableEntries, Dashboard],
            Subjects => &[TeacherSubjects, TimetableEntries, Dashboard],
            Rooms => &[TimetableEntries, Dashboard],
            TimeSlots => &[TimetableEntries, Dashboard],
            TeacherSubjects => &[TeacherPerClass],
            TimetableEntries => &[Dashboard],
            Users => &[UserRoles],
            Roles => &[UserRoles],
            _ => &[],
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Entity::ALL
            .iter()
            .find(|e| e.name() == normalized)
            .copied()
            .ok_or_else(|| format!("unknown entity: {}", s))
    }
}

pub struct Resources {
    api: Arc<ApiClient>,
    cache: QueryCache<Value>,
}

impl Resources {
    pub fn new(api: Arc<ApiClient>, stale_time: Duration) -> Self {
        Self {
            api,
            cache: QueryCache::new(stale_time),
        }
    }

    fn list_key(entity: Entity, filters: &[(String, String)]) -> QueryKey {
        filters
            .iter()
            .fold(QueryKey::new(entity.name()), |key, (k, v)| key.with(k.clone(), v))
    }

    pub async fn list(&self, entity: Entity, filters: &[(String, String)]) -> ClientResult<Value> {
        let key = Self::list_key(entity, filters);
        let api = self.api.clone();
        let query = key.query_pairs();
        self.cache
            .fetch(&key, || async move { api.get(entity.path(), &query).await })
            .await
    }

    pub async fn get(&self, entity: Entity, id: i32) -> ClientResult<Value> {
        let key = QueryKey::new(entity.name()).with("id", id);
        let api = self.api.clone();
        let path = format!("{}/{}", entity.path(), id);
        self.cache
            .fetch(&key, || async move { api.get(&path, &[]).await })
            .await
    }

    /// Drops the cached answer for exactly this query, then fetches it again.
    pub async fn refetch(&self, entity: Entity, filters: &[(String, String)]) -> ClientResult<Value> {
        if self.cache.invalidate_exact(&Self::list_key(entity, filters)) {
            tracing::debug!("dropped cached {} query before refetch", entity);
        }
        self.list(entity, filters).await
    }

    pub async fn stats(&self) -> ClientResult<Value> {
        self.list(Entity::Dashboard, &[]).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, entity: Entity, body: &B) -> ClientResult<Value> {
        let created = self.api.post(entity.path(), body).await?;
        self.invalidate(entity);
        Ok(created)
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        entity: Entity,
        id: i32,
        body: &B,
    ) -> ClientResult<Value> {
        let updated = self
            .api
            .put(&format!("{}/{}", entity.path(), id), body)
            .await?;
        self.invalidate(entity);
        Ok(updated)
    }

    pub async fn delete(&self, entity: Entity, id: i32) -> ClientResult<Value> {
        let deleted = self
            .api
            .delete(&format!("{}/{}", entity.path(), id))
            .await?;
        self.invalidate(entity);
        Ok(deleted)
    }

    pub async fn replace_teacher_subjects(
        &self,
        teacher_id: i32,
        subject_ids: &[i32],
    ) -> ClientResult<Value> {
        let links = self
            .api
            .put(
                &format!("teachers/{}/subjects", teacher_id),
                &json!({ "subject_ids": subject_ids }),
            )
            .await?;
        self.invalidate(Entity::TeacherSubjects);
        Ok(links)
    }

    /// Runs the generator through the server. Persisted runs refresh the grid.
    pub async fn generate(&self, request: &Value) -> ClientResult<Value> {
        let report: Value = self.api.post("timetable/generate", request).await?;
        if report["persisted"].as_bool().unwrap_or(false) {
            self.invalidate(Entity::TimetableEntries);
        }
        Ok(report)
    }

    fn invalidate(&self, entity: Entity) {
        let mut dropped = self.cache.invalidate(entity.name());
        for dependent in entity.dependents() {
            dropped += self.cache.invalidate(dependent.name());
        }
        tracing::debug!("invalidated {} cached queries after {} change", dropped, entity);
    }
}
