//! File-based fleet storage implementation
//!
//! Keeps the whole fleet in memory behind one `RwLock` and writes it to a
//! single JSON file after every mutation. Each repository call takes the lock
//! once, so a call's reads and writes are atomic with respect to other calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

use serde::{Deserialize, Serialize};

use super::repository::FleetRepository;
use crate::issue::{Issue, IssueFilter, IssueUpdate};
use crate::quota::{AssignmentQuota, IssueQuota, QuotaMode};
use crate::user::{PasswordResetToken, Role, User};
use crate::vessel::{Assignment, Vessel, VesselStatus, VesselUpdate};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
struct FleetState {
    users: HashMap<Uuid, User>,
    vessels: HashMap<Uuid, Vessel>,
    assignments: Vec<Assignment>,
    issues: HashMap<Uuid, Issue>,
    reset_tokens: HashMap<Uuid, PasswordResetToken>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFleetState {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    vessels: Vec<Vessel>,
    #[serde(default)]
    assignments: Vec<Assignment>,
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    reset_tokens: Vec<PasswordResetToken>,
}

impl From<StoredFleetState> for FleetState {
    fn from(value: StoredFleetState) -> Self {
        Self {
            users: value.users.into_iter().map(|item| (item.id, item)).collect(),
            vessels: value
                .vessels
                .into_iter()
                .map(|item| (item.id, item))
                .collect(),
            assignments: value.assignments,
            issues: value.issues.into_iter().map(|item| (item.id, item)).collect(),
            reset_tokens: value
                .reset_tokens
                .into_iter()
                .map(|item| (item.id, item))
                .collect(),
        }
    }
}

impl From<&FleetState> for StoredFleetState {
    fn from(value: &FleetState) -> Self {
        Self {
            users: value.users.values().cloned().collect(),
            vessels: value.vessels.values().cloned().collect(),
            assignments: value.assignments.clone(),
            issues: value.issues.values().cloned().collect(),
            reset_tokens: value.reset_tokens.values().cloned().collect(),
        }
    }
}

impl FleetState {
    fn active_assignment_count(&self, user_id: Uuid, excluding_vessel: Option<Uuid>) -> usize {
        self.assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .filter(|assignment| Some(assignment.vessel_id) != excluding_vessel)
            .filter(|assignment| {
                self.vessels
                    .get(&assignment.vessel_id)
                    .is_some_and(|vessel| vessel.status == VesselStatus::Active)
            })
            .count()
    }

    fn open_issue_count_by_reporter(&self, user_id: Uuid) -> usize {
        self.issues
            .values()
            .filter(|issue| issue.reported_by_id == Some(user_id) && issue.is_open())
            .count()
    }

    fn is_assigned(&self, user_id: Uuid, vessel_id: Uuid) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.user_id == user_id && assignment.vessel_id == vessel_id)
    }

    fn imo_taken(&self, imo: &str, except: Option<Uuid>) -> bool {
        self.vessels
            .values()
            .any(|vessel| vessel.imo == imo && Some(vessel.id) != except)
    }

    /// Validate and de-duplicate a replacement crew list
    fn resolve_crew(&self, crew_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut unique = Vec::with_capacity(crew_ids.len());
        for user_id in crew_ids {
            if unique.contains(user_id) {
                continue;
            }
            match self.users.get(user_id) {
                Some(user) if user.role == Role::CrewMember => unique.push(*user_id),
                _ => {
                    return Err(Error::InvalidInput(
                        "One or more assigned crew members do not exist".to_string(),
                    ))
                }
            }
        }
        Ok(unique)
    }

    /// Reject the update if any crew member would exceed the active-assignment cap
    fn check_assignment_caps(
        &self,
        current: &Vessel,
        updated: &Vessel,
        crew: &[Uuid],
    ) -> Result<()> {
        if updated.status != VesselStatus::Active {
            return Ok(());
        }
        let was_active = current.status == VesselStatus::Active;
        for user_id in crew {
            if was_active && self.is_assigned(*user_id, current.id) {
                continue;
            }
            let active_count = self.active_assignment_count(*user_id, Some(current.id));
            let decision = AssignmentQuota::evaluate(active_count, updated.status);
            if !decision.allowed {
                let email = self
                    .users
                    .get(user_id)
                    .map(|user| user.email.as_str())
                    .unwrap_or("unknown user");
                return Err(Error::QuotaExceeded(format!(
                    "{}: {}",
                    email,
                    decision.message.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}

/// File-based fleet store using JSON
pub struct FileFleetStore {
    /// Path to the JSON file
    path: PathBuf,
    state: RwLock<FleetState>,
}

impl FileFleetStore {
    /// Create a new FileFleetStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = load_state(&path).await?;
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Apply `change` to a copy of the state, persist the copy, then swap it
    /// in. A failed change or a failed write leaves the live state untouched.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut FleetState) -> Result<T> + Send,
        T: Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let value = change(&mut next)?;
        persist_state(&self.path, &next).await.map_err(|err| {
            Error::Storage(format!("failed to write {}: {}", self.path.display(), err))
        })?;
        *state = next;
        Ok(value)
    }
}

#[async_trait]
impl FleetRepository for FileFleetStore {
    async fn create_user(&self, user: User) -> Result<User> {
        self.mutate(move |state| {
            if state
                .users
                .values()
                .any(|existing| existing.email == user.email)
            {
                return Err(Error::Conflict(format!(
                    "User '{}' already exists",
                    user.email
                )));
            }
            state.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let normalized = email.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email == normalized)
            .cloned())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect();
        users.sort_by(|left, right| left.email.cmp(&right.email));
        Ok(users)
    }

    async fn count_users(&self) -> Result<usize> {
        Ok(self.state.read().await.users.len())
    }

    async fn replace_reset_token(&self, token: PasswordResetToken) -> Result<()> {
        self.mutate(move |state| {
            if !state.users.contains_key(&token.user_id) {
                return Err(Error::UserNotFound(token.user_id.to_string()));
            }
            state
                .reset_tokens
                .retain(|_, existing| existing.user_id != token.user_id);
            state.reset_tokens.insert(token.id, token);
            Ok(())
        })
        .await
    }

    async fn find_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>> {
        let state = self.state.read().await;
        Ok(state
            .reset_tokens
            .values()
            .find(|record| record.token == token)
            .cloned())
    }

    async fn consume_reset_token(&self, token_id: Uuid, password_hash: String) -> Result<User> {
        self.mutate(move |state| {
            let record = state
                .reset_tokens
                .remove(&token_id)
                .ok_or_else(|| Error::InvalidInput("Reset token not found".to_string()))?;
            let user = state
                .users
                .get_mut(&record.user_id)
                .ok_or_else(|| Error::UserNotFound(record.user_id.to_string()))?;
            user.password_hash = password_hash;
            Ok(user.clone())
        })
        .await
    }

    async fn create_vessel(&self, vessel: Vessel) -> Result<Vessel> {
        self.mutate(move |state| {
            if state.imo_taken(&vessel.imo, None) {
                return Err(Error::Conflict(format!("IMO '{}' already exists", vessel.imo)));
            }
            state.vessels.insert(vessel.id, vessel.clone());
            Ok(vessel)
        })
        .await
    }

    async fn get_vessel(&self, id: Uuid) -> Result<Option<Vessel>> {
        let state = self.state.read().await;
        Ok(state.vessels.get(&id).cloned())
    }

    async fn list_vessels(&self) -> Result<Vec<Vessel>> {
        let state = self.state.read().await;
        let mut vessels: Vec<Vessel> = state.vessels.values().cloned().collect();
        vessels.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(vessels)
    }

    async fn list_vessels_for_user(&self, user_id: Uuid) -> Result<Vec<Vessel>> {
        let state = self.state.read().await;
        let mut vessels: Vec<Vessel> = state
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .filter_map(|assignment| state.vessels.get(&assignment.vessel_id).cloned())
            .collect();
        vessels.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(vessels)
    }

    async fn update_vessel(
        &self,
        id: Uuid,
        update: VesselUpdate,
        mode: QuotaMode,
    ) -> Result<Vessel> {
        let updated = self
            .mutate(move |state| {
                let current = state
                    .vessels
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| Error::VesselNotFound(id.to_string()))?;

                if let Some(imo) = update.imo.as_deref() {
                    if state.imo_taken(imo, Some(id)) {
                        return Err(Error::Conflict(format!("IMO '{}' already exists", imo)));
                    }
                }

                let replacement_crew = match update.assigned_crew_ids.as_deref() {
                    Some(crew_ids) => Some(state.resolve_crew(crew_ids)?),
                    None => None,
                };

                let mut updated = current.clone();
                update.apply_to(&mut updated);

                if mode.is_enforced() {
                    let crew = match &replacement_crew {
                        Some(crew) => crew.clone(),
                        None => state
                            .assignments
                            .iter()
                            .filter(|assignment| assignment.vessel_id == id)
                            .map(|assignment| assignment.user_id)
                            .collect(),
                    };
                    state.check_assignment_caps(&current, &updated, &crew)?;
                }

                if let Some(crew) = replacement_crew {
                    let previous: HashMap<Uuid, Assignment> = state
                        .assignments
                        .iter()
                        .filter(|assignment| assignment.vessel_id == id)
                        .map(|assignment| (assignment.user_id, assignment.clone()))
                        .collect();
                    state.assignments.retain(|assignment| assignment.vessel_id != id);
                    for user_id in crew {
                        let assignment = previous
                            .get(&user_id)
                            .cloned()
                            .unwrap_or_else(|| Assignment::new(user_id, id));
                        state.assignments.push(assignment);
                    }
                }

                state.vessels.insert(id, updated.clone());
                Ok(updated)
            })
            .await?;
        tracing::debug!("Vessel {} updated", id);
        Ok(updated)
    }

    async fn delete_vessel(&self, id: Uuid) -> Result<bool> {
        if !self.state.read().await.vessels.contains_key(&id) {
            return Ok(false);
        }
        self.mutate(move |state| {
            if state.vessels.remove(&id).is_none() {
                return Ok(false);
            }
            state.issues.retain(|_, issue| issue.vessel_id != id);
            state.assignments.retain(|assignment| assignment.vessel_id != id);
            Ok(true)
        })
        .await
    }

    async fn assign(&self, user_id: Uuid, vessel_id: Uuid) -> Result<Assignment> {
        self.mutate(move |state| {
            match state.users.get(&user_id) {
                Some(user) if user.role == Role::CrewMember => {}
                Some(_) => {
                    return Err(Error::InvalidInput(
                        "Only crew members can be assigned to vessels".to_string(),
                    ))
                }
                None => return Err(Error::UserNotFound(user_id.to_string())),
            }
            if !state.vessels.contains_key(&vessel_id) {
                return Err(Error::VesselNotFound(vessel_id.to_string()));
            }
            if state.is_assigned(user_id, vessel_id) {
                return Err(Error::Conflict(format!(
                    "User {} is already assigned to vessel {}",
                    user_id, vessel_id
                )));
            }
            let assignment = Assignment::new(user_id, vessel_id);
            state.assignments.push(assignment.clone());
            Ok(assignment)
        })
        .await
    }

    async fn find_assignment(&self, user_id: Uuid, vessel_id: Uuid) -> Result<Option<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .find(|assignment| assignment.user_id == user_id && assignment.vessel_id == vessel_id)
            .cloned())
    }

    async fn list_assignments_for_user(&self, user_id: Uuid) -> Result<Vec<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_assignments_for_vessel(&self, vessel_id: Uuid) -> Result<Vec<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| assignment.vessel_id == vessel_id)
            .cloned()
            .collect())
    }

    async fn count_active_assignments(
        &self,
        user_id: Uuid,
        excluding_vessel: Option<Uuid>,
    ) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.active_assignment_count(user_id, excluding_vessel))
    }

    async fn create_issue(&self, issue: Issue, mode: QuotaMode) -> Result<Issue> {
        self.mutate(move |state| {
            if !state.vessels.contains_key(&issue.vessel_id) {
                return Err(Error::VesselNotFound(issue.vessel_id.to_string()));
            }
            if state.issues.contains_key(&issue.id) {
                return Err(Error::Conflict(format!(
                    "Issue with ID {} already exists",
                    issue.id
                )));
            }
            if let (QuotaMode::Enforced, Some(reporter)) = (mode, issue.reported_by_id) {
                let decision = IssueQuota::evaluate(state.open_issue_count_by_reporter(reporter));
                if !decision.allowed {
                    return Err(Error::QuotaExceeded(decision.message.unwrap_or_default()));
                }
            }
            state.issues.insert(issue.id, issue.clone());
            Ok(issue)
        })
        .await
    }

    async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
        let state = self.state.read().await;
        Ok(state.issues.get(&id).cloned())
    }

    async fn list_issues(&self, filter: IssueFilter) -> Result<Vec<Issue>> {
        let state = self.state.read().await;
        let mut issues: Vec<Issue> = state
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        // Newest first
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(issues)
    }

    async fn update_issue(&self, id: Uuid, update: IssueUpdate) -> Result<Issue> {
        self.mutate(move |state| {
            let issue = state
                .issues
                .get_mut(&id)
                .ok_or_else(|| Error::IssueNotFound(id.to_string()))?;
            update.apply_to(issue);
            Ok(issue.clone())
        })
        .await
    }

    async fn count_open_issues_by_reporter(&self, user_id: Uuid) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.open_issue_count_by_reporter(user_id))
    }

    async fn count_open_issues_for_vessel(&self, vessel_id: Uuid) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .issues
            .values()
            .filter(|issue| issue.vessel_id == vessel_id && issue.is_open())
            .count())
    }
}

async fn load_state(path: &Path) -> Result<FleetState> {
    if !path.exists() {
        return Ok(FleetState::default());
    }
    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(FleetState::default());
    }
    let stored: StoredFleetState = serde_json::from_str(&content)?;
    Ok(stored.into())
}

async fn persist_state(path: &Path, state: &FleetState) -> Result<()> {
    let content = serde_json::to_string_pretty(&StoredFleetState::from(state))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}
