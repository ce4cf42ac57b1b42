//! Fleet repository trait
//!
//! Defines the data-access operations the server needs. Every call is atomic.

use async_trait::async_trait;
use uuid::Uuid;

use crate::issue::{Issue, IssueFilter, IssueUpdate};
use crate::quota::QuotaMode;
use crate::user::{PasswordResetToken, Role, User};
use crate::vessel::{Assignment, Vessel, VesselUpdate};
use crate::Result;

/// Repository interface for users, vessels, assignments and issues
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Create a user; fails with `Conflict` on a duplicate email
    async fn create_user(&self, user: User) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by (case-insensitive) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users with the given role, sorted by email
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>>;

    /// Total number of users
    async fn count_users(&self) -> Result<usize>;

    /// Store a reset token, dropping any earlier tokens for the same user
    async fn replace_reset_token(&self, token: PasswordResetToken) -> Result<()>;

    /// Look up a reset token by its secret value
    async fn find_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>>;

    /// Set the owner's password hash and delete the token in one step
    async fn consume_reset_token(&self, token_id: Uuid, password_hash: String) -> Result<User>;

    /// Create a vessel; fails with `Conflict` on a duplicate IMO
    async fn create_vessel(&self, vessel: Vessel) -> Result<Vessel>;

    /// Get a vessel by ID
    async fn get_vessel(&self, id: Uuid) -> Result<Option<Vessel>>;

    /// All vessels, sorted by name
    async fn list_vessels(&self) -> Result<Vec<Vessel>>;

    /// Vessels the user is assigned to, sorted by name
    async fn list_vessels_for_user(&self, user_id: Uuid) -> Result<Vec<Vessel>>;

    /// Apply a partial update and optional crew replacement in one step.
    /// With `QuotaMode::Enforced` the active-assignment cap is checked for
    /// every crew member who would gain an active assignment.
    async fn update_vessel(&self, id: Uuid, update: VesselUpdate, mode: QuotaMode)
        -> Result<Vessel>;

    /// Delete a vessel with its issues and assignments
    async fn delete_vessel(&self, id: Uuid) -> Result<bool>;

    /// Assign a crew member to a vessel; fails with `Conflict` if already assigned
    async fn assign(&self, user_id: Uuid, vessel_id: Uuid) -> Result<Assignment>;

    /// The assignment for a (user, vessel) pair, if any
    async fn find_assignment(&self, user_id: Uuid, vessel_id: Uuid) -> Result<Option<Assignment>>;

    /// Assignments held by a user
    async fn list_assignments_for_user(&self, user_id: Uuid) -> Result<Vec<Assignment>>;

    /// Assignments on a vessel
    async fn list_assignments_for_vessel(&self, vessel_id: Uuid) -> Result<Vec<Assignment>>;

    /// Number of the user's assignments whose vessel is `Active`,
    /// optionally ignoring one vessel
    async fn count_active_assignments(
        &self,
        user_id: Uuid,
        excluding_vessel: Option<Uuid>,
    ) -> Result<usize>;

    /// Create an issue. With `QuotaMode::Enforced` and a reporter set, the
    /// open-issue cap is checked atomically with the insert.
    async fn create_issue(&self, issue: Issue, mode: QuotaMode) -> Result<Issue>;

    /// Get an issue by ID
    async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>>;

    /// Issues matching the filter, newest first
    async fn list_issues(&self, filter: IssueFilter) -> Result<Vec<Issue>>;

    /// Apply an admin update to an issue
    async fn update_issue(&self, id: Uuid, update: IssueUpdate) -> Result<Issue>;

    /// Open issues reported by a user
    async fn count_open_issues_by_reporter(&self, user_id: Uuid) -> Result<usize>;

    /// Open issues on a vessel
    async fn count_open_issues_for_vessel(&self, vessel_id: Uuid) -> Result<usize>;
}
