//! # Caller identity and role policy
//!
//! The account service hands back an untyped claims document for a bearer
//! token. It is turned into a [`Principal`] exactly once, at the edge of the
//! service, and every operation is then gated with [`authorize`].
//!
//! All checks reduce to one primitive, [`Principal::has_any_role`]. The four
//! [`Capability`] values name the role sets used by the service, and each
//! [`Operation`] lists the capabilities that unlock it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::directory::TokenInfo;
use crate::errors::{ScheduleError, ScheduleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Doctor,
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Doctor, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Doctor => "Doctor",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ScheduleError::Validation(format!("Unknown role '{}'", s)))
    }
}

/// Authenticated caller. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: Option<i64>,
    username: String,
    roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(
        user_id: Option<i64>,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.roles.contains(role))
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.has_any_role(capability.roles())
    }
}

/// Role names the service does not know about are dropped.
impl From<&TokenInfo> for Principal {
    fn from(info: &TokenInfo) -> Self {
        Principal::new(
            info.user_id,
            info.username.clone(),
            info.roles.iter().filter_map(|role| role.parse().ok()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    IdentifyUser,
    IdentifyAdmin,
    IdentifyManager,
    IdentifyDoctor,
}

impl Capability {
    pub fn roles(self) -> &'static [Role] {
        match self {
            Capability::IdentifyUser => &Role::ALL,
            Capability::IdentifyAdmin => &[Role::Admin],
            Capability::IdentifyManager => &[Role::Manager],
            Capability::IdentifyDoctor => &[Role::Doctor],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create, update and delete timetables, including bulk deletes.
    ManageTimetables,
    /// Read a timetable or the schedule of a hospital or doctor.
    ReadTimetables,
    ReadRoomSchedule,
    ViewSlots,
    BookAppointment,
    /// Cancel or inspect any appointment. Bookers may always act on their own.
    ManageAppointments,
}

impl Operation {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Operation::ManageTimetables | Operation::ManageAppointments => {
                &[Capability::IdentifyAdmin, Capability::IdentifyManager]
            }
            Operation::ReadRoomSchedule => &[
                Capability::IdentifyAdmin,
                Capability::IdentifyManager,
                Capability::IdentifyDoctor,
            ],
            Operation::ReadTimetables | Operation::ViewSlots | Operation::BookAppointment => {
                &[Capability::IdentifyUser]
            }
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Operation::ManageTimetables => "manage timetables",
            Operation::ReadTimetables => "read timetables",
            Operation::ReadRoomSchedule => "read room schedules",
            Operation::ViewSlots => "view available slots",
            Operation::BookAppointment => "book appointments",
            Operation::ManageAppointments => "manage other users' appointments",
        }
    }
}

pub fn is_allowed(principal: &Principal, operation: Operation) -> bool {
    operation
        .capabilities()
        .iter()
        .any(|capability| principal.has(*capability))
}

pub fn authorize(principal: &Principal, operation: Operation) -> ScheduleResult<()> {
    if is_allowed(principal, operation) {
        Ok(())
    } else {
        Err(ScheduleError::Authorization(format!(
            "User '{}' is not allowed to {}",
            principal.username(),
            operation.describe()
        )))
    }
}

/// Passes if the caller owns the resource or holds a role allowed to perform
/// `operation` on anyone's resource.
pub fn authorize_owner(
    principal: &Principal,
    owner_username: &str,
    operation: Operation,
) -> ScheduleResult<()> {
    if principal.username() == owner_username {
        return Ok(());
    }
    authorize(principal, operation)
}
