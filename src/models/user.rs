use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    Student,
    Parent,
    Teacher,
    SchoolAdmin,
    SocialWorker,
    PlatformAdmin,
}

impl RoleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Student => "student",
            RoleTag::Parent => "parent",
            RoleTag::Teacher => "teacher",
            RoleTag::SchoolAdmin => "school_admin",
            RoleTag::SocialWorker => "social_worker",
            RoleTag::PlatformAdmin => "platform_admin",
        }
    }

    pub fn parse(value: &str) -> Option<RoleTag> {
        match value {
            "student" => Some(RoleTag::Student),
            "parent" => Some(RoleTag::Parent),
            "teacher" => Some(RoleTag::Teacher),
            "school_admin" => Some(RoleTag::SchoolAdmin),
            "social_worker" => Some(RoleTag::SocialWorker),
            "platform_admin" => Some(RoleTag::PlatformAdmin),
            _ => None,
        }
    }

    /// Admin roles are provisioned server-side and have no separate
    /// profile-creation step. Everyone else must complete one before the
    /// role becomes usable.
    pub fn requires_profile(&self) -> bool {
        !matches!(self, RoleTag::SchoolAdmin | RoleTag::PlatformAdmin)
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoleTag::Student => "Student",
            RoleTag::Parent => "Parent",
            RoleTag::Teacher => "Teacher",
            RoleTag::SchoolAdmin => "School Admin",
            RoleTag::SocialWorker => "Social Worker",
            RoleTag::PlatformAdmin => "Platform Admin",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Role tags held by the account, in server order. The resolver treats
    /// this order as the source of truth for option ordering.
    pub roles: Vec<RoleTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleProfile {
    pub id: Uuid,
    pub role: RoleTag,
}

/// The role profiles that exist for an account, keyed by role tag. At most
/// one profile per role.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: HashMap<RoleTag, RoleProfile>,
}

impl ProfileSet {
    pub fn contains(&self, role: RoleTag) -> bool {
        self.profiles.contains_key(&role)
    }

    pub fn get(&self, role: RoleTag) -> Option<&RoleProfile> {
        self.profiles.get(&role)
    }

    pub fn insert(&mut self, profile: RoleProfile) {
        self.profiles.insert(profile.role, profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl From<Vec<RoleProfile>> for ProfileSet {
    fn from(profiles: Vec<RoleProfile>) -> Self {
        let mut set = ProfileSet::default();
        for profile in profiles {
            set.insert(profile);
        }
        set
    }
}

/// Cached read-only copy of the account, scoped to the session lifetime.
/// Refetched on each session start rather than persisted.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub user: User,
    pub profiles: ProfileSet,
}
