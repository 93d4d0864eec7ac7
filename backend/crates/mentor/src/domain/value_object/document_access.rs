use kernel::id::UserId;
use serde::{Deserialize, Serialize};

/// Who may read a document besides its mentor-owner
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "level", content = "mentees", rename_all = "snake_case")]
pub enum DocumentAccess {
    Public,
    #[default]
    Private,
    SpecificMentees(Vec<UserId>),
}

impl DocumentAccess {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::SpecificMentees(_) => "specific_mentees",
        }
    }

    /// Rebuild from the stored level code and allow-list
    pub fn from_parts(code: &str, mentees: Vec<UserId>) -> Option<Self> {
        match code {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "specific_mentees" => Some(Self::SpecificMentees(mentees)),
            _ => None,
        }
    }

    pub fn allow_list(&self) -> &[UserId] {
        match self {
            Self::SpecificMentees(mentees) => mentees,
            _ => &[],
        }
    }

    /// Read policy for `actor` on a document owned by `owner`
    pub fn permits(&self, actor: UserId, owner: UserId) -> bool {
        if actor == owner {
            return true;
        }
        match self {
            Self::Public => true,
            Self::Private => false,
            Self::SpecificMentees(mentees) => mentees.contains(&actor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_always_permitted() {
        let owner = UserId::new();
        assert!(DocumentAccess::Private.permits(owner, owner));
        assert!(DocumentAccess::SpecificMentees(vec![]).permits(owner, owner));
    }

    #[test]
    fn test_public_permits_anyone() {
        assert!(DocumentAccess::Public.permits(UserId::new(), UserId::new()));
    }

    #[test]
    fn test_private_denies_others() {
        assert!(!DocumentAccess::Private.permits(UserId::new(), UserId::new()));
    }

    #[test]
    fn test_specific_mentees_allow_list() {
        let owner = UserId::new();
        let invited = UserId::new();
        let stranger = UserId::new();
        let access = DocumentAccess::SpecificMentees(vec![invited]);
        assert!(access.permits(invited, owner));
        assert!(!access.permits(stranger, owner));
    }

    #[test]
    fn test_parts_roundtrip() {
        let mentee = UserId::new();
        let access = DocumentAccess::SpecificMentees(vec![mentee]);
        let rebuilt =
            DocumentAccess::from_parts(access.code(), access.allow_list().to_vec()).unwrap();
        assert_eq!(rebuilt, access);
        assert_eq!(DocumentAccess::from_parts("internal", vec![]), None);
    }
}
