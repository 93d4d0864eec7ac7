//! Static role -> resource -> allowed-actions table

use crate::domain::value_object::access::{Action, Resource};
use crate::domain::value_object::user_role::UserRole;

/// Actions `role` may perform on `resource`; empty for admin (see [`is_permitted`])
pub const fn allowed_actions(role: UserRole, resource: Resource) -> &'static [Action] {
    use Action::*;
    match (role, resource) {
        (UserRole::Admin, _) => &[],

        (UserRole::Mentor, Resource::Session) => &[Create, Read, Update, Cancel],
        (UserRole::Mentor, Resource::Mentorship) => &[Read, Update],
        (UserRole::Mentor, Resource::Document) => &[Create, Read, Update, Delete],
        (UserRole::Mentor, Resource::Review) => &[Read, Review],
        (UserRole::Mentor, Resource::Analytics) => &[Read],
        (UserRole::Mentor, Resource::Dashboard) => &[Read],

        (UserRole::Student, Resource::Session) => &[Read, Cancel],
        (UserRole::Student, Resource::Mentorship) => &[Read],
        (UserRole::Student, Resource::Document) => &[Read],
        (UserRole::Student, Resource::Review) => &[Create, Read],
        (UserRole::Student, Resource::Analytics | Resource::Dashboard) => &[],
    }
}

pub fn is_permitted(role: UserRole, resource: Resource, action: Action) -> bool {
    role.is_admin() || allowed_actions(role, resource).contains(&action)
}
