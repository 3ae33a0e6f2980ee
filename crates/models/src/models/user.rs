use serde::Serialize;

use crate::{db::models as db, store::{Store, StoreResult}};
use super::{FindModelError, FindModelResult, Model};

/// A single user in the system.
#[derive(Clone, Debug)]
pub struct User {
    data: db::User,
}

/// A subset of user's data that can safely be publicly exposed.
#[derive(Debug, Serialize)]
pub struct Public {
    pub id: i32,
    pub username: String,
    pub label: String,
    pub is_super: bool,
}

impl Model for User {
    const ERROR_CATEGORY: &'static str = "user";

    type Id = i32;
    type Database = db::User;
    type Public = Public;

    fn from_db(data: Self::Database) -> Self {
        User { data }
    }

    fn into_db(self) -> Self::Database {
        self.data
    }

    fn id(&self) -> Self::Id {
        self.data.id
    }

    fn get_public(&self) -> Public {
        let db::User { id, ref username, is_super, .. } = self.data;

        Public {
            id,
            username: username.clone(),
            label: self.label().to_string(),
            is_super,
        }
    }
}

impl User {
    /// Find a user by their ID.
    pub fn by_id(store: &dyn Store, id: i32) -> FindModelResult<User> {
        store.user(id)?
            .map(User::from_db)
            .ok_or_else(FindModelError::not_found::<User>)
    }

    /// Find a user by their username.
    pub fn by_name(store: &dyn Store, username: &str) -> StoreResult<Option<User>> {
        Ok(store.user_by_name(username)?.map(User::from_db))
    }

    /// Name under which this user is shown to others.
    ///
    /// This is the user's full name, or their username when no full name was
    /// set.
    pub fn label(&self) -> &str {
        let full_name = self.data.full_name.trim();

        if full_name.is_empty() {
            &self.data.username
        } else {
            full_name
        }
    }
}

impl std::ops::Deref for User {
    type Target = db::User;

    fn deref(&self) -> &db::User {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, full_name: &str) -> User {
        User::from_db(db::User {
            id: 1,
            username: username.to_string(),
            full_name: full_name.to_string(),
            is_super: false,
            permissions: 0,
        })
    }

    #[test]
    fn label_prefers_full_name() {
        assert_eq!(user("jdoe", "Jane Doe").label(), "Jane Doe");
    }

    #[test]
    fn label_falls_back_to_username() {
        assert_eq!(user("jdoe", "").label(), "jdoe");
        assert_eq!(user("jdoe", "   ").label(), "jdoe");
    }

    #[test]
    fn public_data_carries_label() {
        let public = user("jdoe", "Jane Doe").get_public();
        assert_eq!(public.username, "jdoe");
        assert_eq!(public.label, "Jane Doe");
    }
}
