//! JSON file user store.

use std::{
    fs,
    path::{Path, PathBuf},
};

use entities::{eq_ignore_case, User, UserRole};

use crate::{UserStoreError, UserStoreResult};

/// Name given to loaded accounts whose name is blank.
const UNKNOWN_USERNAME: &str = "unbekannt";

/// Returns the accounts created on first run.
pub fn default_users() -> Vec<User> {
    vec![
        User::new("admin", "admin", UserRole::Admin),
        User::new("bib", "bib", UserRole::Librarian),
        User::new("gast", "gast", UserRole::Guest),
    ]
}

/// User accounts backed by a JSON array file.
///
/// Every successful change rewrites the whole file. Write failures are
/// logged and the in-memory change is kept.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: Vec<User>,
}

impl UserStore {
    /// Opens the user file at `path`.
    ///
    /// A missing, empty or unreadable file is replaced with the default
    /// accounts.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            users: Vec::new(),
        };

        if let Some(parent) = store.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(path = %parent.display(), error = %e, "Failed to create data directory");
            }
        }

        store.reload();
        store
    }

    /// Returns the path of the user file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns all accounts in stored order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Reloads the accounts from disk, seeding defaults when needed.
    pub fn reload(&mut self) {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No user file, creating default accounts");
            self.seed_defaults();
            return;
        }

        match self.read_users() {
            Ok(users) => {
                tracing::info!(count = users.len(), "Users loaded");
                self.users = users;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to load users, restoring default accounts");
                self.seed_defaults();
            }
        }
    }

    fn read_users(&self) -> UserStoreResult<Vec<User>> {
        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Err(UserStoreError::Validation("user file is empty".to_string()));
        }

        let mut users: Vec<User> = serde_json::from_str(&json)?;
        for user in &mut users {
            if user.username.trim().is_empty() {
                user.username = UNKNOWN_USERNAME.to_string();
            }
        }
        Ok(users)
    }

    fn seed_defaults(&mut self) {
        self.users = default_users();
        self.save();
    }

    /// Writes all accounts to disk, returning any failure.
    pub fn try_save(&self) -> UserStoreResult<()> {
        let json = serde_json::to_string_pretty(&self.users)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Writes all accounts to disk. Failures are logged.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save users");
        }
    }

    /// Finds an account by name, ignoring case.
    pub fn find_by_name(&self, username: &str) -> Option<&User> {
        if username.trim().is_empty() {
            return None;
        }
        self.users
            .iter()
            .find(|u| eq_ignore_case(&u.username, username))
    }

    /// Returns the account if the name matches (ignoring case) and the
    /// password matches exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return None;
        }
        self.users
            .iter()
            .find(|u| eq_ignore_case(&u.username, username) && u.password == password)
    }

    /// Like [`UserStore::authenticate`], failing with
    /// [`UserStoreError::InvalidCredentials`].
    pub fn try_authenticate(&self, username: &str, password: &str) -> UserStoreResult<&User> {
        self.authenticate(username, password)
            .ok_or(UserStoreError::InvalidCredentials)
    }

    /// Adds an account.
    pub fn add(&mut self, user: User) -> UserStoreResult<()> {
        if user.username.trim().is_empty() {
            return Err(UserStoreError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        if self.find_by_name(&user.username).is_some() {
            return Err(UserStoreError::already_exists(user.username));
        }

        tracing::info!(username = %user.username, role = %user.role, "Adding user");
        self.users.push(user);
        self.save();
        Ok(())
    }

    /// Renames an account and/or changes its role. The password is kept.
    pub fn update(&mut self, old_username: &str, updated: User) -> UserStoreResult<()> {
        if old_username.trim().is_empty() || updated.username.trim().is_empty() {
            return Err(UserStoreError::Validation(
                "username must not be empty".to_string(),
            ));
        }

        let index = self.position(old_username)?;
        let renamed = !eq_ignore_case(old_username, &updated.username);
        if renamed && self.find_by_name(&updated.username).is_some() {
            return Err(UserStoreError::already_exists(updated.username));
        }

        let existing = &mut self.users[index];
        tracing::info!(from = %existing.username, to = %updated.username, role = %updated.role, "Updating user");
        existing.username = updated.username;
        existing.role = updated.role;
        self.save();
        Ok(())
    }

    /// Replaces the password of an account.
    pub fn change_password(&mut self, username: &str, new_password: &str) -> UserStoreResult<()> {
        if username.trim().is_empty() {
            return Err(UserStoreError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        if new_password.trim().is_empty() {
            return Err(UserStoreError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        let index = self.position(username)?;
        self.users[index].password = new_password.to_string();
        tracing::info!(username, "Password changed");
        self.save();
        Ok(())
    }

    /// Removes an account and returns it.
    pub fn remove(&mut self, username: &str) -> UserStoreResult<User> {
        let index = self.position(username)?;
        let removed = self.users.remove(index);
        tracing::info!(username = %removed.username, "Removed user");
        self.save();
        Ok(removed)
    }

    fn position(&self, username: &str) -> UserStoreResult<usize> {
        self.users
            .iter()
            .position(|u| eq_ignore_case(&u.username, username))
            .ok_or_else(|| UserStoreError::not_found(username))
    }
}
