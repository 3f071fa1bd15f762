use carapax::types::{Integer, User};
use chrono::Utc;
use std::{collections::HashMap, error::Error, fmt, sync::Arc};
use tokio_postgres::{Client, Error as ClientError, Row};

// A username can be left behind on an old row after it moves to another
// account; the most recently seen holder wins.
const FIND_BY_USERNAME: &str = "SELECT * FROM users WHERE lower(username) = lower($1) \
     ORDER BY COALESCE(updated_at, created_at) DESC LIMIT 1";

/// Directory of every user the bot has seen.
#[derive(Clone)]
pub struct UserService {
    client: Arc<Client>,
}

impl UserService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn save(&self, user: User) -> Result<(), UserServiceError> {
        if self.is_exists(user.id).await? {
            self.update(user).await?
        } else {
            self.create(user).await?
        }
        Ok(())
    }

    pub async fn find(&self, user_id: Integer) -> Result<Option<UserInfo>, UserServiceError> {
        let row = self
            .client
            .query_opt("SELECT * FROM users WHERE id = $1", &[&user_id])
            .await
            .map_err(|source| UserServiceError::Find { source, user_id })?;
        Ok(row.map(UserInfo::from))
    }

    /// Usernames are compared case-insensitively, as Telegram does.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, UserServiceError> {
        let row = self
            .client
            .query_opt(FIND_BY_USERNAME, &[&username])
            .await
            .map_err(|source| UserServiceError::FindByUsername {
                source,
                username: username.to_string(),
            })?;
        Ok(row.map(UserInfo::from))
    }

    /// Returns users in the order of `usernames`, skipping names nobody has.
    pub async fn find_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserInfo>, UserServiceError> {
        let lowered: Vec<String> = usernames.iter().map(|username| username.to_lowercase()).collect();
        let mut found: HashMap<String, UserInfo> = self
            .client
            .query("SELECT * FROM users WHERE lower(username) = ANY($1)", &[&lowered])
            .await
            .map_err(|source| UserServiceError::FindByUsernames {
                source,
                usernames: usernames.to_vec(),
            })?
            .into_iter()
            .map(UserInfo::from)
            .filter_map(|info| {
                let key = info.username.as_ref()?.to_lowercase();
                Some((key, info))
            })
            .collect();
        Ok(lowered.iter().filter_map(|username| found.remove(username)).collect())
    }

    async fn is_exists(&self, user_id: Integer) -> Result<bool, UserServiceError> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM users WHERE id = $1", &[&user_id])
            .await
            .map_err(|source| UserServiceError::CheckExists { source, user_id })?;
        let count: i64 = row.get(0);
        Ok(count > 0)
    }

    async fn create(&self, user: User) -> Result<(), UserServiceError> {
        self.client
            .execute(
                "INSERT INTO users (id, first_name, last_name, username, created_at) VALUES ($1, $2, $3, $4, $5)",
                &[
                    &user.id,
                    &user.first_name,
                    &user.last_name,
                    &user.username,
                    &Utc::now().naive_utc(),
                ],
            )
            .await
            .map_err(|source| UserServiceError::CreateUser { source, user })?;
        Ok(())
    }

    async fn update(&self, user: User) -> Result<(), UserServiceError> {
        self.client
            .execute(
                "UPDATE users SET first_name = $1, last_name = $2, username = $3, updated_at = $4 WHERE id = $5",
                &[
                    &user.first_name,
                    &user.last_name,
                    &user.username,
                    &Utc::now().naive_utc(),
                    &user.id,
                ],
            )
            .await
            .map_err(|source| UserServiceError::UpdateUser { source, user })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct UserInfo {
    pub id: Integer,
    pub username: Option<String>,
}

impl From<Row> for UserInfo {
    fn from(row: Row) -> UserInfo {
        let indexes: HashMap<&str, usize> = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.name(), idx))
            .collect();
        UserInfo {
            id: row.get(indexes["id"]),
            username: row.get(indexes["username"]),
        }
    }
}

#[derive(Debug)]
pub enum UserServiceError {
    CheckExists { source: ClientError, user_id: Integer },
    CreateUser { source: ClientError, user: User },
    Find { source: ClientError, user_id: Integer },
    FindByUsername { source: ClientError, username: String },
    FindByUsernames { source: ClientError, usernames: Vec<String> },
    UpdateUser { source: ClientError, user: User },
}

impl fmt::Display for UserServiceError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::UserServiceError::*;
        match self {
            CheckExists { source, user_id } => {
                write!(
                    out,
                    "Could not check whether user with id {} exists: {}",
                    user_id, source
                )
            }
            CreateUser { source, user } => {
                write!(out, "Could not create a user: {} (user={:?})", source, user)
            }
            Find { source, user_id } => write!(out, "Could not find user with id {}: {}", user_id, source),
            FindByUsername { source, username } => {
                write!(out, "Could not find user @{}: {}", username, source)
            }
            FindByUsernames { source, usernames } => {
                write!(out, "Could not find users {:?}: {}", usernames, source)
            }
            UpdateUser { source, user } => {
                write!(out, "Could not update a user: {} (user={:?})", source, user)
            }
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::UserServiceError::*;
        Some(match self {
            CheckExists { source, .. } => source,
            CreateUser { source, .. } => source,
            Find { source, .. } => source,
            FindByUsername { source, .. } => source,
            FindByUsernames { source, .. } => source,
            UpdateUser { source, .. } => source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_lookup_prefers_latest_seen_row() {
        assert!(FIND_BY_USERNAME.contains("ORDER BY COALESCE(updated_at, created_at) DESC"));
        assert!(!FIND_BY_USERNAME.contains("NULLS LAST"));
    }
}
