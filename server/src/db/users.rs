//! User table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type UserId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Case-insensitive substring filters. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserFilter {
    fn matches(&self, user: &User) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle.as_deref() {
                Some(needle) if !needle.is_empty() => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => true,
            }
        }
        contains(&user.name, &self.name) && contains(&user.email, &self.email)
    }
}

/// Fields to overwrite on update. Values are stored as given.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub email_domains: BTreeMap<String, u64>,
    pub most_common_domain: Option<DomainCount>,
    pub average_name_length: u64,
}

/// Users in insertion order plus the id counter.
///
/// Ids come from a counter that only moves forward, so an id is never handed
/// out twice even after the highest user is deleted.
#[derive(Debug, Clone)]
pub struct UserTable {
    rows: Vec<User>,
    next_id: UserId,
}

impl Default for UserTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl UserTable {
    /// The three demo users.
    pub fn seeded() -> Self {
        let mut table = Self::default();
        table.insert("Joao Silva", "joao@example.com");
        table.insert("Maria Santos", "maria@example.com");
        table.insert("Pedro Oliveira", "pedro@example.com");
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(&self) -> &[User] {
        &self.rows
    }

    pub fn filter(&self, filter: &UserFilter) -> Vec<User> {
        self.rows
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.rows.iter().find(|u| u.id == id)
    }

    /// Whether a user other than `except` already has `email`, ignoring case.
    pub fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        let email = email.to_lowercase();
        self.rows
            .iter()
            .any(|u| Some(u.id) != except && u.email.to_lowercase() == email)
    }

    pub fn insert(&mut self, name: impl Into<String>, email: impl Into<String>) -> User {
        let user = User {
            id: self.next_id,
            name: name.into(),
            email: email.into(),
        };
        self.next_id += 1;
        self.rows.push(user.clone());
        user
    }

    pub fn update(&mut self, id: UserId, changes: UserChanges) -> Option<User> {
        let user = self.rows.iter_mut().find(|u| u.id == id)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        Some(user.clone())
    }

    pub fn remove(&mut self, id: UserId) -> Option<User> {
        let index = self.rows.iter().position(|u| u.id == id)?;
        Some(self.rows.remove(index))
    }

    pub fn stats(&self) -> UserStats {
        let total_users = self.rows.len() as u64;

        // Kept in first-seen order so ties go to the earliest domain.
        let mut counts: Vec<(String, u64)> = Vec::new();
        for user in &self.rows {
            let domain = user.email.split_once('@').map_or("", |(_, d)| d);
            match counts.iter_mut().find(|(d, _)| d == domain) {
                Some((_, count)) => *count += 1,
                None => counts.push((domain.to_string(), 1)),
            }
        }

        let most_common_domain = counts
            .iter()
            .fold(None::<&(String, u64)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(domain, count)| DomainCount {
                domain: domain.clone(),
                count: *count,
            });

        let average_name_length = if total_users == 0 {
            0
        } else {
            let chars: u64 = self.rows.iter().map(|u| u.name.chars().count() as u64).sum();
            (chars as f64 / total_users as f64).round() as u64
        };

        UserStats {
            total_users,
            email_domains: counts.into_iter().collect(),
            most_common_domain,
            average_name_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_table_has_three_users() {
        let table = UserTable::seeded();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2).map(|u| u.email.as_str()), Some("maria@example.com"));
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut table = UserTable::seeded();
        table.remove(3).unwrap();
        let user = table.insert("Ana", "ana@x.com");
        assert_eq!(user.id, 4);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let table = UserTable::seeded();
        let filter = UserFilter {
            name: Some("MARIA".into()),
            email: None,
        };
        let found = table.filter(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);

        let filter = UserFilter {
            name: None,
            email: Some("Example.COM".into()),
        };
        assert_eq!(table.filter(&filter).len(), 3);
    }

    #[test]
    fn test_email_taken_ignores_case_and_self() {
        let table = UserTable::seeded();
        assert!(table.email_taken("JOAO@example.com", None));
        assert!(!table.email_taken("joao@example.com", Some(1)));
        assert!(table.email_taken("joao@example.com", Some(2)));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut table = UserTable::seeded();
        let user = table
            .update(
                1,
                UserChanges {
                    name: Some("Joana".into()),
                    email: None,
                },
            )
            .unwrap();
        assert_eq!(user.name, "Joana");
        assert_eq!(user.email, "joao@example.com");
    }

    #[test]
    fn test_stats_over_seed() {
        let stats = UserTable::seeded().stats();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.email_domains.get("example.com"), Some(&3));
        assert_eq!(
            stats.most_common_domain,
            Some(DomainCount {
                domain: "example.com".into(),
                count: 3
            })
        );
        // 10, 12 and 14 characters
        assert_eq!(stats.average_name_length, 12);
    }

    #[test]
    fn test_stats_tie_goes_to_first_domain() {
        let mut table = UserTable::default();
        table.insert("A", "a@one.com");
        table.insert("B", "b@two.com");
        let stats = table.stats();
        assert_eq!(stats.most_common_domain.unwrap().domain, "one.com");
    }

    #[test]
    fn test_stats_on_empty_table() {
        let stats = UserTable::default().stats();
        assert_eq!(stats.total_users, 0);
        assert!(stats.most_common_domain.is_none());
        assert_eq!(stats.average_name_length, 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_prop_ids_strictly_increase(deletes in prop::collection::vec(any::<bool>(), 1..40)) {
                let mut table = UserTable::seeded();
                let mut last = 3;
                for (i, delete_after) in deletes.into_iter().enumerate() {
                    let user = table.insert(format!("User {i}"), format!("user{i}@x.com"));
                    prop_assert!(user.id > last);
                    last = user.id;
                    if delete_after {
                        table.remove(user.id);
                    }
                }
            }
        }
    }
}
