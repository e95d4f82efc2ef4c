use std::collections::HashMap;

use serde::Serialize;
use strum_macros::Display;

use crate::util::{normalize_ws, split_name};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum PersonKind {
    Player,
    Manager,
}

/// A person is identified by their source link, which is also the storage key.
pub type PersonId = String;

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct Person {
    pub link: PersonId,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(name: &str, link: &str) -> Self {
        let (first_name, last_name) = split_name(name);
        Self {
            link: link.to_string(),
            first_name,
            last_name,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Every person encountered on one page, in first-seen order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IdentityRegistry {
    players: Vec<Person>,
    managers: Vec<Person>,
    #[serde(skip)]
    index: HashMap<(PersonKind, PersonId), usize>,
}

impl IdentityRegistry {
    /// Insert-if-absent keyed by link. A known link keeps its first-seen name untouched.
    pub fn ensure(&mut self, kind: PersonKind, name: &str, link: &str) -> PersonId {
        let key = (kind, link.to_string());
        if self.index.contains_key(&key) {
            return key.1;
        }
        let people = match kind {
            PersonKind::Player => &mut self.players,
            PersonKind::Manager => &mut self.managers,
        };
        people.push(Person::new(name, link));
        self.index.insert(key, people.len() - 1);
        link.to_string()
    }

    pub fn get(&self, kind: PersonKind, link: &str) -> Option<&Person> {
        let i = *self.index.get(&(kind, link.to_string()))?;
        self.people(kind).get(i)
    }

    pub fn people(&self, kind: PersonKind) -> &[Person] {
        match kind {
            PersonKind::Player => &self.players,
            PersonKind::Manager => &self.managers,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Resolution {
    Resolved(PersonId),
    /// More than one candidate matched; the first one is still used.
    Ambiguous { chosen: PersonId, matches: usize },
    Unresolved,
}

impl Resolution {
    pub fn person(&self) -> Option<&PersonId> {
        match self {
            Self::Resolved(p) | Self::Ambiguous { chosen: p, .. } => Some(p),
            Self::Unresolved => None,
        }
    }
}

/// Matches a printed annotation name ("Utley", "C. Utley", "Chase Utley") against a person:
/// the trailing words must equal the last name and any leading word must prefix the first name.
pub fn name_matches(fragment: &str, person: &Person) -> bool {
    let fragment = normalize_ws(fragment).to_lowercase();
    let first = person.first_name.to_lowercase();
    let last = person.last_name.to_lowercase();
    if fragment.is_empty() {
        return false;
    }
    if last.is_empty() {
        return fragment == first;
    }
    if fragment == last {
        return true;
    }
    match fragment.split_once(' ') {
        Some((initial, rest)) => rest == last && first.starts_with(initial.trim_end_matches('.')),
        None => false,
    }
}

pub fn resolve_name<'a, I>(fragment: &str, candidates: I) -> Resolution
where
    I: IntoIterator<Item = &'a Person>,
{
    let mut matched = candidates
        .into_iter()
        .filter(|p| name_matches(fragment, p));
    let Some(first) = matched.next() else {
        return Resolution::Unresolved;
    };
    let others = matched.count();
    if others == 0 {
        Resolution::Resolved(first.link.clone())
    } else {
        Resolution::Ambiguous {
            chosen: first.link.clone(),
            matches: others + 1,
        }
    }
}
