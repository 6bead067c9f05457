use thiserror::Error;
use uuid::Uuid;

use crate::contact::{Contact, Location};
use crate::search;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("contact index {index} out of range (list has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Partial contact for merge-updates. `None` leaves the field untouched;
/// `location` uses a nested Option so an update can also clear it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub company: Option<String>,
    pub manager: Option<String>,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub location: Option<Option<Location>>,
}

impl ContactPatch {
    fn merged_into(&self, contact: &Contact) -> Contact {
        let mut next = contact.clone();
        if let Some(company) = &self.company {
            next.company = company.clone();
        }
        if let Some(manager) = &self.manager {
            next.manager = manager.clone();
        }
        if let Some(phone) = &self.phone {
            next.phone = phone.clone();
        }
        if let Some(logo) = &self.logo {
            next.logo = logo.clone();
        }
        if let Some(location) = self.location {
            next.location = location;
        }
        next
    }
}

/// The four accepted mutations. Everything else in the program is either a
/// derived view or a collaborator call.
#[derive(Debug, Clone)]
pub enum Command {
    SetAll(Vec<Contact>),
    Add(Contact),
    Update(usize, ContactPatch),
    Delete(usize),
}

/// Pure reducer: each accepted command yields a new list, the input is never
/// touched. Out-of-range indices are rejected here regardless of what the
/// overlay layer promises.
pub fn apply(list: &[Contact], command: Command) -> Result<Vec<Contact>, StoreError> {
    match command {
        Command::SetAll(contacts) => Ok(contacts),
        Command::Add(contact) => {
            let mut next = list.to_vec();
            next.push(contact.defaulted());
            Ok(next)
        }
        Command::Update(index, patch) => {
            if index >= list.len() {
                return Err(StoreError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            Ok(list
                .iter()
                .enumerate()
                .map(|(i, contact)| {
                    if i == index {
                        patch.merged_into(contact)
                    } else {
                        contact.clone()
                    }
                })
                .collect())
        }
        Command::Delete(index) => {
            if index >= list.len() {
                return Err(StoreError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            Ok(list
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, contact)| contact.clone())
                .collect())
        }
    }
}

/// Owns the current list and routes every mutation through [`apply`].
#[derive(Debug, Default)]
pub struct ContactStore {
    contacts: Vec<Contact>,
}

impl ContactStore {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    /// Current position of a contact id, if it still exists.
    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    pub fn by_id(&self, id: Uuid) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), StoreError> {
        self.contacts = apply(&self.contacts, command)?;
        Ok(())
    }

    pub fn set_all(&mut self, contacts: Vec<Contact>) {
        // SetAll cannot fail
        let _ = self.apply(Command::SetAll(contacts));
    }

    pub fn add(&mut self, contact: Contact) {
        let _ = self.apply(Command::Add(contact));
    }

    pub fn update(&mut self, index: usize, patch: ContactPatch) -> Result<(), StoreError> {
        self.apply(Command::Update(index, patch))
    }

    pub fn delete(&mut self, index: usize) -> Result<(), StoreError> {
        self.apply(Command::Delete(index))
    }

    /// Derived view: indices of contacts whose company contains the query,
    /// case-insensitively. A blank query yields every index in order.
    pub fn filtered(&self, query: &str) -> Vec<usize> {
        match search::normalize_query(query) {
            None => (0..self.contacts.len()).collect(),
            Some(needle) => self
                .contacts
                .iter()
                .enumerate()
                .filter(|(_, c)| search::company_matches(&c.company, &needle))
                .map(|(i, _)| i)
                .collect(),
        }
    }
}
