use super::{Directory, Fixture, RecordStore};
use crate::models::{Lead, Prospect, Sale, User, Visit};

/// One store per screen, built from a [`Fixture`].
#[derive(Debug, Clone, Default)]
pub struct CrmData {
    pub users: RecordStore<User>,
    pub prospects: RecordStore<Prospect>,
    pub leads: RecordStore<Lead>,
    pub visits: RecordStore<Visit>,
    pub sales: RecordStore<Sale>,
}

impl CrmData {
    pub fn from_fixture(fixture: Fixture) -> Self {
        Self {
            users: RecordStore::from_records(fixture.users),
            prospects: RecordStore::from_records(fixture.prospects),
            leads: RecordStore::from_records(fixture.leads),
            visits: RecordStore::from_records(fixture.visits),
            sales: RecordStore::from_records(fixture.sales),
        }
    }

    pub fn to_fixture(&self) -> Fixture {
        Fixture {
            users: self.users.records().to_vec(),
            prospects: self.prospects.records().to_vec(),
            leads: self.leads.records().to_vec(),
            visits: self.visits.records().to_vec(),
            sales: self.sales.records().to_vec(),
        }
    }

    /// Fresh user index; rebuild after editing users
    pub fn directory(&self) -> Directory {
        Directory::new(self.users.records())
    }
}
