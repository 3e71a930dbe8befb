use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::appointment::{Appointment, AppointmentDraft, DateKey};
use crate::storage::StoragePort;

pub const APPOINTMENTS_KEY: &str = "appointments";
pub const DEMO_SEEDED_KEY: &str = "demo-seeded";

/// The appointment book: a date-key → appointment-list mapping hydrated from
/// the storage port at open and written back in full after every mutation.
/// A key never maps to an empty list.
#[derive(Debug)]
pub struct AppointmentBook<S: StoragePort> {
    storage: S,
    by_day: BTreeMap<DateKey, Vec<Appointment>>,
}

impl<S: StoragePort> AppointmentBook<S> {
    /// Hydrates the book. An absent or malformed payload yields an empty
    /// book; it is never an error.
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: S) -> anyhow::Result<Self> {
        let by_day = match storage.get(APPOINTMENTS_KEY)? {
            None => BTreeMap::new(),
            Some(raw) => match serde_json::from_str::<BTreeMap<DateKey, Vec<Appointment>>>(&raw) {
                Ok(mut parsed) => {
                    parsed.retain(|_, list| !list.is_empty());
                    parsed
                }
                Err(err) => {
                    warn!(error = %err, "malformed appointment payload; starting empty");
                    BTreeMap::new()
                }
            },
        };

        info!(days = by_day.len(), "opened appointment book");
        Ok(Self { storage, by_day })
    }

    pub fn appointments_on(&self, day: NaiveDate) -> &[Appointment] {
        self.by_day
            .get(&DateKey::from(day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn days(&self) -> impl Iterator<Item = &DateKey> {
        self.by_day.keys()
    }

    pub fn len(&self) -> usize {
        self.by_day.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }

    /// Appends a validated draft to the day's list, creating the list if
    /// absent, and persists.
    #[tracing::instrument(skip(self, draft))]
    pub fn add(&mut self, day: NaiveDate, draft: AppointmentDraft) -> anyhow::Result<Appointment> {
        let appointment = Appointment::new(draft);
        self.by_day
            .entry(DateKey::from(day))
            .or_default()
            .push(appointment.clone());
        self.save()?;

        debug!(id = %appointment.id, "appointment added");
        Ok(appointment)
    }

    /// Removes the appointment with `id` from the day's list. Returns
    /// `None` when the day or id is unknown; the book is untouched then.
    /// Removing the last entry of a day drops the key entirely.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, day: NaiveDate, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        let key = DateKey::from(day);
        let Some(list) = self.by_day.get_mut(&key) else {
            debug!("no appointments on that day");
            return Ok(None);
        };
        let Some(index) = list.iter().position(|entry| entry.id == id) else {
            debug!("appointment not found on that day");
            return Ok(None);
        };

        let removed = list.remove(index);
        if list.is_empty() {
            self.by_day.remove(&key);
        }
        self.save()?;

        debug!("appointment removed");
        Ok(Some(removed))
    }

    /// Drag-and-drop reassignment: takes the appointment with `id` out of
    /// `from` and inserts it at `target_index` (clamped to the list length)
    /// in `to`. An unknown source day or id is a logged no-op. Same-day
    /// moves reorder within one list.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn move_appointment(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        id: Uuid,
        target_index: usize,
    ) -> anyhow::Result<Option<Appointment>> {
        let from_key = DateKey::from(from);
        let appointment = match self.by_day.get_mut(&from_key) {
            None => {
                warn!("source day has no appointments; move ignored");
                return Ok(None);
            }
            Some(list) => match list.iter().position(|entry| entry.id == id) {
                None => {
                    warn!("appointment not found in source day; move ignored");
                    return Ok(None);
                }
                Some(index) => {
                    let appointment = list.remove(index);
                    if list.is_empty() {
                        self.by_day.remove(&from_key);
                    }
                    appointment
                }
            },
        };

        let target = self.by_day.entry(DateKey::from(to)).or_default();
        let index = target_index.min(target.len());
        target.insert(index, appointment.clone());
        self.save()?;

        debug!(index, "appointment moved");
        Ok(Some(appointment))
    }

    /// One-time demo data, tracked by a persisted flag so it survives
    /// restarts and never re-seeds regardless of the book's contents.
    /// Returns whether anything was inserted.
    #[tracing::instrument(skip(self))]
    pub fn seed_demo(&mut self, today: NaiveDate) -> anyhow::Result<bool> {
        if self.storage.get(DEMO_SEEDED_KEY)?.is_some() {
            debug!("demo appointments already seeded");
            return Ok(false);
        }

        let demo = [
            (-1, "Play Tennis", "Go to the club to play tennis"),
            (1, "Meeting", "Discuss project milestones"),
            (2, "Dentist Appointment", "Checkup"),
            (3, "Lunch with Alice", "Catch up with Alice"),
        ];
        for (offset, title, description) in demo {
            let day = today + Duration::days(offset);
            let draft = AppointmentDraft::new(title, description)?;
            self.by_day
                .entry(DateKey::from(day))
                .or_default()
                .push(Appointment::new(draft));
        }

        self.save()?;
        self.storage.set(DEMO_SEEDED_KEY, "true")?;

        info!("seeded demo appointments");
        Ok(true)
    }

    fn save(&mut self) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string(&self.by_day).context("failed to serialize appointment book")?;
        self.storage.set(APPOINTMENTS_KEY, &payload)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{APPOINTMENTS_KEY, AppointmentBook};
    use crate::appointment::AppointmentDraft;
    use crate::storage::{MemoryStorage, StoragePort};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn draft(title: &str) -> AppointmentDraft {
        AppointmentDraft::new(title, "").expect("valid draft")
    }

    #[test]
    fn add_persists_and_reloads() {
        let mut storage = MemoryStorage::new();
        let added = {
            let mut book = AppointmentBook::open(&mut storage).expect("open");
            book.add(day(2024, 2, 14), draft("Standup")).expect("add")
        };

        let book = AppointmentBook::open(&mut storage).expect("reopen");
        let entries = book.appointments_on(day(2024, 2, 14));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, added.id);
        assert_eq!(entries[0].title, "Standup");
    }

    #[test]
    fn malformed_payload_yields_empty_book() {
        let mut storage = MemoryStorage::new();
        storage.set(APPOINTMENTS_KEY, "not json at all").expect("set");

        let book = AppointmentBook::open(&mut storage).expect("open");
        assert!(book.is_empty());
    }

    #[test]
    fn removing_last_appointment_drops_the_key() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let target = day(2024, 2, 14);

        let added = book.add(target, draft("Only one")).expect("add");
        let removed = book.remove(target, added.id).expect("remove");
        assert_eq!(removed.map(|entry| entry.id), Some(added.id));

        assert!(book.is_empty());
        assert_eq!(book.days().count(), 0);
    }

    #[test]
    fn removing_one_of_several_preserves_order() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let target = day(2024, 2, 14);

        let first = book.add(target, draft("First")).expect("add");
        let second = book.add(target, draft("Second")).expect("add");
        let third = book.add(target, draft("Third")).expect("add");

        book.remove(target, second.id).expect("remove");
        let remaining: Vec<_> = book
            .appointments_on(target)
            .iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(remaining, vec![first.id, third.id]);
    }

    #[test]
    fn remove_of_unknown_id_is_a_noop() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let target = day(2024, 2, 14);

        let added = book.add(target, draft("Keep me")).expect("add");
        let gone = book
            .remove(target, uuid::Uuid::new_v4())
            .expect("remove call");
        assert!(gone.is_none());

        let elsewhere = book.remove(day(2024, 2, 15), added.id).expect("remove call");
        assert!(elsewhere.is_none());
        assert_eq!(book.appointments_on(target).len(), 1);
    }

    #[test]
    fn move_reassigns_between_days_and_clamps_index() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let source = day(2024, 2, 14);
        let dest = day(2024, 2, 20);

        let moved = book.add(source, draft("Moving")).expect("add");
        let anchor = book.add(dest, draft("Anchor")).expect("add");

        book.move_appointment(source, dest, moved.id, 99)
            .expect("move call")
            .expect("found");

        assert!(book.appointments_on(source).is_empty());
        assert_eq!(book.days().count(), 1);
        let entries = book.appointments_on(dest);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, anchor.id);
        assert_eq!(entries[1].id, moved.id);
    }

    #[test]
    fn move_distinguishes_identical_content_by_id() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let source = day(2024, 2, 14);
        let dest = day(2024, 2, 15);

        let twin_a = book.add(source, draft("Twin")).expect("add");
        let twin_b = book.add(source, draft("Twin")).expect("add");

        book.move_appointment(source, dest, twin_b.id, 0)
            .expect("move call")
            .expect("found");

        assert_eq!(book.appointments_on(source)[0].id, twin_a.id);
        assert_eq!(book.appointments_on(dest)[0].id, twin_b.id);
    }

    #[test]
    fn same_day_move_reorders_in_place() {
        let mut storage = MemoryStorage::new();
        let mut book = AppointmentBook::open(&mut storage).expect("open");
        let target = day(2024, 2, 14);

        let first = book.add(target, draft("First")).expect("add");
        let second = book.add(target, draft("Second")).expect("add");

        book.move_appointment(target, target, second.id, 0)
            .expect("move call")
            .expect("found");

        let order: Vec<_> = book
            .appointments_on(target)
            .iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(order, vec![second.id, first.id]);
    }

    #[test]
    fn demo_seed_is_idempotent_across_reopens() {
        let mut storage = MemoryStorage::new();
        let today = day(2024, 2, 14);

        {
            let mut book = AppointmentBook::open(&mut storage).expect("open");
            assert!(book.seed_demo(today).expect("seed"));
            assert_eq!(book.len(), 4);
            assert_eq!(book.appointments_on(day(2024, 2, 13)).len(), 1);
            assert_eq!(book.appointments_on(day(2024, 2, 15)).len(), 1);
            assert_eq!(book.appointments_on(day(2024, 2, 16)).len(), 1);
            assert_eq!(book.appointments_on(day(2024, 2, 17)).len(), 1);
        }

        let mut book = AppointmentBook::open(&mut storage).expect("reopen");
        assert!(!book.seed_demo(today).expect("second seed"));
        assert_eq!(book.len(), 4);
    }
}
