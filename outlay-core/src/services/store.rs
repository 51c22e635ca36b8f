//! Expense store - the active user's collection, persisted write-through
//!
//! The store is the only writer of `expenses_<userId>` keys and the only
//! source of snapshots. Every successful mutation is persisted first, then
//! swapped into memory, then broadcast synchronously to subscribers in
//! registration order.
//!
//! Each user's latest collection is also mirrored in memory, so rebinding
//! keeps working without durable storage. A user whose stored blob cannot be
//! parsed is quarantined: their blob is never overwritten, while other users
//! keep persisting normally.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Expense, ExpenseId, NewExpense, Snapshot, UserId};
use crate::ports::{KeyValueStore, SessionProvider};
use crate::services::transfer;

const STORAGE_KEY_PREFIX: &str = "expenses_";

/// Persistence key holding a user's collection
pub fn storage_key(user_id: UserId) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, user_id)
}

/// Handle returned by [`ExpenseStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Snapshot)>;

/// Owner of the active expense collection
pub struct ExpenseStore {
    storage: Option<Arc<dyn KeyValueStore>>,
    mirror: HashMap<UserId, Vec<Expense>>,
    quarantined: HashSet<UserId>,
    bound: Option<UserId>,
    current: Snapshot,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl ExpenseStore {
    /// Create an unbound store. `None` storage means memory-only from the start.
    pub fn new(storage: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self {
            storage,
            mirror: HashMap::new(),
            quarantined: HashSet::new(),
            bound: None,
            current: Snapshot::unbound(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn memory_only() -> Self {
        Self::new(None)
    }

    /// Whether mutations still reach durable storage
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// Whether mutations of the bound collection reach durable storage
    pub fn saves_bound(&self) -> bool {
        self.is_persistent() && self.bound.map_or(false, |id| !self.is_quarantined(id))
    }

    /// Whether `user_id`'s stored blob was unreadable and is being left alone
    pub fn is_quarantined(&self, user_id: UserId) -> bool {
        self.quarantined.contains(&user_id)
    }

    /// The user whose collection is active
    pub fn bound_user(&self) -> Option<UserId> {
        self.bound
    }

    // === Session ===

    /// Create an empty persisted collection for a user who has none.
    ///
    /// Returns `true` if a collection was created; existing data is never touched.
    pub fn initialize(&mut self, user_id: UserId) -> bool {
        let Some(storage) = self.storage.clone() else {
            return false;
        };
        let key = storage_key(user_id);

        let created = match storage.get(&key) {
            Ok(Some(_)) => Ok(false),
            Ok(None) => storage.set(&key, "[]").map(|_| true),
            Err(e) => Err(e),
        };

        match created {
            Ok(created) => {
                if created {
                    tracing::info!(user_id = %user_id, "initialized empty expense collection");
                }
                created
            }
            Err(e) => {
                self.degrade(&e);
                false
            }
        }
    }

    /// Switch the active collection to `user_id`, or clear it when `None`.
    ///
    /// The previous collection is fully replaced before the new snapshot is
    /// broadcast; no mix of two users' records is ever observable.
    pub fn bind(&mut self, user_id: Option<UserId>) {
        let expenses = match user_id {
            Some(id) => self.load(id),
            None => Vec::new(),
        };

        match (self.bound, user_id) {
            (_, Some(id)) => tracing::info!(user_id = %id, count = expenses.len(), "bound expense store"),
            (Some(prev), None) => tracing::info!(user_id = %prev, "unbound expense store"),
            (None, None) => tracing::debug!("expense store already unbound"),
        }

        self.bound = user_id;
        self.publish(expenses);
    }

    /// Rebind if the session's active user differs from the bound one.
    ///
    /// Returns `true` when a rebind happened.
    pub fn sync_session(&mut self, session: &dyn SessionProvider) -> bool {
        let active = session.active_user_id();
        if active == self.bound {
            return false;
        }
        self.bind(active);
        true
    }

    // === Observation ===

    /// The latest snapshot (empty while unbound)
    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    /// Register a callback for every future snapshot.
    ///
    /// The callback is invoked immediately with the current snapshot.
    pub fn subscribe(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let mut subscriber: Subscriber = Box::new(callback);
        notify(id, &mut subscriber, &self.current);
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    // === Reads ===

    pub fn get_by_id(&self, id: ExpenseId) -> Result<Option<Expense>> {
        self.require_bound()?;
        Ok(self.current.get(id).cloned())
    }

    /// Distinct categories in first-seen order
    pub fn categories_in_use(&self) -> Result<Vec<String>> {
        self.require_bound()?;
        let mut categories: Vec<String> = Vec::new();
        for expense in self.current.iter() {
            if !categories.contains(&expense.category) {
                categories.push(expense.category.clone());
            }
        }
        Ok(categories)
    }

    // === Mutations ===

    /// Insert a new expense with id `max(existing) + 1`, or 1 when empty.
    ///
    /// Fails without changing anything once the largest id is `i64::MAX`.
    pub fn add(&mut self, new_expense: NewExpense) -> Result<Expense> {
        let user_id = self.require_bound()?;

        let id = match self.current.iter().map(|e| e.id).max() {
            None => 1,
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| Error::validation("no expense ids left after the largest existing id"))?,
        };
        let expense = new_expense.with_id(id);

        let mut next = self.current.to_vec();
        next.push(expense.clone());
        self.commit(user_id, next);

        tracing::debug!(user_id = %user_id, expense_id = id, "added expense");
        Ok(expense)
    }

    /// Replace the expense with the same id in place.
    ///
    /// Returns `None` without persisting or broadcasting if the id is unknown.
    pub fn update(&mut self, expense: Expense) -> Result<Option<Expense>> {
        let user_id = self.require_bound()?;

        let Some(index) = self.current.iter().position(|e| e.id == expense.id) else {
            return Ok(None);
        };

        let mut next = self.current.to_vec();
        next[index] = expense.clone();
        self.commit(user_id, next);

        tracing::debug!(user_id = %user_id, expense_id = expense.id, "updated expense");
        Ok(Some(expense))
    }

    /// Remove an expense; returns whether anything was removed.
    ///
    /// Removing an unknown id neither persists nor broadcasts.
    pub fn delete(&mut self, id: ExpenseId) -> Result<bool> {
        let user_id = self.require_bound()?;

        if self.current.get(id).is_none() {
            return Ok(false);
        }

        let next: Vec<Expense> = self.current.iter().filter(|e| e.id != id).cloned().collect();
        self.commit(user_id, next);

        tracing::debug!(user_id = %user_id, expense_id = id, "deleted expense");
        Ok(true)
    }

    /// Replace the whole collection; caller-supplied ids stay authoritative.
    ///
    /// Duplicate ids are rejected before anything changes. Returns whether the
    /// new collection reached durable storage.
    pub fn import_all(&mut self, expenses: Vec<Expense>) -> Result<bool> {
        let user_id = self.require_bound()?;
        transfer::ensure_unique_ids(&expenses)?;

        let count = expenses.len();
        let persisted = self.commit(user_id, expenses);
        tracing::info!(user_id = %user_id, count, persisted, "imported expenses");
        Ok(persisted)
    }

    /// Validate an exported JSON payload and import it atomically
    pub fn import_json(&mut self, payload: &str) -> Result<bool> {
        self.require_bound()?;
        let expenses = transfer::parse_import(payload)?;
        self.import_all(expenses)
    }

    // === Internals ===

    fn require_bound(&self) -> Result<UserId> {
        self.bound.ok_or(Error::NotBound)
    }

    fn load(&mut self, user_id: UserId) -> Vec<Expense> {
        let mirrored = self.mirror.get(&user_id).cloned().unwrap_or_default();
        let Some(storage) = self.storage.clone() else {
            return mirrored;
        };
        if self.quarantined.contains(&user_id) {
            return mirrored;
        }

        match storage.get(&storage_key(user_id)) {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Expense>>(&raw) {
                Ok(expenses) => {
                    self.mirror.insert(user_id, expenses.clone());
                    expenses
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %user_id,
                        "stored expenses are unreadable, leaving them untouched: {}",
                        e
                    );
                    self.quarantined.insert(user_id);
                    mirrored
                }
            },
            Err(e) => {
                self.degrade(&e);
                mirrored
            }
        }
    }

    /// Persist, swap in, broadcast. Returns whether the write reached storage.
    fn commit(&mut self, user_id: UserId, expenses: Vec<Expense>) -> bool {
        let persisted = self.persist(user_id, &expenses);
        self.mirror.insert(user_id, expenses.clone());
        self.publish(expenses);
        persisted
    }

    fn persist(&mut self, user_id: UserId, expenses: &[Expense]) -> bool {
        let Some(storage) = self.storage.clone() else {
            return false;
        };
        if self.quarantined.contains(&user_id) {
            tracing::debug!(user_id = %user_id, "skipping write for quarantined collection");
            return false;
        }

        let written = serde_json::to_string(expenses)
            .map_err(Error::from)
            .and_then(|payload| storage.set(&storage_key(user_id), &payload));

        match written {
            Ok(()) => true,
            Err(e) => {
                self.degrade(&e);
                false
            }
        }
    }

    fn degrade(&mut self, error: &Error) {
        if self.storage.take().is_some() {
            tracing::warn!("continuing in memory-only mode: {}", error);
        }
    }

    fn publish(&mut self, expenses: Vec<Expense>) {
        self.current = Snapshot::new(self.bound, expenses);
        tracing::debug!(
            count = self.current.len(),
            subscribers = self.subscribers.len(),
            "broadcasting snapshot"
        );

        let snapshot = self.current.clone();
        for (id, subscriber) in self.subscribers.iter_mut() {
            notify(*id, subscriber, &snapshot);
        }
    }
}

impl std::fmt::Debug for ExpenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseStore")
            .field("persistent", &self.is_persistent())
            .field("bound", &self.bound)
            .field("expenses", &self.current.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Run one subscriber; a panic is contained so the others still run
fn notify(id: SubscriptionId, subscriber: &mut Subscriber, snapshot: &Snapshot) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber(snapshot)));
    if outcome.is_err() {
        tracing::warn!(subscription = id.0, "subscriber panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::adapters::MemoryKeyValueStore;

    /// Memory storage that counts writes and can be switched to fail
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryKeyValueStore,
        writes: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::persistence("storage offline"));
            }
            Ok(())
        }
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.check()?;
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.check()?;
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.check()?;
            self.inner.remove(key)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_expense(description: &str, cents: i64, category: &str) -> NewExpense {
        NewExpense::new(description, Decimal::new(cents, 2), date(2024, 1, 10), category)
    }

    fn bound_store() -> (Arc<CountingStore>, ExpenseStore) {
        let storage = Arc::new(CountingStore::default());
        let mut store = ExpenseStore::new(Some(storage.clone()));
        store.bind(Some(UserId(1)));
        (storage, store)
    }

    fn recorder(store: &mut ExpenseStore) -> Rc<RefCell<Vec<Snapshot>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
        seen
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let (_, mut store) = bound_store();
        for k in 1..=3 {
            let expense = store.add(new_expense("Item", 100, "Other")).unwrap();
            assert_eq!(expense.id, k);
        }
    }

    #[test]
    fn test_ids_follow_max_after_delete() {
        let (_, mut store) = bound_store();
        for _ in 0..3 {
            store.add(new_expense("Item", 100, "Other")).unwrap();
        }

        assert!(store.delete(2).unwrap());
        assert_eq!(store.add(new_expense("Next", 100, "Other")).unwrap().id, 4);

        assert!(store.delete(4).unwrap());
        assert_eq!(store.add(new_expense("Reuse max", 100, "Other")).unwrap().id, 4);
    }

    #[test]
    fn test_add_then_get_by_id() {
        let (storage, mut store) = bound_store();
        let added = store
            .add(NewExpense::new("Coffee", Decimal::new(45, 1), date(2024, 1, 10), "Food"))
            .unwrap();

        let fetched = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(fetched, added);
        assert_eq!(fetched.amount, Decimal::new(45, 1));

        let raw = storage.get("expenses_1").unwrap().unwrap();
        let persisted: Vec<Expense> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec![added]);
    }

    #[test]
    fn test_unbound_store_rejects_operations() {
        let mut store = ExpenseStore::memory_only();
        assert!(matches!(store.add(new_expense("x", 1, "y")), Err(Error::NotBound)));
        assert!(matches!(store.delete(1), Err(Error::NotBound)));
        assert!(matches!(store.get_by_id(1), Err(Error::NotBound)));
        assert!(matches!(store.categories_in_use(), Err(Error::NotBound)));
        assert!(matches!(store.import_all(Vec::new()), Err(Error::NotBound)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_update_replaces_in_place() {
        let (_, mut store) = bound_store();
        store.add(new_expense("First", 100, "Food")).unwrap();
        store.add(new_expense("Second", 200, "Food")).unwrap();

        let mut changed = store.get_by_id(1).unwrap().unwrap();
        changed.description = "First, edited".to_string();
        changed.category = "Travel".to_string();

        let result = store.update(changed.clone()).unwrap();
        assert_eq!(result, Some(changed.clone()));

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0], changed);
        assert_eq!(snapshot[1].description, "Second");
    }

    #[test]
    fn test_update_unknown_id_is_silent() {
        let (storage, mut store) = bound_store();
        store.add(new_expense("Only", 100, "Food")).unwrap();
        let seen = recorder(&mut store);
        let writes_before = storage.writes();

        let ghost = Expense::new(99, "Ghost", Decimal::ONE, date(2024, 1, 1), "Other");
        assert_eq!(store.update(ghost).unwrap(), None);

        assert_eq!(storage.writes(), writes_before);
        assert_eq!(seen.borrow().len(), 1, "only the replay on subscribe");
    }

    #[test]
    fn test_delete_unknown_id_neither_persists_nor_broadcasts() {
        let (storage, mut store) = bound_store();
        store.add(new_expense("Keep", 100, "Food")).unwrap();
        let seen = recorder(&mut store);
        let writes_before = storage.writes();
        let before = store.snapshot();

        assert!(!store.delete(99).unwrap());

        assert_eq!(store.snapshot(), before);
        assert_eq!(storage.writes(), writes_before);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_subscribe_replays_current_snapshot() {
        let (_, mut store) = bound_store();
        store.add(new_expense("Before", 100, "Food")).unwrap();

        let seen = recorder(&mut store);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].len(), 1);

        store.add(new_expense("After", 100, "Food")).unwrap();
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].len(), 2);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let (_, mut store) = bound_store();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = order.clone();
            store.subscribe(move |_| order.borrow_mut().push(name));
        }
        order.borrow_mut().clear();

        store.add(new_expense("Tick", 100, "Food")).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let (_, mut store) = bound_store();
        let armed = Rc::new(RefCell::new(false));
        let trigger = armed.clone();
        store.subscribe(move |_| {
            if *trigger.borrow() {
                panic!("subscriber failure");
            }
        });
        let seen = recorder(&mut store);
        *armed.borrow_mut() = true;

        store.add(new_expense("Still delivered", 100, "Food")).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (_, mut store) = bound_store();
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add(new_expense("Unseen", 100, "Food")).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unbind_clears_and_broadcasts_empty() {
        let (_, mut store) = bound_store();
        store.add(new_expense("Mine", 100, "Food")).unwrap();
        let seen = recorder(&mut store);

        store.bind(None);

        assert!(store.snapshot().is_empty());
        assert_eq!(store.bound_user(), None);
        let last = seen.borrow().last().cloned().unwrap();
        assert!(last.is_empty());
        assert_eq!(last.user_id(), None);
    }

    #[test]
    fn test_rebind_isolates_users() {
        let (_, mut store) = bound_store();
        for i in 0..3 {
            store.add(new_expense(&format!("A{}", i), 100, "Food")).unwrap();
        }

        store.bind(Some(UserId(2)));
        assert!(store.snapshot().is_empty());
        assert_eq!(store.add(new_expense("B0", 500, "Travel")).unwrap().id, 1);

        store.bind(Some(UserId(1)));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|e| e.description.starts_with('A')));
        assert_eq!(snapshot.user_id(), Some(UserId(1)));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let storage = Arc::new(CountingStore::default());
        let mut store = ExpenseStore::new(Some(storage.clone()));

        assert!(store.initialize(UserId(5)));
        store.bind(Some(UserId(5)));
        store.add(new_expense("Existing", 100, "Food")).unwrap();

        assert!(!store.initialize(UserId(5)));
        store.bind(Some(UserId(5)));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_categories_in_use_first_seen_order() {
        let (_, mut store) = bound_store();
        store.add(new_expense("a", 100, "Travel")).unwrap();
        store.add(new_expense("b", 100, "Food")).unwrap();
        store.add(new_expense("c", 100, "Travel")).unwrap();

        assert_eq!(store.categories_in_use().unwrap(), vec!["Travel", "Food"]);
    }

    #[test]
    fn test_import_keeps_ids_and_next_add_respects_them() {
        let (_, mut store) = bound_store();
        store.add(new_expense("Replaced", 100, "Food")).unwrap();

        let imported = vec![
            Expense::new(10, "Ten", Decimal::new(10, 0), date(2024, 2, 1), "Food"),
            Expense::new(3, "Three", Decimal::new(3, 0), date(2024, 2, 2), "Food"),
        ];
        assert!(store.import_all(imported.clone()).unwrap());
        assert_eq!(store.snapshot().to_vec(), imported);

        assert_eq!(store.add(new_expense("Next", 100, "Food")).unwrap().id, 11);
    }

    #[test]
    fn test_import_with_duplicate_ids_changes_nothing() {
        let (storage, mut store) = bound_store();
        store.add(new_expense("Original", 100, "Food")).unwrap();
        let writes_before = storage.writes();

        let dupes = vec![
            Expense::new(1, "One", Decimal::ONE, date(2024, 2, 1), "Food"),
            Expense::new(1, "Also one", Decimal::ONE, date(2024, 2, 1), "Food"),
        ];
        assert!(matches!(store.import_all(dupes), Err(Error::InvalidImportShape(_))));
        assert_eq!(store.snapshot()[0].description, "Original");
        assert_eq!(storage.writes(), writes_before);
    }

    #[test]
    fn test_write_failure_degrades_to_memory_only() {
        let (storage, mut store) = bound_store();
        assert!(store.is_persistent());
        storage.fail();

        let expense = store.add(new_expense("Offline", 100, "Food")).unwrap();
        assert_eq!(expense.id, 1);
        assert!(!store.is_persistent());
        assert_eq!(store.snapshot().len(), 1);

        store.add(new_expense("Still offline", 100, "Food")).unwrap();
        assert_eq!(store.snapshot().len(), 2);
        assert!(!store.import_all(Vec::new()).unwrap());
    }

    #[test]
    fn test_corrupt_blob_is_left_untouched() {
        let storage = Arc::new(CountingStore::default());
        storage.set("expenses_1", "{ not json").unwrap();
        let mut store = ExpenseStore::new(Some(storage.clone()));

        store.bind(Some(UserId(1)));
        assert!(store.snapshot().is_empty());
        assert!(store.is_quarantined(UserId(1)));
        assert!(store.is_persistent());
        assert!(!store.saves_bound());

        store.add(new_expense("Memory only", 100, "Food")).unwrap();
        assert_eq!(storage.get("expenses_1").unwrap().as_deref(), Some("{ not json"));
        assert!(!store.import_all(Vec::new()).unwrap());
        assert_eq!(storage.get("expenses_1").unwrap().as_deref(), Some("{ not json"));
    }

    #[test]
    fn test_corrupt_blob_only_affects_its_owner() {
        let storage = Arc::new(CountingStore::default());
        storage.set("expenses_1", "{ broken").unwrap();
        let valid = vec![Expense::new(1, "Valid", Decimal::new(250, 2), date(2024, 1, 5), "Food")];
        storage.set("expenses_2", &serde_json::to_string(&valid).unwrap()).unwrap();
        let mut store = ExpenseStore::new(Some(storage.clone()));

        store.bind(Some(UserId(1)));
        store.add(new_expense("Kept in memory", 100, "Food")).unwrap();
        store.bind(Some(UserId(2)));

        assert_eq!(store.snapshot().to_vec(), valid);
        assert!(store.is_persistent());
        assert!(!store.is_quarantined(UserId(2)));
        assert!(store.saves_bound());

        let added = store.add(new_expense("Persisted", 300, "Travel")).unwrap();
        let raw = storage.get("expenses_2").unwrap().unwrap();
        let persisted: Vec<Expense> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[1], added);

        store.bind(Some(UserId(1)));
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.snapshot()[0].description, "Kept in memory");
        assert_eq!(storage.get("expenses_1").unwrap().as_deref(), Some("{ broken"));
    }

    #[test]
    fn test_memory_only_rebind_keeps_each_users_collection() {
        let mut store = ExpenseStore::memory_only();

        store.bind(Some(UserId(1)));
        for i in 0..3 {
            store.add(new_expense(&format!("A{}", i), 100, "Food")).unwrap();
        }

        store.bind(Some(UserId(2)));
        assert!(store.snapshot().is_empty());
        store.add(new_expense("B0", 500, "Travel")).unwrap();

        store.bind(None);
        store.bind(Some(UserId(1)));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|e| e.description.starts_with('A')));

        store.bind(Some(UserId(2)));
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.snapshot()[0].description, "B0");
    }

    #[test]
    fn test_degraded_store_still_isolates_users() {
        let (storage, mut store) = bound_store();
        store.add(new_expense("A stored", 100, "Food")).unwrap();
        storage.fail();

        store.add(new_expense("A offline", 100, "Food")).unwrap();
        assert!(!store.is_persistent());

        store.bind(Some(UserId(2)));
        assert!(store.snapshot().is_empty());
        store.add(new_expense("B offline", 100, "Food")).unwrap();

        store.bind(Some(UserId(1)));
        let descriptions: Vec<String> = store.snapshot().iter().map(|e| e.description.clone()).collect();
        assert_eq!(descriptions, vec!["A stored", "A offline"]);
    }

    #[test]
    fn test_add_after_largest_possible_id_is_rejected() {
        let (storage, mut store) = bound_store();
        let imported = vec![Expense::new(i64::MAX, "Last", Decimal::ONE, date(2024, 1, 1), "Other")];
        store.import_all(imported.clone()).unwrap();
        let seen = recorder(&mut store);
        let writes_before = storage.writes();

        let result = store.add(new_expense("One too many", 100, "Other"));
        assert!(matches!(result, Err(Error::Validation(_))));

        assert_eq!(store.snapshot().to_vec(), imported);
        assert_eq!(storage.writes(), writes_before);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_sync_session_rebinds_only_on_change() {
        let storage = Arc::new(CountingStore::default());
        let mut store = ExpenseStore::new(Some(storage));

        assert!(!store.sync_session(&None::<UserId>));
        assert!(store.sync_session(&Some(UserId(3))));
        assert_eq!(store.bound_user(), Some(UserId(3)));
        assert!(!store.sync_session(&Some(UserId(3))));
        assert!(store.sync_session(&None::<UserId>));
        assert_eq!(store.bound_user(), None);
    }
}
