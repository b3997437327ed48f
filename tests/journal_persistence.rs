use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use catalog_arena::arena::Arena;
use catalog_arena::catalog::journal::{load_events, CatalogEvent, JournalWriter};
use catalog_arena::catalog::{Attributes, CatalogStore, InMemoryCatalog, StatsDelta};
use catalog_arena::error::ArenaError;
use rand::rngs::mock::StepRng;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "catalog_arena_{}_{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn oats() -> Attributes {
    Attributes::Ingredient {
        energy: 389.0,
        protein: 16.9,
        carbohydrates: 66.3,
        fat: 6.9,
        fiber: 10.6,
    }
}

fn deadlift() -> Attributes {
    Attributes::Exercise {
        weight: 140.0,
        sets: 3,
        repetitions: 5,
        rpe: 9.0,
    }
}

#[test]
fn journal_writes_one_json_line_per_mutation() {
    let dir = temp_dir("lines");
    let path = dir.join("catalog.jsonl");

    let catalog = InMemoryCatalog::open(&path).expect("open journal");
    let a = catalog.create("Oats", oats()).expect("create").id;
    let b = catalog.create("Deadlift", deadlift()).expect("create").id;
    catalog
        .commit_stats(&[
            StatsDelta { id: a, wins: 1, losses: 0 },
            StatsDelta { id: b, wins: 0, losses: 1 },
        ])
        .expect("commit");
    catalog.soft_delete(b).expect("delete");
    catalog.close();

    let mut contents = String::new();
    std::fs::File::open(&path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents.lines().count(), 4);

    let events = load_events(&path).expect("parse journal");
    assert!(matches!(events[0], CatalogEvent::Created(ref e) if e.name == "Oats"));
    assert!(matches!(events[2], CatalogEvent::Stats { ref deltas } if deltas.len() == 2));
    assert_eq!(events[3], CatalogEvent::Deleted { id: b });

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn reopening_replays_entries_counters_and_deletions() {
    let dir = temp_dir("replay");
    let path = dir.join("catalog.jsonl");

    let (a, b) = {
        let catalog = InMemoryCatalog::open(&path).expect("open journal");
        let a = catalog.create("Oats", oats()).expect("create").id;
        let b = catalog.create("Deadlift", deadlift()).expect("create").id;
        catalog
            .commit_stats(&[
                StatsDelta { id: a, wins: 2, losses: 1 },
                StatsDelta { id: b, wins: 1, losses: 2 },
            ])
            .expect("commit");
        catalog.soft_delete(b).expect("delete");
        (a, b)
        // dropped here, which closes the journal
    };

    let reopened = InMemoryCatalog::open(&path).expect("reopen journal");
    let oats_entry = reopened.get(a).expect("oats survives");
    assert_eq!(oats_entry.attributes, oats());
    assert_eq!((oats_entry.wins, oats_entry.losses), (2, 1));

    let deadlift_entry = reopened.get(b).expect("deleted entries are kept");
    assert!(deadlift_entry.deleted);
    assert_eq!((deadlift_entry.wins, deadlift_entry.losses), (1, 2));
    assert_eq!(reopened.list(false).expect("list").len(), 1);

    // ids keep counting from where the journal left off
    let next = reopened.create("Rice", oats()).expect("create").id;
    assert_eq!(next, b + 1);
    // the deleted name is free again
    reopened.create("Deadlift", deadlift()).expect("reuse name");
    reopened.close();

    let third = InMemoryCatalog::open(&path).expect("reopen again");
    assert_eq!(third.list(true).expect("list").len(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_journal_is_reported() {
    let dir = temp_dir("corrupt");
    let path = dir.join("catalog.jsonl");
    std::fs::write(&path, "{\"event\":\"Deleted\",\"id\":1}\nnot json\n").unwrap();

    let result = InMemoryCatalog::open(&path);
    assert!(matches!(result, Err(ArenaError::Persistence(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

/// In-memory journal sink whose writes fail while `broken` is set.
#[derive(Clone, Default)]
struct SwitchableSink {
    broken: Arc<AtomicBool>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl SwitchableSink {
    fn events(&self) -> Vec<CatalogEvent> {
        let bytes = self.written.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("valid journal line"))
            .collect()
    }
}

impl Write for SwitchableSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_journal_write_rejects_the_mutation() {
    let sink = SwitchableSink::default();
    let catalog = InMemoryCatalog::with_journal(JournalWriter::from_sink(sink.clone()));
    let a = catalog.create("Oats", oats()).expect("create").id;
    let b = catalog.create("Deadlift", deadlift()).expect("create").id;

    sink.broken.store(true, Ordering::SeqCst);
    let result = catalog.commit_stats(&[
        StatsDelta { id: a, wins: 1, losses: 0 },
        StatsDelta { id: b, wins: 0, losses: 1 },
    ]);
    assert!(matches!(result, Err(ArenaError::Persistence(_))));
    for id in [a, b] {
        let entry = catalog.get(id).expect("get");
        assert_eq!((entry.wins, entry.losses), (0, 0));
    }
    assert!(matches!(catalog.soft_delete(b), Err(ArenaError::Persistence(_))));
    assert!(!catalog.get(b).expect("get").deleted);
    assert!(matches!(
        catalog.create("Rice", oats()),
        Err(ArenaError::Persistence(_))
    ));
    assert!(catalog.find_by_name("Rice").is_err());

    sink.broken.store(false, Ordering::SeqCst);
    catalog
        .commit_stats(&[StatsDelta { id: a, wins: 1, losses: 0 }])
        .expect("commit once the disk is back");
    assert_eq!(catalog.get(a).expect("get").wins, 1);

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[2], CatalogEvent::Stats { ref deltas } if deltas.len() == 1));
    catalog.close();
}

#[test]
fn battle_survives_a_journal_outage_through_retry() {
    let sink = SwitchableSink::default();
    let catalog = Arc::new(InMemoryCatalog::with_journal(JournalWriter::from_sink(
        sink.clone(),
    )));
    let first = catalog.create("Deadlift", deadlift()).expect("create").id;
    let second = catalog.create("Oats", oats()).expect("create").id;
    let store: Arc<dyn CatalogStore> = catalog.clone();
    // a zero draw always goes to the first staged combatant
    let arena = Arena::with_rng(store, StepRng::new(0, 0));
    arena.add_combatant(first).expect("stage");
    arena.add_combatant(second).expect("stage");

    sink.broken.store(true, Ordering::SeqCst);
    assert!(matches!(arena.battle(), Err(ArenaError::Persistence(_))));
    assert_eq!(arena.combatants(), vec![first, second]);
    assert_eq!(catalog.get(first).expect("get").wins, 0);
    assert!(arena.pending_commit().is_some());

    sink.broken.store(false, Ordering::SeqCst);
    let report = arena.retry_commit().expect("retry");
    assert_eq!(report.outcome.winner, first);
    assert_eq!(arena.combatants(), vec![first]);
    assert_eq!(catalog.get(first).expect("get").wins, 1);
    assert_eq!(catalog.get(second).expect("get").losses, 1);
    assert_eq!(sink.events().len(), 3);
}

#[test]
fn closed_journal_refuses_further_writes() {
    let sink = SwitchableSink::default();
    let catalog = InMemoryCatalog::with_journal(JournalWriter::from_sink(sink.clone()));
    catalog.create("Oats", oats()).expect("create");
    catalog.close();
    assert!(matches!(
        catalog.create("Rice", oats()),
        Err(ArenaError::Persistence(_))
    ));
    assert_eq!(catalog.list(true).expect("list").len(), 1);
}
