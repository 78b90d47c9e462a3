use dugout_game::constants::{CAREER_STATS_KEY, TEAM_RECORDS_KEY};
use dugout_game::records::{load_career_stats, load_team_records};
use dugout_game::{
    CareerStats, GameEngine, KeyValueStore, MemoryStore, NullSink, RosterBook, SimConfig,
    StoreError, TeamRecords,
};
use serde_json::Value;
use std::collections::HashMap;

/// Store that round-trips every value through its JSON text, like a file would.
#[derive(Default)]
struct TextStore {
    files: HashMap<String, String>,
}

impl KeyValueStore for TextStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.files
            .get(key)
            .map(|text| serde_json::from_str(text).map_err(StoreError::from))
            .transpose()
    }

    fn save(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.files.insert(key.to_string(), serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.files.clear();
        Ok(())
    }
}

fn engine<S: KeyValueStore>(store: S) -> GameEngine<&'static RosterBook, S> {
    GameEngine::new(RosterBook::builtin(), store, SimConfig::default_config().clone())
}

#[test]
fn records_survive_a_text_round_trip() {
    let mut first = engine(TextStore::default());
    first.simulate_series("NYY", "LAD", 3, 5, &mut NullSink);
    let records: TeamRecords = first.team_records();
    let career: CareerStats = first.career_stats();

    let files = std::mem::take(&mut first.store_mut().files);
    let second = engine(TextStore { files });
    assert_eq!(second.team_records(), records);
    assert_eq!(second.career_stats(), career);
    assert_eq!(records["NYY"].starter_index, 3);
    assert_eq!(records["NYY"].name, "Yankees");
}

#[test]
fn corrupt_records_fall_back_to_empty_and_get_rewritten() {
    let mut store = MemoryStore::new();
    store
        .save(TEAM_RECORDS_KEY, Value::String("garbage".to_string()))
        .expect("save");
    store
        .save(CAREER_STATS_KEY, serde_json::json!([1, 2, 3]))
        .expect("save");
    assert!(load_team_records(&store).is_empty());
    assert!(load_career_stats(&store).is_empty());

    let mut engine = engine(store);
    engine.play_game("NYY", "LAD", 12, &mut NullSink).expect("game");
    let records = engine.team_records();
    assert_eq!(records["NYY"].wins + records["NYY"].losses, 1);
}

#[test]
fn older_records_without_new_fields_still_load() {
    let mut store = MemoryStore::new();
    store
        .save(
            TEAM_RECORDS_KEY,
            serde_json::json!({ "NYY": { "name": "Yankees", "wins": 4 } }),
        )
        .expect("save");
    store
        .save(
            CAREER_STATS_KEY,
            serde_json::json!({ "NYY": { "Aaron Judge": { "hits": 10, "at_bats": 30 } } }),
        )
        .expect("save");
    let records = load_team_records(&store);
    assert_eq!(records["NYY"].wins, 4);
    assert_eq!(records["NYY"].losses, 0);
    assert_eq!(records["NYY"].starter_index, 0);
    let career = load_career_stats(&store);
    let judge = career["NYY"]["Aaron Judge"];
    assert_eq!(judge.rbi, 0);
    assert!((judge.average() - 1.0 / 3.0).abs() < 1e-9);
}
