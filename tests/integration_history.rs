use tempfile::tempdir;
use typequote::action::Action;
use typequote::history::{export_csv, HistorySummary, ScoreStore, SqliteScoreStore, HISTORY_LIMIT};
use typequote::round::Round;

fn play(text: &str, typed: &str, ticks: u32, store: &mut dyn ScoreStore) {
    let mut round = Round::new(text, None).unwrap();
    let mut chars = typed.chars();

    if let Some(first) = chars.next() {
        round.apply(Action::Insert(first), store);
    }
    for _ in 0..ticks {
        round.tick(store);
    }
    for c in chars {
        round.apply(Action::Insert(c), store);
    }
    assert!(round.result().is_some());
}

#[test]
fn finished_rounds_persist_newest_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let mut store = SqliteScoreStore::open(&path, HISTORY_LIMIT).unwrap();
        play("abcde", "abcde", 60, &mut store);
        play("abcde", "abxde", 30, &mut store);
    }

    let store = SqliteScoreStore::open(&path, HISTORY_LIMIT).unwrap();
    let recent = store.recent().unwrap();

    assert_eq!(recent.len(), 2);
    assert_eq!((recent[0].wpm, recent[0].accuracy), (2, 80));
    assert_eq!((recent[1].wpm, recent[1].accuracy), (1, 100));
}

#[test]
fn history_keeps_only_last_ten_runs() {
    let dir = tempdir().unwrap();
    let mut store = SqliteScoreStore::open(dir.path().join("history.db"), HISTORY_LIMIT).unwrap();

    for _ in 0..(HISTORY_LIMIT + 3) {
        play("abcde", "abcde", 60, &mut store);
    }

    let recent = store.recent().unwrap();
    assert_eq!(recent.len(), HISTORY_LIMIT);
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));

    let summary = HistorySummary::from_records(&recent).unwrap();
    assert_eq!(summary.count, HISTORY_LIMIT);
    assert_eq!(summary.best_wpm, 1);
    assert_eq!(summary.wpm_std_dev, 0.0);
}

#[test]
fn history_exports_to_csv() {
    let dir = tempdir().unwrap();
    let mut store = SqliteScoreStore::open_in_memory(HISTORY_LIMIT).unwrap();
    play("abcde", "abcde", 60, &mut store);

    let csv_path = dir.path().join("scores.csv");
    export_csv(&store.recent().unwrap(), &csv_path).unwrap();

    let contents = std::fs::read_to_string(csv_path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.lines().nth(1).unwrap().ends_with(",1,100"));
}
