use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;

fn corpus(dir: &Path) {
    fs::create_dir_all(dir.join("input")).unwrap();
    fs::write(dir.join("input/a.txt"), "fish fish bird").unwrap();
    fs::write(dir.join("input/b.txt"), "fish bird bird").unwrap();
    fs::write(dir.join("queries.txt"), "fish\nFISHES\n\nbi\n").unwrap();
}

fn run(dir: &Path, extra: &[&str]) -> (Value, Value, Value) {
    let out = dir.join("out");
    fs::create_dir_all(&out).unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_indexer"))
        .arg("--text")
        .arg(dir.join("input"))
        .arg("--index")
        .arg(out.join("index.json"))
        .arg("--counts")
        .arg(out.join("counts.json"))
        .arg("--query")
        .arg(dir.join("queries.txt"))
        .arg("--results")
        .arg(out.join("results.json"))
        .args(extra)
        .status()
        .unwrap();
    assert!(status.success());
    let read = |name: &str| -> Value {
        serde_json::from_str(&fs::read_to_string(out.join(name)).unwrap()).unwrap()
    };
    (read("index.json"), read("counts.json"), read("results.json"))
}

#[test]
fn single_threaded_run_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    corpus(dir.path());
    let (index, counts, results) = run(dir.path(), &[]);

    let a = dir.path().join("input/a.txt").display().to_string();
    assert_eq!(index["fish"][&a], serde_json::json!([1, 2]));
    assert_eq!(counts[&a], 3);

    // "fish" and "FISHES" share a stem, "bi" only matches as a prefix
    let queries: Vec<&String> = results.as_object().unwrap().keys().collect();
    assert_eq!(queries, vec!["bi", "fish"]);
    assert_eq!(results["fish"][0]["where"], Value::String(a));
    assert_eq!(results["fish"][0]["count"], 2);
    assert_eq!(results["bi"].as_array().unwrap().len(), 2);
}

#[test]
fn threaded_run_matches_single_threaded_run() {
    let single_dir = tempfile::tempdir().unwrap();
    corpus(single_dir.path());
    let threaded_dir = tempfile::tempdir().unwrap();
    corpus(threaded_dir.path());

    let (_, single_counts, single_results) = run(single_dir.path(), &[]);
    let (_, threaded_counts, threaded_results) = run(threaded_dir.path(), &["--threads", "3"]);

    let values = |v: &Value| -> Vec<Value> { v.as_object().unwrap().values().cloned().collect() };
    assert_eq!(values(&single_counts), values(&threaded_counts));
    assert_eq!(single_results["fish"][0]["score"], threaded_results["fish"][0]["score"]);
    assert_eq!(single_results["bi"][1]["count"], threaded_results["bi"][1]["count"]);
}

#[test]
fn exact_flag_disables_prefix_matching() {
    let dir = tempfile::tempdir().unwrap();
    corpus(dir.path());
    let (_, _, results) = run(dir.path(), &["--exact"]);
    assert!(results["bi"].as_array().unwrap().is_empty());
    assert_eq!(results["fish"].as_array().unwrap().len(), 2);
}

#[test]
fn failed_step_is_logged_once_and_later_steps_run() {
    let dir = tempfile::tempdir().unwrap();
    let counts = dir.path().join("counts.json");
    let output = Command::new(env!("CARGO_BIN_EXE_indexer"))
        .env("RUST_LOG", "error")
        .arg("--text")
        .arg(dir.path().join("missing"))
        .arg("--counts")
        .arg(&counts)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.matches("building index failed").count(), 1);
    assert!(!stderr.contains("building index failed"));

    let written: Value = serde_json::from_str(&fs::read_to_string(&counts).unwrap()).unwrap();
    assert!(written.as_object().unwrap().is_empty());
}
