use std::fs;
use std::path::Path;

use audiogender::config::Config;
use audiogender::dataset::{LABEL_COLUMN, SplitMode, read_dataset, read_table};
use audiogender::ml::gbdt_stump::GbdtStumpModel;
use audiogender::pipeline::{
    FEATURES_FILE, FINAL_FILE, MODEL_FILE, ModelResults, RESULTS_FILE, Stage, engineer_data,
    prepare_data, run, run_modelling,
};
use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::tempdir;

const SPEAKERS: usize = 6;
const SOURCE_RATE: u32 = 16_000;

fn write_recording(path: &Path, fundamental: f32, digit: usize) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SOURCE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let len = 9_000 + digit * 300;
    for i in 0..len {
        let t = i as f32 / SOURCE_RATE as f32;
        let envelope = (std::f32::consts::PI * i as f32 / len as f32).sin();
        let voice = (2.0 * std::f32::consts::PI * fundamental * t).sin()
            + 0.5 * (2.0 * std::f32::consts::PI * 2.0 * fundamental * t).sin()
            + 0.2 * (2.0 * std::f32::consts::PI * (600.0 + 90.0 * digit as f32) * t).sin();
        writer
            .write_sample((voice * envelope * 3_000.0).round() as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// Six speakers (odd ids male) with ten digits each under `<root>/audio`.
fn write_corpus(root: &Path) {
    let audio = root.join("audio");
    let mut meta = serde_json::Map::new();
    for speaker in 1..=SPEAKERS {
        let id = format!("{speaker:02}");
        let male = speaker % 2 == 1;
        let folder = audio.join(&id);
        fs::create_dir_all(&folder).unwrap();
        for digit in 0..10 {
            let fundamental = if male { 110.0 } else { 220.0 } + 7.0 * speaker as f32;
            write_recording(&folder.join(format!("{digit}_{id}_0.wav")), fundamental, digit);
        }
        meta.insert(
            id,
            serde_json::json!({
                "gender": if male { "male" } else { "female" },
                "age": "30",
                "native speaker": "no",
            }),
        );
    }
    fs::write(
        audio.join("audioMNIST_meta.txt"),
        serde_json::to_vec_pretty(&meta).unwrap(),
    )
    .unwrap();
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.project_dir = root.to_path_buf();
    config.split.mode = SplitMode::Stratified;
    config.model.n_estimators = 20;
    config.model.learning_rate = 0.3;
    config
}

#[test]
fn stages_produce_dataset_table_and_model() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let config = config_for(dir.path());

    let assembly = prepare_data(&config).unwrap();
    assert_eq!(assembly.dataset.len(), SPEAKERS * 10);
    assert_eq!(assembly.dataset.gender_counts(), (30, 30));
    assert!(assembly.skipped.is_empty());
    let features_path = dir.path().join("data").join(FEATURES_FILE);
    assert_eq!(read_dataset(&features_path).unwrap(), assembly.dataset);
    for row in assembly.dataset.rows() {
        assert!(row.features.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    let table = engineer_data(&config).unwrap();
    assert_eq!(table.len(), SPEAKERS * 10);
    assert_eq!(table.columns().last().map(String::as_str), Some(LABEL_COLUMN));
    assert!(!table.columns().iter().any(|c| c == "digit" || c == "gender"));
    assert_eq!(read_table(&dir.path().join("data").join(FINAL_FILE)).unwrap(), table);

    let results = run_modelling(&config).unwrap();
    assert_eq!(results.test_rows, 6);
    assert_eq!(results.val_rows, 6);
    assert_eq!(results.train_rows, 48);
    assert_eq!(results.training_log.rounds.len(), 20);
    assert!(results.training_log.rounds.iter().all(|r| r.val_accuracy.is_some()));
    assert_eq!(results.test.confusion.total(), 6);

    let results_dir = dir.path().join("results");
    let model = GbdtStumpModel::load_json(&results_dir.join(MODEL_FILE)).unwrap();
    assert_eq!(model.classes, vec!["female", "male"]);
    assert_eq!(model.feature_names.len(), table.columns().len() - 1);
    let saved: ModelResults =
        serde_json::from_slice(&fs::read(results_dir.join(RESULTS_FILE)).unwrap()).unwrap();
    assert_eq!(saved, results);
}

#[test]
fn full_runs_are_reproducible() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for dir in [&first, &second] {
        write_corpus(dir.path());
        run(&config_for(dir.path()), Stage::All).unwrap();
    }
    for file in [
        Path::new("data").join(FEATURES_FILE),
        Path::new("data").join(FINAL_FILE),
        Path::new("results").join(MODEL_FILE),
    ] {
        assert_eq!(
            fs::read(first.path().join(&file)).unwrap(),
            fs::read(second.path().join(&file)).unwrap(),
            "{}",
            file.display()
        );
    }
}

#[test]
fn missing_metadata_aborts_prepare() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    fs::remove_file(dir.path().join("audio").join("audioMNIST_meta.txt")).unwrap();
    assert!(prepare_data(&config_for(dir.path())).is_err());
}

#[test]
fn bad_split_ratios_fail_before_any_stage_writes() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let mut config = config_for(dir.path());
    config.split.test_ratio = 0.6;
    config.split.val_ratio = 0.5;

    assert!(run(&config, Stage::All).is_err());
    assert!(!dir.path().join("data").join(FEATURES_FILE).exists());
    assert!(!dir.path().join("data").join(FINAL_FILE).exists());
}
