use std::path::Path;

use disaster_response::{
    datasets::{Table, Value},
    pipelines::text_classification::{
        build_model, evaluate_model, load_model, save_model, Estimator, Model, ModelError,
        TrainingConfig, TrainingData,
    },
    storage::save_data,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const EXAMPLES: [(&str, [i64; 3]); 6] = [
    ("We need water and food", [1, 1, 0]),
    ("Please send drinking water", [1, 1, 0]),
    ("The bridge collapsed and the road is blocked", [1, 0, 0]),
    ("Roads blocked near the river bridge", [1, 0, 0]),
    ("Nice weather today", [0, 0, 0]),
    ("Enjoying the sunny weather", [0, 0, 0]),
];

/// A merged messages table; the `fire` label is never set
fn table(repeat: usize) -> Table {
    let columns = ["id", "message", "original", "genre", "related", "water", "fire"]
        .iter()
        .map(|name| name.to_string())
        .collect();

    let rows = EXAMPLES
        .iter()
        .cycle()
        .take(EXAMPLES.len() * repeat)
        .enumerate()
        .map(|(id, (message, labels))| {
            let mut row = vec![
                Value::Integer(id as i64),
                Value::from(*message),
                Value::Null,
                Value::from("direct"),
            ];
            row.extend(labels.iter().map(|label| Value::Integer(*label)));
            row
        })
        .collect();

    Table::from_rows(columns, rows).unwrap()
}

fn store(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("DisasterResponse.db");
    save_data(&table(8), &path).unwrap();
    path
}

fn config() -> TrainingConfig {
    TrainingConfig::new().with_seed(Some(5)).with_n_estimators(20)
}

#[test]
fn loads_texts_and_labels_from_the_store() {
    let dir = tempdir().unwrap();

    let data = TrainingData::load(store(dir.path())).unwrap();

    assert_eq!(data.len(), 48);
    assert_eq!(data.label_names, vec!["related", "water", "fire"]);
    assert_eq!(data.texts[0], "We need water and food");
    assert_eq!(data.labels[2], vec![1.0, 0.0, 0.0]);
}

#[test]
fn the_default_model_is_untrained() {
    let model = build_model(&TrainingConfig::default());

    assert!(matches!(model, Estimator::Pipeline(_)));
    assert!(!model.is_fitted());

    let data = TrainingData::from_table(&table(1)).unwrap();
    let result = evaluate_model(&model, &data.texts, &data.labels, &data.label_names);
    assert!(matches!(result, Err(ModelError::NotFitted)));
}

#[test]
fn trains_and_evaluates_with_an_all_zero_label() {
    let dir = tempdir().unwrap();
    let data = TrainingData::load(store(dir.path())).unwrap();
    let config = config();

    let (train, test) = data.train_test_split(config.test_size, config.seed).unwrap();
    assert_eq!(test.len(), 10);

    let mut model = build_model(&config);
    model
        .fit(&train.texts, &train.labels, &train.label_names)
        .unwrap();

    let report = evaluate_model(&model, &test.texts, &test.labels, &test.label_names).unwrap();

    let fire = &report.labels[2];
    assert_eq!(fire.name, "fire");
    assert_eq!(fire.scores.precision, 0.0);
    assert_eq!(fire.scores.support, 0);
    assert_eq!(fire.accuracy, 1.0);
}

#[test]
fn a_saved_model_predicts_identically_after_reload() {
    let dir = tempdir().unwrap();
    let data = TrainingData::from_table(&table(8)).unwrap();

    let mut model = build_model(&config());
    model
        .fit(&data.texts, &data.labels, &data.label_names)
        .unwrap();
    let pipeline = model.into_pipeline().unwrap();

    let path = dir.path().join("classifier.bin");
    save_model(&pipeline, &path).unwrap();
    let reloaded = load_model(&path).unwrap();

    let texts: Vec<String> = EXAMPLES
        .iter()
        .map(|(message, _)| message.to_string())
        .chain(["water water", "", "completely unseen words"].map(String::from))
        .collect();

    assert_eq!(reloaded.predict(&texts).unwrap(), pipeline.predict(&texts).unwrap());
    assert_eq!(reloaded.label_names(), data.label_names.as_slice());
    assert_eq!(
        pipeline.predict(&texts[..EXAMPLES.len()]).unwrap(),
        EXAMPLES
            .iter()
            .map(|(_, labels)| labels.iter().map(|label| *label as u8).collect())
            .collect::<Vec<Vec<u8>>>()
    );
}

#[test]
fn searching_picks_a_grid_point_and_refits_it() {
    let data = TrainingData::from_table(&table(5)).unwrap();
    let mut config = config().with_search_enabled(true).with_cv_folds(3);
    config.grid.n_estimators = vec![5, 10];
    config.grid.min_samples_split = vec![2, 5];

    let mut model = build_model(&config);
    model
        .fit(&data.texts, &data.labels, &data.label_names)
        .unwrap();

    let best = match &model {
        Estimator::Search(search) => search.best().cloned().unwrap(),
        Estimator::Pipeline(_) => panic!("expected a grid search"),
    };
    assert!([5, 10].contains(&best.0.n_estimators));
    assert!([2, 5].contains(&best.0.min_samples_split));

    let pipeline = model.into_pipeline().unwrap();
    assert_eq!(pipeline.params(), &best.0);
}
