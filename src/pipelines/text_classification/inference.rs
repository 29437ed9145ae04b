use std::{fs, path::Path};

use log::info;

use crate::utils::files::write_atomically;

use super::{Model, ModelError, Pipeline};

/// Write a fitted pipeline to `path`, replacing any previous artifact
pub fn save_model(pipeline: &Pipeline, path: impl AsRef<Path>) -> Result<(), ModelError> {
    if !pipeline.is_fitted() {
        return Err(ModelError::NotFitted);
    }

    let bytes = bitcode::encode(pipeline);
    write_atomically(path.as_ref(), &bytes)?;

    info!(
        "Saved model to {} ({} bytes)",
        path.as_ref().display(),
        bytes.len()
    );

    Ok(())
}

/// Read a pipeline written by [`save_model`], rejecting artifacts whose trees or vocabulary
/// would make `predict` fail
pub fn load_model(path: impl AsRef<Path>) -> Result<Pipeline, ModelError> {
    let bytes = fs::read(path)?;

    let pipeline: Pipeline = bitcode::decode(&bytes)?;
    pipeline.validate()?;

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::pipelines::text_classification::forest::ForestParams;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn fitted() -> Pipeline {
        let texts: Vec<String> = strings(&["need water", "road blocked"])
            .into_iter()
            .cycle()
            .take(10)
            .collect();
        let labels: Vec<Vec<f64>> = [vec![1.0], vec![0.0]].into_iter().cycle().take(10).collect();

        let mut pipeline =
            Pipeline::new(ForestParams::new().with_n_estimators(5).with_seed(Some(2)));
        pipeline.fit(&texts, &labels, &strings(&["water"])).unwrap();

        pipeline
    }

    #[test]
    fn a_reloaded_model_is_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.bin");
        let pipeline = fitted();

        save_model(&pipeline, &path).unwrap();
        let reloaded = load_model(&path).unwrap();

        assert_eq!(reloaded, pipeline);
        let texts = strings(&["water", "blocked road", "unknown words"]);
        assert_eq!(reloaded.predict(&texts).unwrap(), pipeline.predict(&texts).unwrap());
    }

    #[test]
    fn saving_overwrites_the_previous_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.bin");
        fs::write(&path, b"stale").unwrap();

        save_model(&fitted(), &path).unwrap();

        assert!(load_model(&path).is_ok());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unfitted_models_are_not_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.bin");

        let result = save_model(&Pipeline::new(ForestParams::default()), &path);

        assert!(matches!(result, Err(ModelError::NotFitted)));
        assert!(!path.exists());
    }

    #[test]
    fn an_empty_file_fails_to_decode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.bin");
        fs::write(&path, b"").unwrap();

        assert!(matches!(load_model(&path), Err(ModelError::Decode(_))));
    }
}
