//! Artifact inspection utility for MedPredict models.
//!
//! Loads one disease's artifact through the same store the service uses and
//! reports what the service would see: expected columns, estimator family,
//! capabilities and fingerprint, or the load error that would trigger the
//! fallback model.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin inspect_artifact -- <disease> [model_dir]
//! ```

use std::env;
use std::path::PathBuf;

use medpredict::adapters::FileModelStore;
use medpredict::config::DEFAULT_MODEL_DIR;
use medpredict::domain::Disease;
use medpredict::ports::ModelStore;

fn usage() -> String {
    let diseases: Vec<&str> = Disease::ALL.iter().map(Disease::slug).collect();
    format!(
        "Usage: inspect_artifact <disease> [model_dir]\n  disease: one of {}",
        diseases.join(", ")
    )
}

fn parse_args() -> Result<(Disease, PathBuf), String> {
    let mut args = env::args().skip(1);
    let disease = match args.next().as_deref() {
        None | Some("-h" | "--help") => return Err(usage()),
        Some(name) => name.parse::<Disease>().map_err(|e| format!("{e}\n{}", usage()))?,
    };
    let model_dir = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from);
    if args.next().is_some() {
        return Err(usage());
    }
    Ok((disease, model_dir))
}

fn main() -> Result<(), String> {
    let (disease, model_dir) = parse_args()?;
    let store = FileModelStore::new(model_dir);
    let spec = disease.spec();

    println!("disease:   {disease}");
    println!("model dir: {}", store.root().display());
    println!("artifact:  {}", store.location(spec.artifact));

    if disease == Disease::General {
        let model = store
            .load_symptom_model(spec.artifact)
            .map_err(|e| format!("{e}\n(service would report \"Unknown\" with probability 0.0)"))?;
        match model.n_features() {
            Some(n) => println!("symptoms:  {n}"),
            None => println!("symptoms:  any"),
        }
        return Ok(());
    }

    println!("columns:   {}", spec.columns().join(", "));
    println!("positive:  predict_proba[{}]", spec.positive_class_index);

    let loaded = store.load(spec).map_err(|e| {
        format!(
            "{e}\n(service would use the fallback model with probability {})",
            spec.fallback_probability
        )
    })?;
    println!("kind:      {}", loaded.classifier.kind());
    println!("supports:  {}", loaded.classifier.capabilities());
    println!("scaler:    {}", if loaded.scaler.is_some() { "yes" } else { "no" });
    println!("sha256:    {}", loaded.fingerprint);
    Ok(())
}
