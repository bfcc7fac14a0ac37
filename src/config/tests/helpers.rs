//! Shared test helpers for configuration tests.

use std::ffi::OsString;

use ortho_config::{MergeComposer, OrthoConfig};
use serde_json::Value;

use crate::TallyConfig;

/// Applies a configuration layer to the composer based on the layer type.
pub fn apply_layer(composer: &mut MergeComposer, layer_type: &str, value: Value) {
    match layer_type {
        "defaults" => composer.push_defaults(value),
        "file" => composer.push_file(value, None),
        "environment" => composer.push_environment(value),
        "cli" => composer.push_cli(value),
        _ => panic!("unknown layer type: {layer_type}"),
    }
}

/// Composes a [`TallyConfig`] from a sequence of `(layer_type, value)` pairs.
pub fn build_config_from_layers(layers: &[(&str, Value)]) -> TallyConfig {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value.clone());
    }

    TallyConfig::merge_from_layers(composer.layers()).expect("merge should succeed")
}

/// Loads configuration from `cli_args` with one environment variable set (or
/// removed) and configuration discovery pointed at an empty home directory.
pub fn load_with_env(name: &str, value: Option<&str>, cli_args: &[&str]) -> TallyConfig {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();

    let _guard = env_lock::lock_env([
        (name, value),
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
    ]);

    let mut args: Vec<OsString> = vec![OsString::from("tally")];
    args.extend(cli_args.iter().map(OsString::from));

    TallyConfig::load_from_iter(args).expect("config should load")
}
