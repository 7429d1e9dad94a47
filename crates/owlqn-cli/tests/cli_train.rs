use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_owlqn"))
}

fn run(args: &[&Path]) -> Output {
    run_with(args, &[])
}

fn run_with(paths: &[&Path], extra: &[&str]) -> Output {
    Command::new(bin_path())
        .args(paths)
        .args(extra)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?}: {}", bin_path(), e))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn read_weights(path: &Path) -> Vec<f64> {
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("%%MatrixMarket matrix array real general"));
    let size = lines.next().unwrap();
    let weights: Vec<f64> = lines.map(|line| line.trim().parse().unwrap()).collect();
    assert_eq!(size, format!("1 {}", weights.len()));
    weights
}

/// Identity design matrix, so the solution is the soft-thresholded target.
fn least_squares_files(dir: &TempDir) -> (PathBuf, PathBuf) {
    let a = write(
        dir,
        "a.mtx",
        "%%MatrixMarket matrix array real general\n3 3\n1 0 0\n0 1 0\n0 0 1\n",
    );
    let b = write(dir, "b.mtx", "%%MatrixMarket matrix array real general\n3 1\n4\n-0.5\n-3\n");
    (a, b)
}

#[test]
fn least_squares_run_writes_sparse_weights() {
    let dir = TempDir::new().unwrap();
    let (a, b) = least_squares_files(&dir);
    let out = dir.path().join("weights.mtx");

    let output = Command::new(bin_path())
        .arg(&a)
        .arg(&b)
        .arg("1")
        .arg(&out)
        .args(["--least-squares", "--tol", "1e-8"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "owlqn should succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("called with arguments"));
    assert!(stdout.contains("Iter    n:  new_value    (conv_crit)   line_search"));
    assert!(stdout.contains("Finished with optimization.  2/3 non-zero weights."));

    let weights = read_weights(&out);
    assert!((weights[0] - 3.0).abs() < 1e-4, "weights {weights:?}");
    assert_eq!(weights[1], 0.0);
    assert!((weights[2] + 2.0).abs() < 1e-4, "weights {weights:?}");
}

#[test]
fn quiet_logistic_run_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let features = write(
        &dir,
        "x.mtx",
        "%%MatrixMarket matrix coordinate real general\n4 2 5\n1 1 1\n2 1 0.5\n3 1 -1\n4 1 -2\n4 2 1\n",
    );
    let labels = write(&dir, "y.mtx", "%%MatrixMarket matrix array real general\n4 1\n1\n1\n-1\n-1\n");
    let out = dir.path().join("weights.mtx");

    let output = run_with(&[&features, &labels], &["0.5", out.to_str().unwrap(), "-q", "--max-iterations", "3"]);
    assert!(
        output.status.success(),
        "owlqn should succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty(), "stdout={}", String::from_utf8_lossy(&output.stdout));

    let weights = read_weights(&out);
    assert_eq!(weights.len(), 2);
    assert!(weights[0] > 0.0);
}

#[test]
fn negative_regularization_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (a, b) = least_squares_files(&dir);
    let out = dir.path().join("weights.mtx");

    let output = run_with(&[&a, &b], &["-1", out.to_str().unwrap(), "--least-squares"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be non-negative"));
    assert!(!out.exists());
}

#[test]
fn illegal_label_is_reported() {
    let dir = TempDir::new().unwrap();
    let features = write(&dir, "x.mtx", "%%MatrixMarket matrix array real general\n2 1\n1\n-1\n");
    let labels = write(&dir, "y.mtx", "%%MatrixMarket matrix array real general\n2 1\n1\n2\n");
    let out = dir.path().join("weights.mtx");

    let output = run_with(&[&features, &labels], &["1", out.to_str().unwrap(), "-q"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load logistic regression problem"), "stderr={stderr}");
    assert!(stderr.contains("must be 1 or -1"), "stderr={stderr}");
}

#[test]
fn least_squares_requires_dense_matrix() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.mtx", "%%MatrixMarket matrix coordinate real general\n1 1 1\n1 1 2\n");
    let b = write(&dir, "b.mtx", "%%MatrixMarket matrix array real general\n1 1\n1\n");
    let out = dir.path().join("weights.mtx");

    let output = run_with(&[&a, &b], &["1", out.to_str().unwrap(), "--least-squares", "-q"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected array, found coordinate"));
}

#[test]
fn missing_arguments_print_usage() {
    let dir = TempDir::new().unwrap();
    let (a, _) = least_squares_files(&dir);

    let output = run(&[&a]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}
