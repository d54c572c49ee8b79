#![allow(dead_code)]

use score_batch::{
    config::Config,
    engine::{AudiverisEngine, EngineArtifact},
    runner::Runner,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Fake engine: writes `<stem>.<fmt>` per `-export`, fails on inputs named
/// `*fail*`, and on `*slow*` leaves a partial `.omr` then sleeps past any
/// sane timeout in a grandchild `sleep` that keeps the output pipes open. Every invocation is appended to `invocations.log`.
const STUB: &str = r#"#!/bin/sh
here=$(dirname "$0")
out=""
formats=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    -export) shift; formats="$formats $1" ;;
    -output) shift; out="$1" ;;
    -*) ;;
    *) input="$1" ;;
  esac
  shift
done
echo "$input" >> "$here/invocations.log"
name=$(basename "$input")
stem="${name%.*}"
case "$name" in
  *fail*) printf 'cannot read %s\n' "$name" >&2; exit 3 ;;
  *slow*) printf 'partial' > "$out/$stem.omr"; sleep 10; echo "woke" ;;
esac
for f in $formats; do
  printf 'data-%s' "$f" > "$out/$stem.$f"
done
echo "exported $stem opts=$JAVA_OPTS"
"#;

pub fn write_stub(dir: &Path) -> PathBuf {
    let path = dir.join("stub-engine.sh");
    std::fs::write(&path, STUB).expect("write stub");
    let mut perms = std::fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

pub fn stub_runner(cfg: &Config, stub: &Path) -> Runner<AudiverisEngine> {
    let engine = AudiverisEngine::new(
        cfg,
        EngineArtifact::Launcher {
            path: stub.to_path_buf(),
        },
    );
    Runner::new(cfg, engine)
}

pub fn invocations(stub_dir: &Path) -> Vec<String> {
    std::fs::read_to_string(stub_dir.join("invocations.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn touch(path: &Path) {
    std::fs::write(path, b"%PDF-1.4\n").expect("write input");
}
