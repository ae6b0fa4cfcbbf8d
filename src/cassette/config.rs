//! Loading cassettes from disk.

use std::path::Path;

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Load a cassette file and create a replayer.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
    let cassette: Cassette = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
    Ok(CassetteReplayer::new(&cassette))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_hand_written_cassette() {
        let dir = std::env::temp_dir().join("bulk_imagen_cassette_load_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.cassette.yaml");
        std::fs::write(
            &path,
            r#"
name: hand-written
recorded_at: "2026-01-01T00:00:00Z"
commit: test
interactions:
  - seq: 0
    port: image_generator
    method: generate
    input:
      prompt: a fox
    output:
      Err: "API error (500): boom"
"#,
        )
        .unwrap();

        let mut replayer = load_cassette(&path).unwrap();
        let i = replayer
            .next_interaction("image_generator", "generate", &json!({"prompt": "a fox"}))
            .unwrap();
        assert_eq!(i.output["Err"], "API error (500): boom");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_fails() {
        let err = load_cassette(Path::new("/nonexistent/cassette.yaml")).unwrap_err();
        assert!(err.contains("Failed to read cassette file"));
    }

    #[test]
    fn load_garbage_fails() {
        let dir = std::env::temp_dir().join("bulk_imagen_cassette_garbage_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.cassette.yaml");
        std::fs::write(&path, "interactions: [[[").unwrap();

        let err = load_cassette(&path).unwrap_err();
        assert!(err.contains("Failed to parse cassette file"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
