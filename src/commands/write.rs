//! Write commands:
//! - `settings-watch set KEY=VALUE...` - Store settings
//! - `settings-watch reset KEY...` - Drop stored values

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use settings_watch::config::Config;

/// Store every `KEY=VALUE` assignment in a single write.
pub async fn set(config: &Config, assignments: &[String]) -> Result<()> {
    let items = parse_assignments(assignments)?;
    let store = config.open_store()?;

    store
        .write_settings(&items)
        .await
        .context("Failed to write settings")?;

    info!(count = items.len(), "Settings written");
    Ok(())
}

/// Remove the stored values for `keys`.
pub async fn reset(config: &Config, keys: Vec<String>) -> Result<()> {
    let store = config.open_store()?;
    let count = keys.len();

    store
        .reset_settings(keys)
        .await
        .context("Failed to reset settings")?;

    info!(count, "Settings reset to defaults");
    Ok(())
}

/// Parse `KEY=VALUE` pairs. VALUE is read as JSON when it parses, and as a
/// plain string otherwise, so `theme=dark` and `count=3` both work.
pub fn parse_assignments(assignments: &[String]) -> Result<Map<String, Value>> {
    let mut items = Map::new();
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{assignment}'"))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Empty key in '{assignment}'");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        items.insert(key.to_string(), value);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_json_and_plain_values() {
        let items =
            parse_assignments(&args(&["count=3", "theme=dark", "on=false", "tags=[\"a\"]"]))
                .unwrap();

        assert_eq!(items["count"], json!(3));
        assert_eq!(items["theme"], json!("dark"));
        assert_eq!(items["on"], json!(false));
        assert_eq!(items["tags"], json!(["a"]));
    }

    #[test]
    fn test_parse_value_containing_equals() {
        let items = parse_assignments(&args(&["query=a=b"])).unwrap();
        assert_eq!(items["query"], json!("a=b"));
    }

    #[test]
    fn test_parse_empty_value_is_empty_string() {
        let items = parse_assignments(&args(&["name="])).unwrap();
        assert_eq!(items["name"], json!(""));
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        let err = parse_assignments(&args(&["theme"])).unwrap_err();
        assert!(err.to_string().contains("KEY=VALUE"));
    }

    #[test]
    fn test_parse_rejects_empty_key() {
        assert!(parse_assignments(&args(&["=3"])).is_err());
    }

    #[test]
    fn test_last_assignment_wins() {
        let items = parse_assignments(&args(&["a=1", "a=2"])).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items["a"], json!(2));
    }
}
