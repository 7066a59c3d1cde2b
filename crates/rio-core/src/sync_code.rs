//! Telex sync code and backup file codec.
//!
//! A telex code is the base64 (standard alphabet) of the UTF-8 JSON snapshot. It is
//! opaque but not secret: no compression, no encryption, no checksum, no version field.
//! Importing one replaces local state wholesale (last write wins).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{RioError, RioResult};
use crate::progress::try_normalize_level;
use crate::shared::UserState;

/// Encodes a snapshot as a copy-pasteable telex code.
pub fn encode(state: &UserState) -> RioResult<String> {
    let json = serde_json::to_string(state)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decodes a telex code. Rejects anything that is not base64 of a JSON object with a
/// non-empty `username` and a truthy `level`.
pub fn decode(code: &str) -> RioResult<UserState> {
    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RioError::Decode(format!("telex is not valid base64: {}", e)))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| RioError::Decode(format!("telex does not carry JSON: {}", e)))?;

    let has_username = value
        .get("username")
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if !has_username {
        return Err(RioError::Decode("telex has no username".to_string()));
    }
    if !is_truthy(value.get("level")) {
        return Err(RioError::Decode("telex has no level".to_string()));
    }
    into_state(value)
}

/// Pretty-printed JSON for the downloadable backup file.
pub fn export_backup(state: &UserState) -> RioResult<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Suggested file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("backup_cacd_{}.json", date.format("%Y-%m-%d"))
}

/// Parses a backup file. Requires a truthy `level` and an `editalProgress` object.
pub fn import_backup(text: &str) -> RioResult<UserState> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| RioError::Decode(format!("backup is not JSON: {}", e)))?;
    if !is_truthy(value.get("level")) {
        return Err(RioError::Decode("backup has no level".to_string()));
    }
    if !value.get("editalProgress").map(Value::is_object).unwrap_or(false) {
        return Err(RioError::Decode("backup has no editalProgress".to_string()));
    }
    into_state(value)
}

fn into_state(value: Value) -> RioResult<UserState> {
    let mut state: UserState = serde_json::from_value(value)
        .map_err(|e| RioError::Decode(format!("snapshot has unexpected shape: {}", e)))?;
    if try_normalize_level(&mut state).is_none() {
        return Err(RioError::Decode(format!(
            "snapshot level {} with {} xp is out of range",
            state.level, state.xp
        )));
    }
    Ok(state)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TopicProgress;
    use chrono::{TimeZone, Utc};

    fn sample() -> UserState {
        let mut state = UserState::new("ana");
        state.level = 3;
        state.xp = 120;
        state.submissions_count = 4;
        state.unlocked_reward_ids.insert("connectors".to_string());
        state.study_cycle = vec!["Economia".to_string(), "Geografia".to_string()];
        state.current_cycle_index = 1;
        state.edital_progress.insert(
            "hb-1".to_string(),
            TopicProgress {
                theory: true,
                questions_count: 12,
                accuracy: 83.5,
                flashcards: false,
                study_minutes: 95,
                last_study_date: Some(Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap()),
            },
        );
        state
    }

    #[test]
    fn test_round_trip() {
        let state = sample();
        let code = encode(&state).unwrap();
        assert!(code.is_ascii());
        assert_eq!(decode(&code).unwrap(), state);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(decode("not-valid-base64!!!"), Err(RioError::Decode(_))));
    }

    #[test]
    fn test_rejects_base64_of_non_json() {
        let code = STANDARD.encode("hello");
        assert!(matches!(decode(&code), Err(RioError::Decode(_))));
    }

    #[test]
    fn test_rejects_missing_username_or_level() {
        let no_user = STANDARD.encode(r#"{"username":"","level":2}"#);
        assert!(matches!(decode(&no_user), Err(RioError::Decode(_))));

        let no_level = STANDARD.encode(r#"{"username":"ana"}"#);
        assert!(matches!(decode(&no_level), Err(RioError::Decode(_))));

        let zero_level = STANDARD.encode(r#"{"username":"ana","level":0}"#);
        assert!(matches!(decode(&zero_level), Err(RioError::Decode(_))));
    }

    #[test]
    fn test_accepts_loose_payload() {
        let code = STANDARD.encode(r#"{"username":"ana","level":2,"futureField":true}"#);
        let state = decode(&code).unwrap();
        assert_eq!(state.level, 2);
        assert!(state.edital_progress.is_empty());
    }

    #[test]
    fn test_decode_folds_excess_xp() {
        let code = STANDARD.encode(r#"{"username":"ana","level":1,"xp":450}"#);
        let state = decode(&code).unwrap();
        assert_eq!((state.level, state.xp), (2, 250));
    }

    #[test]
    fn test_rejects_level_past_the_ceiling() {
        let code = STANDARD.encode(r#"{"username":"ana","level":4294967295,"xp":4294967295}"#);
        assert!(matches!(decode(&code), Err(RioError::Decode(_))));

        let backup = r#"{"level":4294967295,"xp":4294967295,"editalProgress":{}}"#;
        assert!(matches!(import_backup(backup), Err(RioError::Decode(_))));
    }

    #[test]
    fn test_tolerates_line_breaks_in_pasted_code() {
        let code = encode(&sample()).unwrap();
        let wrapped = format!("{}\n{}", &code[..10], &code[10..]);
        assert_eq!(decode(&wrapped).unwrap(), sample());
    }

    #[test]
    fn test_backup_round_trip_and_validation() {
        let text = export_backup(&sample()).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(import_backup(&text).unwrap(), sample());

        assert!(import_backup(r#"{"level":2}"#).is_err());
        assert!(import_backup(r#"{"editalProgress":{}}"#).is_err());
        assert!(import_backup("[]").is_err());
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(backup_file_name(date), "backup_cacd_2026-10-19.json");
    }
}
