//! Corpus ingestion: flat exercise rows from CSV, JSON or JSONL files.
//!
//! Column names are normalized (trimmed, lower-cased, spaces to `_`) and the
//! dataset's column names are mapped onto record fields. Blank strings count
//! as absent.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::record::RecordInput;

pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<RecordInput>> {
    let path = path.as_ref();
    let rows = match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => read_csv(path)?,
        Some("jsonl") => read_jsonl(path)?,
        _ => read_json(path)?,
    };
    let records = rows.into_iter().map(|row| record_from_row(&row)).collect::<Result<Vec<_>>>()?;
    tracing::info!(path = %path.display(), num_records = records.len(), "loaded corpus");
    Ok(records)
}

/// Every CSV cell is read as a string; `record_from_row` parses ratings.
fn read_csv(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_jsonl(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        rows.push(expect_object(serde_json::from_str(&line)?)?);
    }
    Ok(rows)
}

fn read_json(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let json: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    match json {
        Value::Array(arr) => arr.into_iter().map(expect_object).collect(),
        obj @ Value::Object(_) => Ok(vec![expect_object(obj)?]),
        _ => Err(EngineError::Corpus("expected an array of objects".into())),
    }
}

fn expect_object(v: Value) -> Result<Map<String, Value>> {
    match v {
        Value::Object(m) => Ok(m),
        other => Err(EngineError::Corpus(format!("expected object, got {other}"))),
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

/// Map one raw row onto a record. Unknown columns are ignored.
pub fn record_from_row(row: &Map<String, Value>) -> Result<RecordInput> {
    let mut rec = RecordInput::default();
    for (key, value) in row {
        match normalize_key(key).as_str() {
            "title" => rec.title = text(value),
            "desc" | "description" => rec.description = text(value),
            "type" | "category" => rec.category = text(value),
            "bodypart" | "body_part" | "target_area" => rec.target_area = text(value),
            "equipment" => rec.equipment = text(value),
            "level" => rec.level = text(value),
            "ratingdesc" | "rating_desc" => rec.rating_desc = text(value),
            "rating" => rec.rating = rating(value)?,
            _ => {}
        }
    }
    Ok(rec)
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn rating(v: &Value) -> Result<Option<f32>> {
    let parsed = match v {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(
            s.trim().parse::<f64>().map_err(|_| EngineError::Corpus(format!("invalid rating '{s}'")))?,
        ),
        other => return Err(EngineError::Corpus(format!("invalid rating {other}"))),
    };
    Ok(parsed.filter(|r| r.is_finite()).map(|r| r as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> { v.as_object().cloned().unwrap() }

    #[test]
    fn maps_dataset_columns() {
        let r = record_from_row(&row(json!({
            "Title": "Push-up", " Desc ": "", "Type": "Strength", "BodyPart": "Chest",
            "Equipment": "Body Only", "Level": "Beginner", "Rating": "8.0", "RatingDesc": "Average",
            "Unnamed: 0": 4
        })))
        .unwrap();
        assert_eq!(r.title.as_deref(), Some("Push-up"));
        assert_eq!(r.description, None);
        assert_eq!(r.category.as_deref(), Some("Strength"));
        assert_eq!(r.target_area.as_deref(), Some("Chest"));
        assert_eq!(r.rating, Some(8.0));
        assert_eq!(r.rating_desc.as_deref(), Some("Average"));
    }

    #[test]
    fn null_and_blank_are_absent() {
        let r = record_from_row(&row(json!({"title": null, "rating": "", "level": "  "}))).unwrap();
        assert_eq!(r, RecordInput::default());
    }

    #[test]
    fn bad_rating_is_an_error() {
        assert!(record_from_row(&row(json!({"rating": "great"}))).is_err());
    }

    #[test]
    fn reads_jsonl_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let jsonl = dir.path().join("c.jsonl");
        std::fs::write(&jsonl, "{\"title\":\"A\",\"rating\":1}\n\n{\"title\":\"B\"}\n").unwrap();
        assert_eq!(load_corpus(&jsonl).unwrap().len(), 2);

        let json_path = dir.path().join("c.json");
        std::fs::write(&json_path, r#"[{"title":"A"},{"title":"B"},{"title":"C"}]"#).unwrap();
        let recs = load_corpus(&json_path).unwrap();
        assert_eq!(recs[2].title.as_deref(), Some("C"));
    }

    #[test]
    fn reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("megaGymDataset.csv");
        std::fs::write(
            &path,
            ",Title,Desc,Type,BodyPart,Equipment,Level,Rating,RatingDesc\n\
             0,Partner plank band row,\"A row, done with a partner\",Strength,Abdominals,Bands,Intermediate,0.0,\n\
             1,Banded crunch isometric hold,,Strength,Abdominals,Bands,Intermediate,,\n",
        )
        .unwrap();
        let recs = load_corpus(&path).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title.as_deref(), Some("Partner plank band row"));
        assert_eq!(recs[0].description.as_deref(), Some("A row, done with a partner"));
        assert_eq!(recs[0].target_area.as_deref(), Some("Abdominals"));
        assert_eq!(recs[0].rating, Some(0.0));
        assert_eq!(recs[1].description, None);
        assert_eq!(recs[1].rating, None);
        assert_eq!(recs[1].rating_desc, None);
    }
}
