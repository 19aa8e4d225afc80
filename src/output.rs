use std::fs::File;
use std::io::Write;
use std::path::Path;
use log::info;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::model::NumberedRecord;

const CSV_HEADERS: [&str; 28] = [
    "id", "title", "price", "beds", "baths", "sqft", "address", "detail_url", "image_url",
    "status_badge", "detail_price", "monthly_payment", "detail_beds", "detail_baths", "detail_sqft",
    "detail_address", "on_redfin", "views", "favorites", "description", "key_details",
    "agent_name", "agent_broker", "agent_profile_url", "listing_updated", "redfin_checked",
    "mls_source", "mls_id",
];

/// Pretty JSON with two-space indentation; non-ASCII text is written as-is.
pub fn render_json(records: &[NumberedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn write_records(path: &Path, records: &[NumberedRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(path, records)?,
        OutputFormat::Csv => write_csv(path, records)?,
    }
    info!("Saved data to {}", path.display());
    Ok(())
}

fn write_json(path: &Path, records: &[NumberedRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(render_json(records)?.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn write_csv(path: &Path, records: &[NumberedRecord]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_path(path)?;
    csv_writer.write_record(CSV_HEADERS)?;

    for record in records {
        let card = &record.card;
        let detail = &record.detail;
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let key_details = detail
            .key_details
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("; ");

        csv_writer.write_record([
            record.id.to_string(),
            text(&card.title),
            text(&card.price),
            text(&card.beds),
            text(&card.baths),
            text(&card.sqft),
            text(&card.address),
            card.detail_url.clone(),
            text(&card.image_url),
            text(&detail.status_badge),
            text(&detail.price),
            text(&detail.monthly_payment),
            text(&detail.beds),
            text(&detail.baths),
            text(&detail.sqft),
            text(&detail.address),
            text(&detail.on_redfin),
            text(&detail.views),
            text(&detail.favorites),
            text(&detail.description),
            key_details,
            text(&detail.agent_name),
            text(&detail.agent_broker),
            text(&detail.agent_profile_url),
            text(&detail.listing_updated),
            text(&detail.redfin_checked),
            text(&detail.mls_source),
            text(&detail.mls_id),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HomeCard, PropertyDetails};
    use tempfile::tempdir;

    fn record() -> NumberedRecord {
        let mut detail = PropertyDetails {
            price: Some("$610,000".to_string()),
            description: Some("Casa con jardín, \"move-in\" ready".to_string()),
            mls_id: Some("MLS ID: 77".to_string()),
            ..PropertyDetails::default()
        };
        detail.key_details.insert("Year Built".to_string(), "2004".to_string());
        detail.key_details.insert("Lot Size".to_string(), "0.25 acres".to_string());

        NumberedRecord {
            id: 1,
            card: HomeCard {
                title: Some("12 Peña Blvd".to_string()),
                price: Some("$610,000".to_string()),
                beds: Some("3 beds".to_string()),
                baths: None,
                sqft: None,
                address: Some("12 Peña Blvd".to_string()),
                detail_url: "https://www.redfin.com/home/12".to_string(),
                image_url: None,
            },
            detail,
        }
    }

    #[test]
    fn test_json_keeps_unicode_and_indents_two_spaces() {
        let json = render_json(&[record()]).unwrap();
        assert!(json.contains("Peña"));
        assert!(json.starts_with("[\n  {\n    \"id\": 1,"));

        let parsed: Vec<NumberedRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![record()]);
    }

    #[test]
    fn test_write_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redfin_results.json");
        write_records(&path, &[record()], OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["card"]["detail_url"], "https://www.redfin.com/home/12");
        assert_eq!(value[0]["detail"]["key_details"]["Year Built"], "2004");
        assert!(value[0]["card"]["baths"].is_null());
    }

    #[test]
    fn test_write_csv_flattens_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redfin_results.csv");
        write_records(&path, &[record()], OutputFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_HEADERS.len());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        let column = |name: &str| {
            let idx = headers.iter().position(|h| h == name).unwrap();
            rows[0][idx].to_string()
        };
        assert_eq!(column("id"), "1");
        assert_eq!(column("baths"), "");
        assert_eq!(column("description"), "Casa con jardín, \"move-in\" ready");
        assert_eq!(column("key_details"), "Year Built: 2004; Lot Size: 0.25 acres");
        assert_eq!(column("mls_id"), "MLS ID: 77");
    }
}
