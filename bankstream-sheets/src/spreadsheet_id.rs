use anyhow::{Result, bail};
use regex::Regex;

/// Accept either a bare spreadsheet ID or a full Google Sheets URL and
/// return the ID (the part between `/d/` and the next `/`).
pub fn parse_spreadsheet_id(input: &str) -> Result<String> {
    let input = input.trim();

    let url_re = Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)")?;
    if let Some(caps) = url_re.captures(input) {
        return Ok(caps[1].to_string());
    }

    let bare_re = Regex::new(r"^[A-Za-z0-9_-]{20,}$")?;
    if bare_re.is_match(input) {
        return Ok(input.to_string());
    }

    bail!("'{input}' is neither a spreadsheet ID nor a Google Sheets URL")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1UcjF-L0GWBetcJqA1t1UMyrt54ATUAR-22ozQEnVjQM";

    #[test]
    fn test_bare_id() {
        assert_eq!(parse_spreadsheet_id(ID).unwrap(), ID);
        assert_eq!(parse_spreadsheet_id(&format!("  {ID}\n")).unwrap(), ID);
    }

    #[test]
    fn test_full_url() {
        let url = format!("https://docs.google.com/spreadsheets/d/{ID}/edit#gid=0");
        assert_eq!(parse_spreadsheet_id(&url).unwrap(), ID);
        let url = format!("https://docs.google.com/spreadsheets/d/{ID}");
        assert_eq!(parse_spreadsheet_id(&url).unwrap(), ID);
    }

    #[test]
    fn test_rejects_other_input() {
        assert!(parse_spreadsheet_id("").is_err());
        assert!(parse_spreadsheet_id("short").is_err());
        assert!(parse_spreadsheet_id("https://example.com/d/abc").is_err());
    }
}
