//! XML plumbing for the batch-delete call: escaping object keys into the
//! request body and parsing the `DeleteResult` response.
//!
//! The parser is deliberately strict. A response it cannot make sense of is
//! an error, never an empty confirmation list, so a malformed reply can not
//! be mistaken for "nothing was deleted" or "everything was deleted".

use sealdrop_core::AppError;

/// Escape a string for embedding in XML text or attribute content.
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_xml(value: &str) -> Result<String, AppError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let end = rest.find(';').ok_or_else(|| {
            AppError::ReconciliationParse("unterminated entity in response".to_string())
        })?;
        let entity = &rest[..=end];
        match entity {
            "&amp;" => out.push('&'),
            "&apos;" => out.push('\''),
            "&quot;" => out.push('"'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&#13;" => out.push('\r'),
            "&#10;" => out.push('\n'),
            other => {
                return Err(AppError::ReconciliationParse(format!(
                    "unknown entity in response: {}",
                    other,
                )))
            }
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Extract the keys the store confirmed deleted from a `DeleteResult`
/// document. `Error` entries are skipped (their keys stay pending); a
/// `Deleted` entry without a `Key` is a parse failure.
pub fn parse_deleted_keys(body: &str) -> Result<Vec<String>, AppError> {
    if !body.contains("<DeleteResult") {
        return Err(AppError::ReconciliationParse(
            "response is not a DeleteResult document".to_string(),
        ));
    }

    let mut keys = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("<Deleted>") {
        rest = &rest[start + "<Deleted>".len()..];
        let end = rest.find("</Deleted>").ok_or_else(|| {
            AppError::ReconciliationParse("unterminated Deleted element".to_string())
        })?;
        let element = &rest[..end];
        rest = &rest[end + "</Deleted>".len()..];

        let key_start = element.find("<Key>").ok_or_else(|| {
            AppError::ReconciliationParse("Deleted element without a Key".to_string())
        })?;
        let key_body = &element[key_start + "<Key>".len()..];
        let key_end = key_body.find("</Key>").ok_or_else(|| {
            AppError::ReconciliationParse("unterminated Key element".to_string())
        })?;

        keys.push(unescape_xml(&key_body[..key_end])?);
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_covers_markup_and_line_breaks() {
        assert_eq!(
            escape_xml("a&b<c>'d\"\r\n"),
            "a&amp;b&lt;c&gt;&apos;d&quot;&#13;&#10;",
        );
        assert_eq!(escape_xml("plain-key"), "plain-key");
    }

    #[test]
    fn test_parse_confirmed_keys() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
            <DeleteResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
                <Deleted><Key>first</Key></Deleted>
                <Deleted><Key>second</Key></Deleted>
            </DeleteResult>"#;

        assert_eq!(parse_deleted_keys(body).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_error_entries_are_not_confirmations() {
        let body = r#"<DeleteResult>
            <Deleted><Key>gone</Key></Deleted>
            <Error><Key>stuck</Key><Code>InternalError</Code></Error>
        </DeleteResult>"#;

        assert_eq!(parse_deleted_keys(body).unwrap(), vec!["gone"]);
    }

    #[test]
    fn test_empty_result_is_no_confirmations() {
        assert!(parse_deleted_keys("<DeleteResult></DeleteResult>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_escaped_key_round_trips() {
        let body = "<DeleteResult><Deleted><Key>a&amp;b&lt;c</Key></Deleted></DeleteResult>";
        assert_eq!(parse_deleted_keys(body).unwrap(), vec!["a&b<c"]);
    }

    #[test]
    fn test_non_delete_result_document_is_an_error() {
        let err = parse_deleted_keys("<Error><Code>AccessDenied</Code></Error>").unwrap_err();
        assert!(matches!(err, AppError::ReconciliationParse(_)));
    }

    #[test]
    fn test_deleted_without_key_is_an_error() {
        let body = "<DeleteResult><Deleted></Deleted></DeleteResult>";
        assert!(matches!(
            parse_deleted_keys(body).unwrap_err(),
            AppError::ReconciliationParse(_),
        ));
    }

    #[test]
    fn test_truncated_document_is_an_error() {
        let body = "<DeleteResult><Deleted><Key>first</Key>";
        assert!(matches!(
            parse_deleted_keys(body).unwrap_err(),
            AppError::ReconciliationParse(_),
        ));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let body = "<DeleteResult><Deleted><Key>a&#x41;b</Key></Deleted></DeleteResult>";
        assert!(matches!(
            parse_deleted_keys(body).unwrap_err(),
            AppError::ReconciliationParse(_),
        ));
    }
}
