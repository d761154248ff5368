//! Catalog file codec.
//!
//! The catalog is UTF-8 text: a fixed header line followed by one record
//! per item with ten semicolon-separated fields:
//!
//! ```text
//! Typ;Titel;AutorRegisseurHersteller;Zusatz;Id;IstVerliehen;IstReserviert;ReserviertVon;VerliehenAn;VerliehenAm
//! ```
//!
//! Fields containing a semicolon, a double quote or a line break are wrapped
//! in double quotes with embedded quotes doubled. The last three fields are
//! optional so that older files without them still load.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat, TimeZone};
use entities::{Media, MediaDetails, MediaKind};
use thiserror::Error;

/// Header line of the catalog file.
pub const CATALOG_HEADER: &str =
    "Typ;Titel;AutorRegisseurHersteller;Zusatz;Id;IstVerliehen;IstReserviert;ReserviertVon;VerliehenAn;VerliehenAm";

const DELIMITER: char = ';';
const QUOTE: char = '"';

/// Records with fewer fields are skipped.
const MIN_FIELDS: usize = 7;

/// Reasons a catalog record is skipped while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    /// The record is truncated.
    #[error("expected at least 7 fields, found {0}")]
    TooFewFields(usize),

    /// The type tag is not one of the known kinds.
    #[error("unknown media type '{0}'")]
    UnknownType(String),

    /// A DVD whose duration is not an integer.
    #[error("invalid DVD duration '{0}'")]
    InvalidDuration(String),
}

/// Quotes a field if it contains the delimiter, a quote or a line break,
/// or if it has surrounding whitespace.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) || value.trim() != value {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Trims a field, then strips one layer of surrounding quotes and
/// un-doubles embedded quotes. Whitespace inside the quotes is kept.
pub fn unescape_field(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with(QUOTE) && value.ends_with(QUOTE) {
        value[1..value.len() - 1].replace("\"\"", "\"")
    } else {
        value.to_string()
    }
}

/// Splits a record at delimiters outside quoted fields.
///
/// A field is quoted only if it starts with a quote; a quote anywhere else
/// is literal text. The returned fields are still escaped.
pub fn split_record(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut scanner = QuoteScanner::new();
    let mut start = 0;

    for (index, ch) in line.char_indices() {
        if ch == DELIMITER && !scanner.in_quotes() {
            fields.push(&line[start..index]);
            start = index + ch.len_utf8();
        }
        scanner.feed(ch);
    }
    fields.push(&line[start..]);

    fields
}

/// Tracks whether a record is inside a quoted field.
///
/// Doubled quotes inside a quoted field close and immediately reopen it,
/// which leaves the state unchanged once the pair is consumed.
#[derive(Debug)]
struct QuoteScanner {
    in_quotes: bool,
    /// Set right after a closing quote, so a following quote reopens.
    after_close: bool,
    /// Only whitespace seen since the last delimiter.
    field_start: bool,
}

impl QuoteScanner {
    fn new() -> Self {
        Self {
            in_quotes: false,
            after_close: false,
            field_start: true,
        }
    }

    fn in_quotes(&self) -> bool {
        self.in_quotes
    }

    fn feed(&mut self, ch: char) {
        if self.in_quotes {
            if ch == QUOTE {
                self.in_quotes = false;
                self.after_close = true;
            }
            return;
        }

        match ch {
            QUOTE if self.field_start || self.after_close => {
                self.in_quotes = true;
                self.field_start = false;
            }
            DELIMITER => self.field_start = true,
            c if c.is_whitespace() => {}
            _ => self.field_start = false,
        }
        self.after_close = false;
    }
}

/// Returns true if `record` ends inside a quoted field.
fn ends_in_quoted_field(record: &str) -> bool {
    let mut scanner = QuoteScanner::new();
    record.chars().for_each(|ch| scanner.feed(ch));
    scanner.in_quotes()
}

/// Formats a lending time in round-trip form.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parses a lending time. Times without an offset are read as local time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at);
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|at| at.fixed_offset())
}

fn format_flag(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn optional_field(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Encodes a single item as one record (without line terminator).
pub fn encode_medium(media: &Media) -> String {
    let lent_at = media
        .lent_at
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_default();

    [
        escape_field(media.kind().tag()),
        escape_field(&media.title),
        escape_field(&media.creator),
        escape_field(&media.details.extra_field()),
        escape_field(&media.id),
        Cow::Borrowed(format_flag(media.is_lent)),
        Cow::Borrowed(format_flag(media.is_reserved)),
        escape_field(media.reserved_by.as_deref().unwrap_or_default()),
        escape_field(media.lent_to.as_deref().unwrap_or_default()),
        Cow::Owned(lent_at),
    ]
    .join(";")
}

/// Encodes the whole catalog: header plus one line per item, in order.
pub fn encode_catalog<'a>(media: impl IntoIterator<Item = &'a Media>) -> String {
    let mut out = String::from(CATALOG_HEADER);
    out.push('\n');
    for item in media {
        out.push_str(&encode_medium(item));
        out.push('\n');
    }
    out
}

/// Decodes a single record.
pub fn decode_record(record: &str) -> Result<Media, MalformedRecord> {
    let parts = split_record(record);
    if parts.len() < MIN_FIELDS {
        return Err(MalformedRecord::TooFewFields(parts.len()));
    }

    let field = |index: usize| parts.get(index).map(|raw| unescape_field(raw));

    let tag = unescape_field(parts[0]);
    let kind = MediaKind::from_tag(&tag).ok_or(MalformedRecord::UnknownType(tag))?;
    let extra = unescape_field(parts[3]);
    let details = MediaDetails::from_extra_field(kind, &extra)
        .ok_or(MalformedRecord::InvalidDuration(extra))?;

    let mut media = Media::new(
        unescape_field(parts[4]),
        unescape_field(parts[1]),
        unescape_field(parts[2]),
        details,
    );
    media.is_lent = parse_flag(parts[5]);
    media.is_reserved = parse_flag(parts[6]);
    media.reserved_by = field(7).as_deref().and_then(optional_field);
    media.lent_to = field(8).as_deref().and_then(optional_field);
    media.lent_at = field(9).as_deref().and_then(parse_timestamp);

    Ok(media)
}

/// Splits catalog text into logical records.
///
/// A quoted field may span physical lines; such lines are joined back
/// together. A quote in the middle of an unquoted field does not open a
/// quoted section. The header line is not skipped here.
pub fn records(text: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut pending: Option<String> = None;

    for line in text.split('\n') {
        let record = match pending.take() {
            Some(mut open) => {
                open.push('\n');
                open.push_str(line);
                open
            }
            None => line.to_string(),
        };

        if ends_in_quoted_field(&record) {
            pending = Some(record);
        } else {
            records.push(strip_carriage_return(record));
        }
    }

    if let Some(open) = pending {
        records.push(strip_carriage_return(open));
    }

    records
}

fn strip_carriage_return(mut record: String) -> String {
    if record.ends_with('\r') {
        record.pop();
    }
    record
}

/// Decodes a catalog file, skipping the header, blank lines and malformed
/// records. Items are returned in file order.
pub fn decode_catalog(text: &str) -> Vec<Media> {
    let mut media = Vec::new();

    for (line_no, record) in records(text).iter().enumerate().skip(1) {
        if record.trim().is_empty() {
            continue;
        }

        match decode_record(record) {
            Ok(item) => media.push(item),
            // An unterminated quote joined several lines; retry them one by
            // one so only the broken line is lost.
            Err(reason) if record.contains('\n') => {
                tracing::debug!(line = line_no + 1, %reason, "Splitting unterminated catalog record");
                for line in record.split('\n') {
                    decode_line(line.trim_end_matches('\r'), line_no, &mut media);
                }
            }
            Err(reason) => {
                tracing::debug!(line = line_no + 1, %reason, "Skipping catalog record");
            }
        }
    }

    media
}

fn decode_line(line: &str, line_no: usize, media: &mut Vec<Media>) {
    if line.trim().is_empty() {
        return;
    }
    match decode_record(line) {
        Ok(item) => media.push(item),
        Err(reason) => {
            tracing::debug!(line = line_no + 1, %reason, "Skipping catalog record");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn lent_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 10, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a;b"), "\"a;b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_unescape_field() {
        assert_eq!(unescape_field("plain"), "plain");
        assert_eq!(unescape_field("\"a;b\""), "a;b");
        assert_eq!(unescape_field("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unescape_field("\""), "\"");
        assert_eq!(unescape_field(""), "");
        assert_eq!(unescape_field("  plain "), "plain");
        assert_eq!(unescape_field(" \" kept \" "), " kept ");
    }

    #[test]
    fn test_split_record_respects_quotes() {
        let fields = split_record("Buch;\"Krieg; Frieden\";Tolstoi;;B001;False;False");
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[1], "\"Krieg; Frieden\"");
    }

    #[test]
    fn test_encode_medium() {
        let mut dvd = Media::dvd("D001", "Metropolis", "Fritz Lang", 153);
        dvd.lend("alice", lent_at());

        assert_eq!(
            encode_medium(&dvd),
            "DVD;Metropolis;Fritz Lang;153;D001;True;False;;alice;2024-05-01T10:30:15+02:00"
        );
    }

    #[test]
    fn test_decode_legacy_record_without_holders() {
        let media = decode_record("Software;Editor;Acme;Linux;S001;False;True").unwrap();

        assert_eq!(media.kind(), MediaKind::Software);
        assert!(media.is_reserved);
        assert_eq!(media.reserved_by, None);
        assert_eq!(media.lent_to, None);
        assert_eq!(media.lent_at, None);
    }

    #[test]
    fn test_decode_rejects_malformed_records() {
        assert_eq!(
            decode_record("Buch;Titel;Autor;Verlag;B001;False").unwrap_err(),
            MalformedRecord::TooFewFields(6)
        );
        assert_eq!(
            decode_record("Zeitschrift;Titel;;;Z001;False;False").unwrap_err(),
            MalformedRecord::UnknownType("Zeitschrift".to_string())
        );
        assert_eq!(
            decode_record("DVD;Titel;;lang;D001;False;False").unwrap_err(),
            MalformedRecord::InvalidDuration("lang".to_string())
        );
    }

    #[test]
    fn test_decode_flags_are_lenient() {
        let media = decode_record("Buch;T;A;V;B001;true;maybe;;;").unwrap();
        assert!(media.is_lent);
        assert!(!media.is_reserved);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert_eq!(parse_timestamp("2024-05-01T10:30:15+02:00"), Some(lent_at()));
        assert!(parse_timestamp("2024-05-01T10:30:15.1234567+02:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:30:15.1234567").is_some());
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_catalog_round_trip() {
        let mut book = Media::book("B001", "Krieg; Frieden", "Tolstoi", "Insel \"Verlag\"");
        book.reserve("gast");
        let mut dvd = Media::dvd("D001", "Metropolis", "", 153);
        dvd.lend("alice", lent_at());
        let software = Media::software("S001", "Editor\nPro", "Acme", "Linux");
        let original = vec![book, dvd, software];

        let text = encode_catalog(&original);
        assert!(text.starts_with(CATALOG_HEADER));

        let decoded = decode_catalog(&text);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_stray_quote_does_not_hide_following_lines() {
        let text = format!(
            "{CATALOG_HEADER}\n\
             Buch;12\" Vinyl Guide;Miller;Audio Press;B001;False;False;;;\n\
             Buch;Faust;Goethe;Reclam;B002;False;False;;;\n\
             DVD;Metropolis;Fritz Lang;153;D001;False;False;;;\n"
        );

        let decoded = decode_catalog(&text);
        let ids: Vec<&str> = decoded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["B001", "B002", "D001"]);
        assert_eq!(decoded[0].title, "12\" Vinyl Guide");
    }

    #[test]
    fn test_unterminated_quoted_field_loses_only_its_line() {
        let text = format!(
            "{CATALOG_HEADER}\n\
             Buch;\"Open;Goethe;Reclam;B001;False;False;;;\n\
             Buch;Faust;Goethe;Reclam;B002;False;False;;;\n\
             DVD;Metropolis;Fritz Lang;153;D001;False;False;;;\n"
        );

        let decoded = decode_catalog(&text);
        let ids: Vec<&str> = decoded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["B002", "D001"]);
    }

    #[test]
    fn test_decode_trims_padded_fields() {
        let media = decode_record(" Buch ; Faust ;Goethe; Reclam ; B001 ;False;False;;;").unwrap();

        assert_eq!(media.kind(), MediaKind::Book);
        assert_eq!(media.id, "B001");
        assert_eq!(media.title, "Faust");
        assert_eq!(
            media.details,
            MediaDetails::Book {
                publisher: "Reclam".to_string()
            }
        );

        let dvd = decode_record("DVD;Film;Regie; 90 ;D001;False;False").unwrap();
        assert_eq!(dvd.details, MediaDetails::Dvd { duration_minutes: 90 });
    }

    #[test]
    fn test_padded_values_survive_round_trip() {
        let book = Media::book("B001", " Faust ", "Goethe", "Reclam");
        assert_eq!(encode_medium(&book).split(';').nth(1), Some("\" Faust \""));
        assert_eq!(decode_record(&encode_medium(&book)).unwrap(), book);
    }

    #[test]
    fn test_decode_catalog_skips_bad_lines() {
        let text = format!(
            "{CATALOG_HEADER}\r\n\
             Buch;Faust;Goethe;Reclam;B001;False;False;;;\r\n\
             \r\n\
             Kassette;Alt;;;K001;False;False;;;\r\n\
             DVD;Film;Regie;neunzig;D001;False;False;;;\r\n\
             kaputt\r\n\
             Software;Editor;Acme;Linux;S001;False;False\r\n"
        );

        let decoded = decode_catalog(&text);
        let ids: Vec<&str> = decoded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["B001", "S001"]);
    }
}
