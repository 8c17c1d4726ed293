//! Decoding of the ISO 2709 binary interchange format.
//!
//! A record is a 24 byte leader, a directory of 12 byte entries and the field
//! data the entries point into. Field content is decoded as UTF-8 with
//! invalid sequences replaced.

use super::{Field, Record, Subfield};
use crate::{Error, ErrorKind};

pub(crate) const RECORD_TERMINATOR: u8 = 0x1D;
pub(crate) const FIELD_TERMINATOR: u8 = 0x1E;
pub(crate) const SUBFIELD_DELIMITER: u8 = 0x1F;

const LEADER_LEN: usize = 24;
const DIRECTORY_ENTRY_LEN: usize = 12;

/// Decodes the first record of the stream, ignoring any trailing bytes.
pub(crate) fn read_record(bytes: &[u8]) -> Result<Record, Error> {
    if bytes.len() < LEADER_LEN {
        return Err(Error::new(
            ErrorKind::Deserialize,
            format!("Record is shorter than a leader ({} bytes)", bytes.len()),
        ));
    }

    let record_len = ascii_number(&bytes[..5], "Record length")?;
    if record_len < LEADER_LEN || record_len > bytes.len() {
        return Err(Error::new(
            ErrorKind::Deserialize,
            format!(
                "Record length {record_len} does not fit the {} bytes received",
                bytes.len()
            ),
        ));
    }
    let record = &bytes[..record_len];

    let base = ascii_number(&record[12..17], "Base address")?;
    if base < LEADER_LEN || base > record_len {
        return Err(Error::new(
            ErrorKind::Deserialize,
            format!("Base address {base} is outside the record"),
        ));
    }

    let directory = &record[LEADER_LEN..base];
    let directory = directory.strip_suffix(&[FIELD_TERMINATOR]).unwrap_or(directory);
    if directory.len() % DIRECTORY_ENTRY_LEN != 0 {
        return Err(Error::new(
            ErrorKind::Deserialize,
            format!("Directory of {} bytes is not whole entries", directory.len()),
        ));
    }

    let data = &record[base..];
    let mut fields = Vec::with_capacity(directory.len() / DIRECTORY_ENTRY_LEN);
    for entry in directory.chunks_exact(DIRECTORY_ENTRY_LEN) {
        let tag = decode(&entry[..3]);
        let len = ascii_number(&entry[3..7], "Field length")?;
        let offset = ascii_number(&entry[7..], "Field offset")?;
        let end = offset + len;
        if end > data.len() {
            return Err(Error::new(
                ErrorKind::Deserialize,
                format!("Field {tag} extends past the end of the record"),
            ));
        }

        let content = &data[offset..end];
        let content = content.strip_suffix(&[FIELD_TERMINATOR]).unwrap_or(content);
        if is_control_tag(&tag) {
            fields.push(Field::Control {
                tag,
                data: decode(content),
            });
        } else {
            fields.push(data_field(tag, content));
        }
    }

    Ok(Record::new(decode(&record[..LEADER_LEN]), fields))
}

fn data_field(tag: String, content: &[u8]) -> Field {
    let text = decode(content);
    let mut parts = text.split(char::from(SUBFIELD_DELIMITER));

    let mut indicators = parts.next().unwrap_or_default().chars();
    let ind1 = indicators.next().unwrap_or(' ');
    let ind2 = indicators.next().unwrap_or(' ');

    let subfields = parts
        .filter_map(|part| {
            let mut chars = part.chars();
            chars.next().map(|code| Subfield {
                code,
                value: chars.as_str().to_owned(),
            })
        })
        .collect();

    Field::Data {
        tag,
        ind1,
        ind2,
        subfields,
    }
}

// Tags 000 through 009 hold bare data without indicators or subfields.
fn is_control_tag(tag: &str) -> bool {
    matches!(tag.as_bytes(), [b'0', b'0', digit] if digit.is_ascii_digit())
}

fn ascii_number(bytes: &[u8], what: &str) -> Result<usize, Error> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::Deserialize,
                format!("{what} is not a number: {}", String::from_utf8_lossy(bytes)),
            )
        })
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marc::test_support::encode;

    fn sample_fields() -> Vec<Field> {
        vec![
            Field::Control {
                tag: "001".to_owned(),
                data: "13618155".to_owned(),
            },
            Field::Control {
                tag: "008".to_owned(),
                data: "190110s2019    nyua     b    001 0 eng  ".to_owned(),
            },
            Field::Data {
                tag: "245".to_owned(),
                ind1: '1',
                ind2: '0',
                subfields: vec![
                    Subfield {
                        code: 'a',
                        value: "Miniature books :".to_owned(),
                    },
                    Subfield {
                        code: 'c',
                        value: "edited by Anne C. Bromer.".to_owned(),
                    },
                ],
            },
        ]
    }

    #[test]
    fn reads_control_and_data_fields() {
        let fields = sample_fields();
        let record = read_record(&encode(&fields)).unwrap();

        assert_eq!(fields, record.fields());
        assert_eq!(24, record.leader().len());
        assert!(record.leader().ends_with("4500"));
    }

    fn title(value: &str) -> Vec<Field> {
        vec![Field::Data {
            tag: "245".to_owned(),
            ind1: '0',
            ind2: '0',
            subfields: vec![Subfield {
                code: 'a',
                value: value.to_owned(),
            }],
        }]
    }

    #[test]
    fn reads_multibyte_subfield_values() {
        let fields = title("Kitāb al-ʻilal /");
        let record = read_record(&encode(&fields)).unwrap();
        assert_eq!(fields, record.fields());
    }

    #[test]
    fn invalid_utf8_decodes_to_replacement_characters() {
        let mut bytes = encode(&title("XY"));
        // A stray MARC-8 byte that is not valid UTF-8.
        let x = bytes.iter().position(|&b| b == b'X').unwrap();
        bytes[x] = 0xA9;

        let record = read_record(&bytes).unwrap();
        assert_eq!(title("\u{FFFD}Y"), record.fields());
    }

    #[test]
    fn reads_first_record_and_ignores_trailing_bytes() {
        let fields = sample_fields();
        let mut bytes = encode(&fields);
        bytes.extend_from_slice(b"anything at all");

        let record = read_record(&bytes).unwrap();
        assert_eq!(fields, record.fields());
    }

    #[test]
    fn empty_subfield_values_survive() {
        let fields = vec![Field::Data {
            tag: "970".to_owned(),
            ind1: ' ',
            ind2: ' ',
            subfields: vec![
                Subfield {
                    code: 'a',
                    value: String::new(),
                },
                Subfield {
                    code: 'b',
                    value: "Contents".to_owned(),
                },
            ],
        }];

        let record = read_record(&encode(&fields)).unwrap();
        assert_eq!(fields, record.fields());
    }

    #[test]
    fn html_body_is_a_deserialize_error() {
        let err = read_record(b"<html><body>Too many requests</body></html>").unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
    }

    #[test]
    fn short_input_is_a_deserialize_error() {
        let err = read_record(b"00038").unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
        assert!(err.to_string().contains("shorter than a leader"));
    }

    #[test]
    fn truncated_record_is_rejected() {
        let bytes = encode(&sample_fields());
        let err = read_record(&bytes[..bytes.len() / 2]).unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
    }

    #[test]
    fn partial_directory_entry_is_rejected() {
        // Base address of 30 leaves six directory bytes, half an entry.
        let mut bytes = format!("{:05}nam a22{:05}   4500", 40, 30).into_bytes();
        bytes.extend_from_slice(b"245001");
        bytes.extend_from_slice(&[FIELD_TERMINATOR; 9]);
        bytes.push(RECORD_TERMINATOR);

        let err = read_record(&bytes).unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
        assert!(err.to_string().contains("whole entries"));
    }

    #[test]
    fn field_past_record_end_is_rejected() {
        let mut bytes = encode(&sample_fields());
        // First directory entry starts at 24, its length digits at 27.
        bytes[27..31].copy_from_slice(b"9999");

        let err = read_record(&bytes).unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
        assert!(err.to_string().contains("past the end"));
    }

    #[test]
    fn control_tags_are_three_digits_under_ten() {
        assert!(is_control_tag("001"));
        assert!(is_control_tag("008"));
        assert!(!is_control_tag("010"));
        assert!(!is_control_tag("245"));
        assert!(!is_control_tag("00a"));
    }
}
