//! Minimal MARC 21 bibliographic record support.
//!
//! Covers exactly what the CLIO catalog endpoint requires: decoding a single
//! binary ISO 2709 record and rendering it in the MARC-in-JSON shape. This is
//! not a general MARC library.

mod iso2709;

use serde_json::{json, Map, Value};

use crate::Error;

/// The leader of a record that carries no catalog data.
///
/// Used when CLIO cannot supply a record, so that downstream consumers always
/// see the same `{"leader": .., "fields": [..]}` shape.
pub const DEFAULT_LEADER: &str = "          22        4500";

/// A MARC bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    leader: String,
    fields: Vec<Field>,
}

/// A single field of a [`Record`].
///
/// Control fields (tags 00X) hold bare data, all other fields hold indicators
/// and coded subfields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A control field, such as `001` or `008`.
    Control {
        /// Three character field tag.
        tag: String,
        /// The field content.
        data: String,
    },
    /// A variable data field, such as `245`.
    Data {
        /// Three character field tag.
        tag: String,
        /// First indicator, `' '` when undefined.
        ind1: char,
        /// Second indicator, `' '` when undefined.
        ind2: char,
        /// The coded subfields in record order.
        subfields: Vec<Subfield>,
    },
}

/// A coded value within a data [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    /// Single character subfield code, such as `a`.
    pub code: char,
    /// The subfield content.
    pub value: String,
}

impl Record {
    pub(crate) fn new(leader: String, fields: Vec<Field>) -> Self {
        Self { leader, fields }
    }

    /// Decodes the first record of a binary ISO 2709 stream.
    ///
    /// # Errors
    ///
    /// Returns a `Deserialize` error when the bytes are not a well formed
    /// record, notably when the stream opens with anything other than the
    /// five record length digits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        iso2709::read_record(bytes)
    }

    /// The 24 character record leader.
    #[must_use]
    pub fn leader(&self) -> &str {
        &self.leader
    }

    /// The fields in record order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Renders the record in the MARC-in-JSON shape.
    ///
    /// Control fields appear as `{tag: data}`, data fields as
    /// `{tag: {"ind1": .., "ind2": .., "subfields": [{code: value}, ..]}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let fields: Vec<Value> = self.fields.iter().map(Field::to_json).collect();
        json!({
            "leader": self.leader,
            "fields": fields,
        })
    }
}

impl Default for Record {
    /// An empty record with the placeholder [`DEFAULT_LEADER`].
    fn default() -> Self {
        Self {
            leader: DEFAULT_LEADER.to_owned(),
            fields: Vec::new(),
        }
    }
}

impl Field {
    // The tag is the key, so the maps cannot be built with the json! macro.
    fn to_json(&self) -> Value {
        let mut field = Map::new();
        match self {
            Self::Control { tag, data } => {
                field.insert(tag.clone(), Value::String(data.clone()));
            }
            Self::Data {
                tag,
                ind1,
                ind2,
                subfields,
            } => {
                let subfields = subfields
                    .iter()
                    .map(|sub| {
                        let mut pair = Map::new();
                        pair.insert(sub.code.to_string(), Value::String(sub.value.clone()));
                        Value::Object(pair)
                    })
                    .collect();

                let mut body = Map::new();
                body.insert("ind1".to_owned(), Value::String(ind1.to_string()));
                body.insert("ind2".to_owned(), Value::String(ind2.to_string()));
                body.insert("subfields".to_owned(), Value::Array(subfields));
                field.insert(tag.clone(), Value::Object(body));
            }
        }
        Value::Object(field)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn title_field() -> Field {
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
                    code: 'b',
                    value: "4,000 years of tiny treasures".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn default_record_has_placeholder_leader_and_no_fields() {
        let record = Record::default();
        assert_eq!(DEFAULT_LEADER, record.leader());
        assert!(record.fields().is_empty());
    }

    #[test]
    fn json_shape_of_default_record() {
        let expected = serde_json::json!({
            "leader": DEFAULT_LEADER,
            "fields": [],
        });
        assert_eq!(expected, Record::default().to_json());
    }

    #[test]
    fn json_keys_fields_by_tag() {
        let record = Record::new(
            DEFAULT_LEADER.to_owned(),
            vec![
                Field::Control {
                    tag: "001".to_owned(),
                    data: "13618155".to_owned(),
                },
                title_field(),
            ],
        );

        let expected = serde_json::json!({
            "leader": DEFAULT_LEADER,
            "fields": [
                {"001": "13618155"},
                {"245": {
                    "ind1": "1",
                    "ind2": "0",
                    "subfields": [
                        {"a": "Miniature books :"},
                        {"b": "4,000 years of tiny treasures"},
                    ],
                }},
            ],
        });
        assert_eq!(expected, record.to_json());
    }
}
