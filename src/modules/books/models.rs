use std::fmt;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Genre exposed through the dedicated `/books/genre/business` listing.
pub const BUSINESS_GENRE: &str = "Business";

/// Field holding the storage-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// Storage-assigned book identifier (ObjectId hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn generate() -> Self {
        Self(ObjectId::new().to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` when the id could never have been issued by the database.
    pub fn to_object_id(&self) -> Option<ObjectId> {
        ObjectId::parse_str(&self.0).ok()
    }
}

impl From<ObjectId> for BookId {
    fn from(id: ObjectId) -> Self {
        Self(id.to_hex())
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A book document. Well-known fields are typed; anything else a client
/// supplied is kept in `extra` and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    /// Build a new book from a client payload. A supplied `_id` is dropped.
    pub fn from_request(mut fields: Map<String, Value>) -> Result<Self, BookError> {
        fields.remove(ID_FIELD);
        cast::field_names(&fields)?;
        Self::from_fields(fields)
    }

    /// Build a book from a field map, casting well-known fields.
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self, BookError> {
        cast::known_fields(&mut fields)?;
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    fn into_fields(self) -> Result<Map<String, Value>, BookError> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(BookError::NotAnObject),
        }
    }
}

/// Fields to merge into an existing book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    fields: Map<String, Value>,
}

impl BookPatch {
    /// Build a patch from a client payload. `_id` is immutable and dropped.
    pub fn from_request(mut fields: Map<String, Value>) -> Result<Self, BookError> {
        fields.remove(ID_FIELD);
        cast::field_names(&fields)?;
        cast::known_fields(&mut fields)?;
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Merge the patch into `book`, leaving unspecified fields unchanged.
    pub fn apply(&self, book: &Book) -> Result<Book, BookError> {
        let id = book.id.clone();
        let mut fields = book.clone().into_fields()?;
        fields.extend(self.fields.clone());

        let mut merged = Book::from_fields(fields)?;
        merged.id = id;
        Ok(merged)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error(transparent)]
    Cast(#[from] cast::CastError),

    #[error("malformed book document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("book document is not an object")]
    NotAnObject,
}

/// Body of `201 Created`.
#[derive(Debug, Serialize)]
pub struct CreatedBook {
    pub message: &'static str,
    pub book: Book,
}

/// Body of a successful update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedBook {
    pub message: &'static str,
    pub updated_book: Book,
}

/// Body carrying only a confirmation message.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: &'static str,
}

/// Casting of client-supplied values into the types of well-known fields.
pub mod cast {
    use serde_json::{Map, Number, Value};

    #[derive(Debug, thiserror::Error)]
    #[error("cannot cast `{field}` value {value} to {expected}")]
    pub struct CastError {
        pub field: String,
        pub expected: &'static str,
        pub value: Value,
    }

    impl CastError {
        fn new(field: &str, expected: &'static str, value: &Value) -> Self {
            Self {
                field: field.to_string(),
                expected,
                value: value.clone(),
            }
        }
    }

    /// Keys must name top-level fields. Dotted paths and `$` operators would
    /// be interpreted by the database instead of stored literally.
    pub fn field_names(fields: &Map<String, Value>) -> Result<(), CastError> {
        match fields
            .keys()
            .find(|key| key.is_empty() || key.contains('.') || key.starts_with('$'))
        {
            Some(key) => Err(CastError::new(key, "plain field name", &Value::from(key.as_str()))),
            None => Ok(()),
        }
    }

    /// Cast every well-known field present in `fields` in place.
    pub fn known_fields(fields: &mut Map<String, Value>) -> Result<(), CastError> {
        for (field, value) in fields.iter_mut() {
            let cast = match field.as_str() {
                "title" | "author" | "genre" => Value::from(text(field, value)?),
                "publishedYear" => Value::from(integer(field, value)?),
                "rating" => Value::from(number(field, value)?),
                _ => continue,
            };
            *value = cast;
        }
        Ok(())
    }

    pub fn text(field: &str, value: &Value) -> Result<Option<String>, CastError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            _ => Err(CastError::new(field, "string", value)),
        }
    }

    /// Integral numbers or numeric strings. `2018.0` and `" 2018 "` both give 2018.
    pub fn integer(field: &str, value: &Value) -> Result<Option<i32>, CastError> {
        let err = || CastError::new(field, "integer", value);

        let float = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return i32::try_from(i).map(Some).map_err(|_| err());
                }
                n.as_f64().ok_or_else(err)?
            }
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| err())?,
            _ => return Err(err()),
        };

        if float.is_finite()
            && float.fract() == 0.0
            && float >= f64::from(i32::MIN)
            && float <= f64::from(i32::MAX)
        {
            Ok(Some(float as i32))
        } else {
            Err(err())
        }
    }

    /// Numbers keep their JSON form, so `4` stays an integer and `4.5` a float.
    pub fn number(field: &str, value: &Value) -> Result<Option<Number>, CastError> {
        let err = || CastError::new(field, "number", value);

        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(n.clone())),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Some(Number::from(i)));
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Some)
                    .ok_or_else(err)
            }
            _ => Err(err()),
        }
    }
}
